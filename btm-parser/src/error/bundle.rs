/*!
 Errors that can happen when resolving an item's executable from its bundle.
*/

use std::path::PathBuf;

use thiserror::Error;

/// Reasons an executable path could not be resolved
#[derive(Debug, Error)]
pub enum PathResolutionError {
    #[error("login item has no container")]
    MissingContainer,
    #[error("no record matches container {0}")]
    NoParent(String),
    #[error("record {0} has no url")]
    MissingUrl(String),
    #[error("{0:?} is not a bundle directory")]
    NotABundle(PathBuf),
    #[error("no Info.plist found in {0:?}")]
    MissingManifest(PathBuf),
    #[error("unable to read manifest {0:?}: {1}")]
    ManifestParse(PathBuf, #[source] plist::Error),
    #[error("manifest {0:?} does not declare CFBundleExecutable")]
    MissingExecutableKey(PathBuf),
    #[error("executable {0:?} does not exist")]
    MissingExecutable(PathBuf),
}
