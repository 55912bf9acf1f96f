/*!
 Contains logic to locate the executable declared by an application bundle.
*/

use std::path::{Path, PathBuf};

use plist::Value;

use crate::error::bundle::PathResolutionError;

/// Manifest key naming the bundle's executable
pub const EXECUTABLE_KEY: &str = "CFBundleExecutable";

/// How the files of a bundle are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `Contents/Info.plist` and `Contents/MacOS/<executable>`
    Contents,
    /// `Info.plist` and `<executable>` at the bundle root
    Flat,
}

/// A bundle directory with a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    root: PathBuf,
    manifest: PathBuf,
    layout: Layout,
}

impl Bundle {
    /// Open the bundle at `root`, which must be a directory containing a manifest
    pub fn open(root: impl AsRef<Path>) -> Result<Self, PathResolutionError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(PathResolutionError::NotABundle(root.to_path_buf()));
        }

        let nested = root.join("Contents").join("Info.plist");
        if nested.is_file() {
            return Ok(Bundle {
                root: root.to_path_buf(),
                manifest: nested,
                layout: Layout::Contents,
            });
        }

        let flat = root.join("Info.plist");
        if flat.is_file() {
            return Ok(Bundle {
                root: root.to_path_buf(),
                manifest: flat,
                layout: Layout::Flat,
            });
        }

        Err(PathResolutionError::MissingManifest(root.to_path_buf()))
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest
    }

    /// Read `CFBundleExecutable` from the manifest
    pub fn executable_name(&self) -> Result<String, PathResolutionError> {
        let manifest = Value::from_file(&self.manifest)
            .map_err(|why| PathResolutionError::ManifestParse(self.manifest.clone(), why))?;

        manifest
            .as_dictionary()
            .and_then(|dictionary| dictionary.get(EXECUTABLE_KEY))
            .and_then(Value::as_string)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .ok_or_else(|| PathResolutionError::MissingExecutableKey(self.manifest.clone()))
    }

    /// The path of the bundle's executable, which must exist
    pub fn executable_path(&self) -> Result<PathBuf, PathResolutionError> {
        let name = self.executable_name()?;
        let path = match self.layout {
            Layout::Contents => self.root.join("Contents").join("MacOS").join(name),
            Layout::Flat => self.root.join(name),
        };

        if path.exists() {
            Ok(path)
        } else {
            Err(PathResolutionError::MissingExecutable(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::{create_dir_all, write},
        path::Path,
    };

    use plist::{Dictionary, Value};

    use crate::{
        error::bundle::PathResolutionError,
        util::bundle::{Bundle, Layout},
    };

    fn write_manifest(path: &Path, executable: Option<&str>) {
        let mut manifest = Dictionary::new();
        manifest.insert(
            "CFBundleIdentifier".to_string(),
            "com.example.helper".into(),
        );
        if let Some(executable) = executable {
            manifest.insert("CFBundleExecutable".to_string(), executable.into());
        }
        Value::Dictionary(manifest).to_file_xml(path).unwrap();
    }

    #[test]
    fn can_resolve_contents_layout() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Helper.app");
        create_dir_all(bundle.join("Contents/MacOS")).unwrap();
        write_manifest(&bundle.join("Contents/Info.plist"), Some("Helper"));
        write(bundle.join("Contents/MacOS/Helper"), b"").unwrap();

        let opened = Bundle::open(&bundle).unwrap();
        assert_eq!(opened.layout(), Layout::Contents);
        assert_eq!(
            opened.executable_path().unwrap(),
            bundle.join("Contents/MacOS/Helper")
        );
    }

    #[test]
    fn can_resolve_flat_layout() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(&dir.path().join("Info.plist"), Some("tool"));
        write(dir.path().join("tool"), b"").unwrap();

        let opened = Bundle::open(dir.path()).unwrap();
        assert_eq!(opened.layout(), Layout::Flat);
        assert_eq!(opened.executable_path().unwrap(), dir.path().join("tool"));
    }

    #[test]
    fn can_read_binary_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Dictionary::new();
        manifest.insert("CFBundleExecutable".to_string(), "tool".into());
        Value::Dictionary(manifest)
            .to_file_binary(dir.path().join("Info.plist"))
            .unwrap();

        assert_eq!(
            Bundle::open(dir.path()).unwrap().executable_name().unwrap(),
            "tool"
        );
    }

    #[test]
    fn cant_open_missing_directory() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Bundle::open(dir.path().join("Missing.app")),
            Err(PathResolutionError::NotABundle(_))
        ));
    }

    #[test]
    fn cant_open_without_manifest() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Bundle::open(dir.path()),
            Err(PathResolutionError::MissingManifest(_))
        ));
    }

    #[test]
    fn cant_resolve_without_executable_key() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(&dir.path().join("Info.plist"), None);

        assert!(matches!(
            Bundle::open(dir.path()).unwrap().executable_path(),
            Err(PathResolutionError::MissingExecutableKey(_))
        ));
    }

    #[test]
    fn cant_resolve_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(&dir.path().join("Info.plist"), Some("gone"));

        assert!(matches!(
            Bundle::open(dir.path()).unwrap().executable_path(),
            Err(PathResolutionError::MissingExecutable(_))
        ));
    }

    #[test]
    fn cant_parse_garbage_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path().join("Info.plist"), b"not a property list").unwrap();

        assert!(matches!(
            Bundle::open(dir.path()).unwrap().executable_name(),
            Err(PathResolutionError::ManifestParse(..))
        ));
    }
}
