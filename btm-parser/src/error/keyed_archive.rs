/*!
 Errors that can happen when resolving the keyed-archive object graph stored in a BTM file.
*/

use thiserror::Error;

use crate::error::archive::ArchiveError;

/// Errors that can happen when resolving `NSKeyedArchiver` data
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyedArchiveError {
    #[error(transparent)]
    Container(#[from] ArchiveError),
    /// A `$classname` that is not on the allow-list
    #[error("unexpected class: {0}")]
    UnexpectedClass(String),
    #[error("root Store object not found")]
    MissingRoot,
    #[error("unsupported archiver: {0}")]
    UnsupportedArchiver(String),
    #[error("missing key {0}")]
    MissingKey(String),
    #[error("{0} is not a {1}")]
    InvalidType(String, &'static str),
    #[error("reference {0} is outside of the object table of size {1}")]
    InvalidUid(u64, usize),
    #[error("reference cycle at object {0}")]
    ReferenceCycle(usize),
    #[error("{0} has {1} keys but {2} values")]
    MismatchedDictionary(&'static str, usize, usize),
    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("date {0} is out of range")]
    InvalidDate(String),
    #[error("object graph is nested deeper than {0} levels")]
    TooDeep(usize),
}

impl KeyedArchiveError {
    /// Errors confined to the payload of a single object, as opposed to the container or graph
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KeyedArchiveError::MissingKey(_)
                | KeyedArchiveError::InvalidType(..)
                | KeyedArchiveError::MismatchedDictionary(..)
                | KeyedArchiveError::InvalidUrl(..)
                | KeyedArchiveError::InvalidDate(_)
        )
    }
}
