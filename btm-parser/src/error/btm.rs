/*!
 Errors returned to callers of [`BTMParser`](crate::parser::BTMParser).
*/

use thiserror::Error;

use crate::error::{archive::ArchiveError, keyed_archive::KeyedArchiveError};

/// Fatal errors that abort decoding a BTM file
///
/// Non-fatal problems with individual records are reported as
/// [`Diagnostic`](crate::error::diagnostic::Diagnostic)s instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BTMParserError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },
    #[error("Unable to read {path}: {reason}")]
    CannotRead { path: String, reason: String },
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),
}

impl From<KeyedArchiveError> for BTMParserError {
    fn from(why: KeyedArchiveError) -> Self {
        Self::MalformedArchive(why.to_string())
    }
}

impl From<ArchiveError> for BTMParserError {
    fn from(why: ArchiveError) -> Self {
        Self::MalformedArchive(why.to_string())
    }
}
