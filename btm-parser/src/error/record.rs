/*!
 Errors that can happen when mapping decoded archive objects onto item records.
*/

use thiserror::Error;

/// Errors that cause a single record to be skipped
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The key, the expected type, and the type that was found
    #[error("field {0} is not a {1} (found {2})")]
    InvalidType(String, &'static str, &'static str),
    #[error("entry is a {0}, not an ItemRecord")]
    NotAnItem(&'static str),
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("field {0} holds an invalid UUID {1}")]
    InvalidUuid(String, String),
    /// The record's own payload could not be decoded
    #[error("unreadable ItemRecord: {0}")]
    Unreadable(String),
}
