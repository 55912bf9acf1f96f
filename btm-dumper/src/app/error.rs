/*!
Errors that can happen during the application's runtime
*/

use std::{io::Error as IoError, path::PathBuf};

use btm_parser::error::btm::BTMParserError;
use thiserror::Error;

/// Errors that can happen during the application's runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid options!\n{0}")]
    InvalidOptions(String),
    #[error("{0}: {1:?}")]
    CreateError(IoError, PathBuf),
    #[error("{0}")]
    DiskError(IoError),
    #[error(transparent)]
    ParseError(#[from] BTMParserError),
}
