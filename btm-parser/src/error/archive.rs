/*!
 Errors that can happen when reading the binary property list container that holds a BTM archive.
*/

use thiserror::Error;

/// Errors that can happen when reading `bplist00` data
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("Invalid bplist header!")]
    InvalidHeader,
    #[error("Archive is {0} bytes, too short to hold a header and trailer")]
    TooShort(usize),
    #[error("Inconsistent trailer: {0}")]
    InvalidTrailer(String),
    #[error("Index {0:x} is outside of range {1:x}!")]
    OutOfBounds(usize, usize),
    #[error("Object reference {0} is outside of the object pool of size {1}")]
    InvalidReference(u64, u64),
    #[error("Unrecognized object marker {0:#04x} at offset {1:x}")]
    UnknownMarker(u8, usize),
    #[error("Failed to parse string at offset {0:x}")]
    StringParseError(usize),
    #[error("Invalid length marker at offset {0:x}")]
    InvalidLength(usize),
}
