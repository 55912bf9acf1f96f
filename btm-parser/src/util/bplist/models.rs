/*!
 Data structures used to read objects out of a `bplist00` container.
*/

/// Every binary property list starts with this marker
pub const MAGIC: &[u8; 8] = b"bplist00";
/// Size of the trailer stored in the last bytes of the container
pub const TRAILER_SIZE: usize = 32;

/// The trailer at the end of a binary property list describing the object pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    /// Width in bytes of each entry in the offset table
    pub offset_size: u8,
    /// Width in bytes of object references inside arrays, sets and dictionaries
    pub ref_size: u8,
    /// Number of objects in the pool
    pub num_objects: u64,
    /// Index of the top-level object
    pub root_object: u64,
    /// Byte position where the offset table starts
    pub offset_table_offset: u64,
}

/// A single decoded entry of the object pool
///
/// Containers hold pool indices, not values; they are resolved on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum PlistObject<'a> {
    Null,
    Boolean(bool),
    /// Integers wider than 64 bits keep their low 8 bytes
    Integer(i64),
    Real(f64),
    /// Seconds since 2001-01-01T00:00:00Z
    Date(f64),
    Data(&'a [u8]),
    String(String),
    /// A keyed-archive reference into the `$objects` table
    Uid(u64),
    Array(Vec<usize>),
    Set(Vec<usize>),
    /// Pairs of `(key index, value index)` in stored order
    Dictionary(Vec<(usize, usize)>),
}

impl<'a> PlistObject<'a> {
    /// A short name for the kind of object, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            PlistObject::Null => "null",
            PlistObject::Boolean(_) => "boolean",
            PlistObject::Integer(_) => "integer",
            PlistObject::Real(_) => "real",
            PlistObject::Date(_) => "date",
            PlistObject::Data(_) => "data",
            PlistObject::String(_) => "string",
            PlistObject::Uid(_) => "uid",
            PlistObject::Array(_) => "array",
            PlistObject::Set(_) => "set",
            PlistObject::Dictionary(_) => "dictionary",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlistObject::String(string) => Some(string),
            _ => None,
        }
    }
}
