/*!
 Data structures produced when resolving `NSKeyedArchiver` data.
*/

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::util::location::FileLocation;

/// Key in `$top` that holds the store in a BTM archive
pub const STORE_KEY: &str = "store";
/// Key in `$top` that holds a nested archive containing the store
pub const STORE_DATA_KEY: &str = "storeData";
/// Key in `$top` that `NSKeyedArchiver` uses for the root object
pub const ROOT_KEY: &str = "root";
/// The only archiver this crate understands
pub const ARCHIVER: &str = "NSKeyedArchiver";
/// Marker string that decodes to `nil`
pub const NULL_MARKER: &str = "$null";

/// The decoded fields of a domain object, keyed by archive key
pub type Fields = BTreeMap<String, Arc<ArchivedObject>>;

/// Classes that may be instantiated from an archive
///
/// Anything not listed here is rejected before any of its fields are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivedClass {
    /// The top-level BTM store
    Storage,
    /// A single background item
    ItemRecord,
    Dictionary,
    Array,
    Set,
    String,
    Uuid,
    Url,
    Date,
    Data,
}

impl ArchivedClass {
    /// Look up a `$classname` in the allow-list
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Storage" => Some(Self::Storage),
            "ItemRecord" => Some(Self::ItemRecord),
            "NSDictionary" | "NSMutableDictionary" => Some(Self::Dictionary),
            "NSArray" | "NSMutableArray" => Some(Self::Array),
            "NSSet" | "NSMutableSet" => Some(Self::Set),
            "NSString" | "NSMutableString" => Some(Self::String),
            "NSUUID" => Some(Self::Uuid),
            "NSURL" => Some(Self::Url),
            "NSDate" => Some(Self::Date),
            "NSData" | "NSMutableData" => Some(Self::Data),
            _ => None,
        }
    }
}

/// A node of the resolved object graph
#[derive(Debug, Clone, PartialEq)]
pub enum ArchivedObject {
    /// An instance of `Storage`
    Storage(Fields),
    /// An instance of `ItemRecord`
    ItemRecord(Fields),
    /// Any pass-through value
    Value(GenericValue),
    /// A reference to an `$objects` entry that was still being decoded when it was reached again
    BackReference(usize),
    /// An `ItemRecord` whose fields hold a malformed value, with the reason
    UnreadableItem(String),
}

/// Untyped data carried through the graph, for example MDM payloads
#[derive(Debug, Clone, PartialEq)]
pub enum GenericValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Date(DateTime<Utc>),
    Data(Vec<u8>),
    String(String),
    Uuid(Uuid),
    Url(FileLocation),
    Array(Vec<Arc<ArchivedObject>>),
    Set(Vec<Arc<ArchivedObject>>),
    /// Entries in archived order
    Dictionary(Vec<(String, Arc<ArchivedObject>)>),
}

impl ArchivedObject {
    /// The Foundation class this node corresponds to, used in error messages
    pub fn class_name(&self) -> &'static str {
        match self {
            ArchivedObject::Storage(_) => "Storage",
            ArchivedObject::ItemRecord(_) | ArchivedObject::UnreadableItem(_) => "ItemRecord",
            ArchivedObject::BackReference(_) => "back-reference",
            ArchivedObject::Value(value) => match value {
                GenericValue::Null => NULL_MARKER,
                GenericValue::Boolean(_) | GenericValue::Integer(_) | GenericValue::Real(_) => {
                    "NSNumber"
                }
                GenericValue::Date(_) => "NSDate",
                GenericValue::Data(_) => "NSData",
                GenericValue::String(_) => "NSString",
                GenericValue::Uuid(_) => "NSUUID",
                GenericValue::Url(_) => "NSURL",
                GenericValue::Array(_) => "NSArray",
                GenericValue::Set(_) => "NSSet",
                GenericValue::Dictionary(_) => "NSDictionary",
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ArchivedObject::Value(GenericValue::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArchivedObject::Value(GenericValue::String(string)) => Some(string),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ArchivedObject::Value(GenericValue::Data(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&FileLocation> {
        match self {
            ArchivedObject::Value(GenericValue::Url(location)) => Some(location),
            _ => None,
        }
    }

    pub fn as_storage(&self) -> Option<&Fields> {
        match self {
            ArchivedObject::Storage(fields) => Some(fields),
            _ => None,
        }
    }
}
