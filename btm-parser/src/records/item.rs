/*!
 This module represents a single background item stored in a BTM file.
*/

use std::collections::BTreeSet;

use crate::{
    error::record::RecordError,
    records::fields::{
        extract_int, extract_location, extract_string, extract_string_array,
        extract_string_set, extract_uuid,
    },
    util::{
        keyed_archive::models::{ArchivedObject, Fields},
        location::FileLocation,
    },
};

pub const IDENTIFIER: &str = "identifier";
pub const UUID: &str = "uuid";
pub const NAME: &str = "name";
pub const DEVELOPER_NAME: &str = "developerName";
pub const TEAM_IDENTIFIER: &str = "teamIdentifier";
pub const BUNDLE_IDENTIFIER: &str = "bundleIdentifier";
pub const EXECUTABLE_PATH: &str = "executablePath";
pub const URL: &str = "url";
pub const TYPE: &str = "type";
pub const DISPOSITION: &str = "disposition";
pub const CONTAINER: &str = "container";
pub const ASSOCIATED_BUNDLE_IDENTIFIERS: &str = "associatedBundleIdentifiers";
pub const EMBEDDED_ITEMS: &str = "embeddedItems";
pub const GENERATION: &str = "generation";

/// Represents a single `ItemRecord` object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemRecord {
    pub identifier: Option<String>,
    /// Uppercase, hyphenated
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub developer_name: Option<String>,
    pub team_identifier: Option<String>,
    pub bundle_identifier: Option<String>,
    pub executable_path: Option<String>,
    /// The launchd property list for agents and daemons, the bundle for apps and login items
    pub url: Option<FileLocation>,
    /// Bitmask described by [`type_details`](crate::records::flags::type_details)
    pub item_type: i64,
    /// Bitmask described by [`disposition_details`](crate::records::flags::disposition_details)
    pub disposition: i64,
    /// The `identifier` of the parent item
    pub container: Option<String>,
    pub associated_bundle_identifiers: Option<Vec<String>>,
    /// The `identifier`s of child items
    pub embedded_items: Option<BTreeSet<String>>,
    pub generation: Option<i64>,
}

impl ItemRecord {
    /// Map the fields of a decoded `ItemRecord` instance
    pub fn from_fields(fields: &Fields) -> Result<Self, RecordError> {
        Ok(ItemRecord {
            identifier: extract_string(fields, IDENTIFIER)?,
            uuid: extract_uuid(fields, UUID)?,
            name: extract_string(fields, NAME)?,
            developer_name: extract_string(fields, DEVELOPER_NAME)?,
            team_identifier: extract_string(fields, TEAM_IDENTIFIER)?,
            bundle_identifier: extract_string(fields, BUNDLE_IDENTIFIER)?,
            executable_path: extract_string(fields, EXECUTABLE_PATH)?,
            url: extract_location(fields, URL)?,
            item_type: extract_int(fields, TYPE)?.unwrap_or(0),
            disposition: extract_int(fields, DISPOSITION)?.unwrap_or(0),
            container: extract_string(fields, CONTAINER)?,
            associated_bundle_identifiers: extract_string_array(
                fields,
                ASSOCIATED_BUNDLE_IDENTIFIERS,
            )?,
            embedded_items: extract_string_set(fields, EMBEDDED_ITEMS)?,
            generation: extract_int(fields, GENERATION)?,
        })
    }

    /// Map a node of the object graph, which must be an `ItemRecord`
    pub fn from_archived(object: &ArchivedObject) -> Result<Self, RecordError> {
        match object {
            ArchivedObject::ItemRecord(fields) => Self::from_fields(fields),
            ArchivedObject::UnreadableItem(reason) => Err(RecordError::Unreadable(reason.clone())),
            other => Err(RecordError::NotAnItem(other.class_name())),
        }
    }
}
