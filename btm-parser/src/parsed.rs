/*!
 The result of parsing a BTM file.
*/

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    error::{diagnostic::Diagnostic, record::RecordError},
    records::{
        flags::{disposition_details, has_flag, item_type, type_details},
        item::{self, ItemRecord},
    },
    util::{keyed_archive::models::ArchivedObject, location::FileLocation},
};

/// A background item that has an `identifier`, `uuid` and `name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub identifier: String,
    pub uuid: String,
    pub name: String,
    pub developer_name: Option<String>,
    pub team_identifier: Option<String>,
    pub item_type: i64,
    /// Description of [`ParsedItem::item_type`]
    pub type_details: String,
    pub disposition: i64,
    /// Description of [`ParsedItem::disposition`]
    pub disposition_details: String,
    pub url: Option<FileLocation>,
    /// For login items and apps, resolved from the bundle when possible
    pub executable_path: Option<String>,
    pub bundle_identifier: Option<String>,
    pub container: Option<String>,
    pub associated_bundle_identifiers: Option<Vec<String>>,
    pub generation: Option<i64>,
}

impl ParsedItem {
    /// Determine if the item is a launchd agent or daemon
    pub fn is_launchd_job(&self) -> bool {
        has_flag(self.item_type, item_type::AGENT) || has_flag(self.item_type, item_type::DAEMON)
    }

    /// The file-system path of [`ParsedItem::url`]
    pub fn url_path(&self) -> Option<String> {
        self.url.as_ref().and_then(FileLocation::path)
    }

    /// The launchd property list of an agent or daemon
    pub fn manifest_path(&self) -> Option<String> {
        if self.is_launchd_job() {
            return self.url_path();
        }
        None
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, RecordError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(RecordError::MissingField(key))
}

impl TryFrom<ItemRecord> for ParsedItem {
    type Error = RecordError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        Ok(ParsedItem {
            identifier: required(record.identifier, item::IDENTIFIER)?,
            uuid: required(record.uuid, item::UUID)?,
            name: required(record.name, item::NAME)?,
            developer_name: record.developer_name,
            team_identifier: record.team_identifier,
            type_details: type_details(record.item_type),
            item_type: record.item_type,
            disposition_details: disposition_details(record.disposition),
            disposition: record.disposition,
            url: record.url,
            executable_path: record.executable_path,
            bundle_identifier: record.bundle_identifier,
            container: record.container,
            associated_bundle_identifiers: record.associated_bundle_identifiers,
            generation: record.generation,
        })
    }
}

/// Everything extracted from a BTM file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedData {
    /// The path the data was read from
    pub path: String,
    /// Items keyed by user scope, in archived order within each scope
    pub items_by_user: BTreeMap<String, Vec<ParsedItem>>,
    /// Opaque MDM payloads keyed by identifier
    pub mdm_payloads: BTreeMap<String, Arc<ArchivedObject>>,
    /// Problems that did not stop the parse
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedData {
    /// The total number of items across all user scopes
    pub fn item_count(&self) -> usize {
        self.items_by_user.values().map(Vec::len).sum()
    }
}
