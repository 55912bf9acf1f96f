/*!
 This module represents the top-level `Storage` object of a BTM file.
*/

use std::{collections::BTreeMap, sync::Arc};

use tracing::warn;

use crate::{
    error::{btm::BTMParserError, diagnostic::Diagnostic},
    records::item::ItemRecord,
    util::keyed_archive::models::{ArchivedObject, Fields, GenericValue},
};

pub const ITEMS_BY_USER: &str = "itemsByUserIdentifier";
pub const MDM_PAYLOADS: &str = "mdmPayloadsByIdentifier";

/// Represents the `Storage` object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    /// Items keyed by user scope, in archived order within each scope
    pub items_by_user: BTreeMap<String, Vec<ItemRecord>>,
    /// Opaque MDM payloads keyed by identifier
    pub mdm_payloads: BTreeMap<String, Arc<ArchivedObject>>,
}

impl Store {
    /// Map the fields of the decoded `Storage` object
    ///
    /// Items that cannot be mapped are dropped and reported to `diagnostics`.
    pub fn from_fields(
        fields: &Fields,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Self, BTMParserError> {
        let mut store = Store::default();

        match fields.get(ITEMS_BY_USER).map(AsRef::as_ref) {
            Some(ArchivedObject::Value(GenericValue::Dictionary(scopes))) => {
                for (user, items) in scopes {
                    let records = Self::map_scope(user, items, diagnostics);
                    store.items_by_user.insert(user.clone(), records);
                }
            }
            Some(ArchivedObject::Value(GenericValue::Null)) | None => {
                warn!("Storage has no {ITEMS_BY_USER}, no items to read");
            }
            Some(other) => {
                return Err(BTMParserError::MalformedArchive(format!(
                    "{ITEMS_BY_USER} is a {}, not a dictionary",
                    other.class_name()
                )))
            }
        }

        match fields.get(MDM_PAYLOADS).map(AsRef::as_ref) {
            Some(ArchivedObject::Value(GenericValue::Dictionary(payloads))) => {
                for (identifier, payload) in payloads {
                    if is_payload_value(payload) {
                        store
                            .mdm_payloads
                            .insert(identifier.clone(), Arc::clone(payload));
                    } else {
                        warn!(
                            "Ignoring MDM payload {identifier}: unexpected {}",
                            payload.class_name()
                        );
                    }
                }
            }
            Some(ArchivedObject::Value(GenericValue::Null)) | None => {}
            Some(other) => warn!(
                "Ignoring {MDM_PAYLOADS}: {} is not a dictionary",
                other.class_name()
            ),
        }

        Ok(store)
    }

    /// Map the items of a single user scope
    fn map_scope(
        user: &str,
        items: &ArchivedObject,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ItemRecord> {
        let items = match items {
            ArchivedObject::Value(GenericValue::Array(items) | GenericValue::Set(items)) => items,
            other => {
                Diagnostic::RecordSkipped {
                    user: user.to_string(),
                    reason: format!("items are a {}, not an array", other.class_name()),
                }
                .report(diagnostics);
                return vec![];
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match ItemRecord::from_archived(item) {
                Ok(record) => records.push(record),
                Err(why) => Diagnostic::RecordSkipped {
                    user: user.to_string(),
                    reason: why.to_string(),
                }
                .report(diagnostics),
            }
        }
        records
    }
}

/// MDM payloads may only hold property-list style values
fn is_payload_value(object: &ArchivedObject) -> bool {
    match object {
        ArchivedObject::Value(value) => match value {
            GenericValue::Dictionary(entries) => {
                entries.iter().all(|(_, value)| is_payload_value(value))
            }
            GenericValue::Array(items) => items.iter().all(|item| is_payload_value(item)),
            GenericValue::String(_)
            | GenericValue::Integer(_)
            | GenericValue::Real(_)
            | GenericValue::Boolean(_)
            | GenericValue::Date(_)
            | GenericValue::Data(_)
            | GenericValue::Null => true,
            GenericValue::Set(_) | GenericValue::Uuid(_) | GenericValue::Url(_) => false,
        },
        _ => false,
    }
}
