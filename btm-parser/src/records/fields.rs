/*!
 Helpers that read typed values out of the fields of an archived object.

 A key that is absent, or that resolves to `$null`, reads as [`None`]. A key holding a
 value of the wrong type is a [`RecordError::InvalidType`].
*/

use std::{collections::BTreeSet, sync::Arc};

use uuid::Uuid;

use crate::{
    error::record::RecordError,
    util::{
        keyed_archive::models::{ArchivedObject, Fields, GenericValue},
        location::FileLocation,
    },
};

fn field<'a>(fields: &'a Fields, key: &str) -> Option<&'a ArchivedObject> {
    fields
        .get(key)
        .map(AsRef::as_ref)
        .filter(|value| !value.is_null())
}

fn invalid(key: &str, expected: &'static str, found: &ArchivedObject) -> RecordError {
    RecordError::InvalidType(key.to_string(), expected, found.class_name())
}

pub fn extract_string(fields: &Fields, key: &str) -> Result<Option<String>, RecordError> {
    match field(fields, key) {
        Some(value) => value
            .as_str()
            .map(|string| Some(string.to_string()))
            .ok_or_else(|| invalid(key, "string", value)),
        None => Ok(None),
    }
}

pub fn extract_int(fields: &Fields, key: &str) -> Result<Option<i64>, RecordError> {
    match field(fields, key) {
        Some(ArchivedObject::Value(GenericValue::Integer(number))) => Ok(Some(*number)),
        Some(value) => Err(invalid(key, "integer", value)),
        None => Ok(None),
    }
}

fn canonical_uuid(uuid: &Uuid) -> String {
    uuid.hyphenated()
        .encode_upper(&mut Uuid::encode_buffer())
        .to_string()
}

/// Read an `NSUUID` as an uppercase, hyphenated string
///
/// Identifiers archived as plain strings must parse as a UUID and are normalised the same way.
pub fn extract_uuid(fields: &Fields, key: &str) -> Result<Option<String>, RecordError> {
    match field(fields, key) {
        Some(ArchivedObject::Value(GenericValue::Uuid(uuid))) => Ok(Some(canonical_uuid(uuid))),
        Some(ArchivedObject::Value(GenericValue::String(string))) => Uuid::parse_str(string)
            .map(|uuid| Some(canonical_uuid(&uuid)))
            .map_err(|_| RecordError::InvalidUuid(key.to_string(), string.clone())),
        Some(value) => Err(invalid(key, "NSUUID", value)),
        None => Ok(None),
    }
}

pub fn extract_location(fields: &Fields, key: &str) -> Result<Option<FileLocation>, RecordError> {
    match field(fields, key) {
        Some(ArchivedObject::Value(GenericValue::Url(location))) => Ok(Some(location.clone())),
        Some(value) => Err(invalid(key, "NSURL", value)),
        None => Ok(None),
    }
}

fn strings_of(key: &str, items: &[Arc<ArchivedObject>]) -> Result<Vec<String>, RecordError> {
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| invalid(key, "string collection", item))
        })
        .collect()
}

/// Read an `NSArray` of strings, keeping archived order
pub fn extract_string_array(fields: &Fields, key: &str) -> Result<Option<Vec<String>>, RecordError> {
    match field(fields, key) {
        Some(ArchivedObject::Value(GenericValue::Array(items))) => strings_of(key, items).map(Some),
        Some(value) => Err(invalid(key, "NSArray", value)),
        None => Ok(None),
    }
}

/// Read an `NSSet` of strings
pub fn extract_string_set(fields: &Fields, key: &str) -> Result<Option<BTreeSet<String>>, RecordError> {
    match field(fields, key) {
        Some(ArchivedObject::Value(GenericValue::Set(items) | GenericValue::Array(items))) => {
            strings_of(key, items).map(|strings| Some(strings.into_iter().collect()))
        }
        Some(value) => Err(invalid(key, "NSSet", value)),
        None => Ok(None),
    }
}
