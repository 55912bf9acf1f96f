/*!
 Builders for synthetic BTM archives used by the unit tests.

 Archives are assembled as [`plist::Value`]s and written with `plist`'s binary writer,
 so the reader in [`crate::util::bplist`] is exercised against an independent encoder.
*/

use std::collections::HashMap;

use plist::{Dictionary, Uid, Value};
use uuid::Uuid;

use crate::util::bplist::models::MAGIC;

/// Assemble a container from pre-encoded objects using 1 byte offsets and references
pub(crate) fn raw_bplist(objects: &[&[u8]], root: u64) -> Vec<u8> {
    let mut bytes = MAGIC.to_vec();
    let mut offsets = vec![];
    for object in objects {
        offsets.push(bytes.len() as u8);
        bytes.extend_from_slice(object);
    }
    let offset_table = bytes.len() as u64;
    bytes.extend(offsets);
    bytes.extend([0u8; 6]);
    bytes.push(1);
    bytes.push(1);
    bytes.extend((objects.len() as u64).to_be_bytes());
    bytes.extend(root.to_be_bytes());
    bytes.extend(offset_table.to_be_bytes());
    bytes
}

pub(crate) fn uid(index: u64) -> Value {
    Value::Uid(Uid::new(index))
}

pub(crate) fn integer(value: i64) -> Value {
    Value::Integer(value.into())
}

/// Assembles the `$objects` table of an `NSKeyedArchiver` archive
pub(crate) struct ArchiveBuilder {
    objects: Vec<Value>,
    classes: HashMap<String, Value>,
}

impl ArchiveBuilder {
    pub(crate) fn new() -> Self {
        Self {
            objects: vec![Value::String("$null".to_string())],
            classes: HashMap::new(),
        }
    }

    /// The reference that decodes to `nil`
    pub(crate) fn null(&self) -> Value {
        uid(0)
    }

    /// Append an object and return a reference to it
    pub(crate) fn push(&mut self, value: Value) -> Value {
        self.objects.push(value);
        uid(self.objects.len() as u64 - 1)
    }

    /// Append a placeholder that is filled in later with [`ArchiveBuilder::replace`]
    pub(crate) fn reserve(&mut self) -> (usize, Value) {
        let reference = self.push(Value::Boolean(false));
        (self.objects.len() - 1, reference)
    }

    pub(crate) fn replace(&mut self, index: usize, value: Value) {
        self.objects[index] = value;
    }

    /// A reference to the class description for `name`, shared between instances
    pub(crate) fn class(&mut self, name: &str) -> Value {
        if let Some(class) = self.classes.get(name) {
            return class.clone();
        }
        let mut description = Dictionary::new();
        description.insert("$classname".to_string(), name.into());
        description.insert(
            "$classes".to_string(),
            Value::Array(vec![name.into(), "NSObject".into()]),
        );
        let class = self.push(Value::Dictionary(description));
        self.classes.insert(name.to_string(), class.clone());
        class
    }

    /// The dictionary body of an instance of `class`
    pub(crate) fn instance_body(&mut self, class: &str, fields: Vec<(&str, Value)>) -> Value {
        let mut body = Dictionary::new();
        body.insert("$class".to_string(), self.class(class));
        for (key, value) in fields {
            body.insert(key.to_string(), value);
        }
        Value::Dictionary(body)
    }

    pub(crate) fn instance(&mut self, class: &str, fields: Vec<(&str, Value)>) -> Value {
        let body = self.instance_body(class, fields);
        self.push(body)
    }

    pub(crate) fn string(&mut self, value: &str) -> Value {
        self.push(value.into())
    }

    pub(crate) fn ns_string(&mut self, value: &str) -> Value {
        let string = self.string(value);
        self.instance("NSMutableString", vec![("NS.string", string)])
    }

    pub(crate) fn array(&mut self, items: Vec<Value>) -> Value {
        self.instance("NSArray", vec![("NS.objects", Value::Array(items))])
    }

    pub(crate) fn set(&mut self, items: Vec<Value>) -> Value {
        self.instance("NSSet", vec![("NS.objects", Value::Array(items))])
    }

    pub(crate) fn dictionary(&mut self, entries: Vec<(&str, Value)>) -> Value {
        let mut keys = vec![];
        let mut values = vec![];
        for (key, value) in entries {
            keys.push(self.string(key));
            values.push(value);
        }
        self.instance(
            "NSDictionary",
            vec![
                ("NS.keys", Value::Array(keys)),
                ("NS.objects", Value::Array(values)),
            ],
        )
    }

    pub(crate) fn uuid(&mut self, value: &str) -> Value {
        let bytes = Uuid::parse_str(value)
            .map(|uuid| uuid.as_bytes().to_vec())
            .unwrap_or_default();
        self.instance("NSUUID", vec![("NS.uuidbytes", Value::Data(bytes))])
    }

    pub(crate) fn url(&mut self, base: Option<Value>, relative: &str) -> Value {
        let base = base.unwrap_or_else(|| self.null());
        let relative = self.string(relative);
        self.instance("NSURL", vec![("NS.base", base), ("NS.relative", relative)])
    }

    /// Serialise the archive with the given `$top` entries
    pub(crate) fn to_bytes(&self, top: Vec<(&str, Value)>) -> Vec<u8> {
        let mut roots = Dictionary::new();
        for (key, value) in top {
            roots.insert(key.to_string(), value);
        }

        let mut archive = Dictionary::new();
        archive.insert("$archiver".to_string(), "NSKeyedArchiver".into());
        archive.insert("$version".to_string(), integer(100_000));
        archive.insert("$top".to_string(), Value::Dictionary(roots));
        archive.insert("$objects".to_string(), Value::Array(self.objects.clone()));

        let mut bytes = vec![];
        Value::Dictionary(archive)
            .to_writer_binary(&mut bytes)
            .unwrap();
        bytes
    }
}

/// The archived fields of one `ItemRecord`
#[derive(Debug, Clone, Default)]
pub(crate) struct ItemFixture<'a> {
    pub identifier: Option<&'a str>,
    pub uuid: Option<&'a str>,
    pub name: Option<&'a str>,
    pub developer_name: Option<&'a str>,
    pub team_identifier: Option<&'a str>,
    pub bundle_identifier: Option<&'a str>,
    pub executable_path: Option<&'a str>,
    pub url: Option<&'a str>,
    pub item_type: Option<i64>,
    pub disposition: Option<i64>,
    pub container: Option<&'a str>,
    pub associated_bundle_identifiers: Option<Vec<&'a str>>,
    pub embedded_items: Option<Vec<&'a str>>,
    pub generation: Option<i64>,
}

impl<'a> ItemFixture<'a> {
    /// An item with the required fields set
    pub(crate) fn named(identifier: &'a str, uuid: &'a str, name: &'a str) -> Self {
        Self {
            identifier: Some(identifier),
            uuid: Some(uuid),
            name: Some(name),
            ..Default::default()
        }
    }

    pub(crate) fn archive(&self, builder: &mut ArchiveBuilder) -> Value {
        let mut fields = vec![];
        let strings = [
            ("identifier", self.identifier),
            ("name", self.name),
            ("developerName", self.developer_name),
            ("teamIdentifier", self.team_identifier),
            ("bundleIdentifier", self.bundle_identifier),
            ("executablePath", self.executable_path),
            ("container", self.container),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                fields.push((key, builder.string(value)));
            }
        }
        if let Some(uuid) = self.uuid {
            fields.push(("uuid", builder.uuid(uuid)));
        }
        if let Some(url) = self.url {
            fields.push(("url", builder.url(None, url)));
        }
        if let Some(item_type) = self.item_type {
            fields.push(("type", integer(item_type)));
        }
        if let Some(disposition) = self.disposition {
            fields.push(("disposition", integer(disposition)));
        }
        if let Some(generation) = self.generation {
            fields.push(("generation", integer(generation)));
        }
        if let Some(associated) = &self.associated_bundle_identifiers {
            let items = associated.iter().map(|id| builder.string(id)).collect();
            fields.push(("associatedBundleIdentifiers", builder.array(items)));
        }
        if let Some(embedded) = &self.embedded_items {
            let items = embedded.iter().map(|id| builder.string(id)).collect();
            fields.push(("embeddedItems", builder.set(items)));
        }
        builder.instance("ItemRecord", fields)
    }
}

/// Archive a `Storage` object under the given top-level key
pub(crate) fn store_archive_with(
    builder: &mut ArchiveBuilder,
    users: &[(&str, Vec<ItemFixture>)],
) -> Value {
    let mut scopes = vec![];
    for (user, items) in users {
        let items = items.iter().map(|item| item.archive(builder)).collect();
        scopes.push((*user, builder.array(items)));
    }
    let items_by_user = builder.dictionary(scopes);
    let payloads = builder.dictionary(vec![]);
    builder.instance(
        "Storage",
        vec![
            ("itemsByUserIdentifier", items_by_user),
            ("mdmPayloadsByIdentifier", payloads),
        ],
    )
}

/// A complete BTM archive holding `users` under `$top["store"]`
pub(crate) fn store_archive(users: &[(&str, Vec<ItemFixture>)]) -> Vec<u8> {
    let mut builder = ArchiveBuilder::new();
    let store = store_archive_with(&mut builder, users);
    builder.to_bytes(vec![("store", store)])
}
