use std::{
    fs::File,
    io::{stdout, BufWriter, Write},
};

use btm_parser::{
    parsed::{ParsedData, ParsedItem},
    util::location::FileLocation,
};
use json::{object, object::Object, JsonValue};

use crate::{
    app::{error::RuntimeError, runtime::Config},
    exporters::exporter::{Exporter, Writer},
};

/// Spaces used to indent nested JSON
const INDENT: u16 = 2;

pub struct JSON<'a> {
    /// Data that is setup from the application's runtime
    pub config: &'a Config,
}

impl<'a> Exporter<'a> for JSON<'a> {
    fn new(config: &'a Config) -> Self {
        JSON { config }
    }

    fn export(&mut self) -> Result<(), RuntimeError> {
        let text = self.format_data(&self.config.data).pretty(INDENT);

        match &self.config.options.out {
            Some(path) => {
                let file = File::create(path)
                    .map_err(|why| RuntimeError::CreateError(why, path.clone()))?;
                let mut writer = BufWriter::new(file);
                writeln!(writer, "{text}").map_err(RuntimeError::DiskError)?;
                writer.flush().map_err(RuntimeError::DiskError)?;
                eprintln!(
                    "Wrote {} items to {}",
                    self.config.data.item_count(),
                    path.display()
                );
            }
            None => {
                let mut handle = stdout().lock();
                writeln!(handle, "{text}").map_err(RuntimeError::DiskError)?;
            }
        }
        Ok(())
    }
}

fn insert_optional<T: Into<JsonValue>>(object: &mut Object, key: &str, value: Option<T>) {
    if let Some(value) = value {
        object.insert(key, value.into());
    }
}

impl<'a> Writer for JSON<'a> {
    type Output = JsonValue;

    fn format_data(&self, data: &ParsedData) -> JsonValue {
        let mut users = Object::new();
        for (user, items) in &data.items_by_user {
            users.insert(
                user,
                JsonValue::Array(items.iter().map(|item| self.format_item(item)).collect()),
            );
        }

        object! {
            path: data.path.as_str(),
            itemsByUserIdentifier: JsonValue::Object(users),
        }
    }

    fn format_item(&self, item: &ParsedItem) -> JsonValue {
        let mut object = Object::new();
        object.insert("identifier", item.identifier.as_str().into());
        object.insert("uuid", item.uuid.as_str().into());
        object.insert("name", item.name.as_str().into());
        insert_optional(&mut object, "developerName", item.developer_name.as_deref());
        insert_optional(&mut object, "teamIdentifier", item.team_identifier.as_deref());
        object.insert("type", item.item_type.into());
        object.insert("typeDetails", item.type_details.as_str().into());
        object.insert("disposition", item.disposition.into());
        object.insert("dispositionDetails", item.disposition_details.as_str().into());
        insert_optional(&mut object, "url", item.url.as_ref().map(FileLocation::as_str));
        insert_optional(&mut object, "executablePath", item.executable_path.as_deref());
        insert_optional(&mut object, "bundleIdentifier", item.bundle_identifier.as_deref());
        insert_optional(&mut object, "container", item.container.as_deref());
        insert_optional(
            &mut object,
            "associatedBundleIdentifiers",
            item.associated_bundle_identifiers.clone(),
        );
        insert_optional(&mut object, "generation", item.generation);
        JsonValue::Object(object)
    }
}
