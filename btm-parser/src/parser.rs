/*!
 Contains the entry point for decoding a BTM file into [`ParsedData`].
*/

use std::{fs::read, io::ErrorKind, path::Path};

use tracing::debug;

use crate::{
    error::{btm::BTMParserError, diagnostic::Diagnostic},
    parsed::{ParsedData, ParsedItem},
    records::{executable::resolve_executable_paths, store::Store},
    util::keyed_archive::resolver::unarchive_store,
};

/// Decodes `BackgroundItems-v*.btm` files
///
/// # Example:
///
/// ```no_run
/// use btm_parser::parser::BTMParser;
///
/// let parsed = BTMParser::parse("/private/var/db/com.apple.backgroundtaskmanagement/BackgroundItems-v13.btm").unwrap();
/// for (user, items) in &parsed.items_by_user {
///     println!("{user}: {} items", items.len());
/// }
/// ```
pub struct BTMParser;

impl BTMParser {
    /// Read and decode the BTM file at `path`
    pub fn parse(path: impl AsRef<Path>) -> Result<ParsedData, BTMParserError> {
        let path = path.as_ref();
        let label = path.to_string_lossy().into_owned();

        if !path.exists() {
            return Err(BTMParserError::FileNotFound { path: label });
        }

        let bytes = read(path).map_err(|why| match why.kind() {
            ErrorKind::NotFound => BTMParserError::FileNotFound {
                path: label.clone(),
            },
            _ => BTMParserError::CannotRead {
                path: label.clone(),
                reason: why.to_string(),
            },
        })?;
        debug!("Read {} bytes from {label}", bytes.len());

        Self::parse_bytes(label, &bytes)
    }

    /// Decode a BTM file already held in memory; `path` is only recorded on the result
    pub fn parse_bytes(path: impl Into<String>, bytes: &[u8]) -> Result<ParsedData, BTMParserError> {
        let fields = unarchive_store(bytes)?;

        let mut diagnostics = vec![];
        let store = Store::from_fields(&fields, &mut diagnostics)?;

        let mut parsed = ParsedData {
            path: path.into(),
            items_by_user: Default::default(),
            mdm_payloads: store.mdm_payloads,
            diagnostics: vec![],
        };

        for (user, records) in store.items_by_user {
            let mut items = Vec::with_capacity(records.len());
            for record in records {
                match ParsedItem::try_from(record) {
                    Ok(item) => items.push(item),
                    Err(why) => Diagnostic::RecordSkipped {
                        user: user.clone(),
                        reason: why.to_string(),
                    }
                    .report(&mut diagnostics),
                }
            }
            resolve_executable_paths(&mut items, &mut diagnostics);
            debug!("Decoded {} items for user {user}", items.len());
            parsed.items_by_user.insert(user, items);
        }

        parsed.diagnostics = diagnostics;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, write};

    use plist::{Dictionary, Value};
    use pretty_assertions::assert_eq;

    use crate::{
        error::{btm::BTMParserError, diagnostic::Diagnostic},
        parser::BTMParser,
        test_support::{store_archive, ArchiveBuilder, ItemFixture},
        util::keyed_archive::resolver::MAX_DEPTH,
    };

    const USER: &str = "DCA7C5DA-F8EE-4910-A2F5-C32EDCAC43FC";

    #[test]
    fn can_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BackgroundItems-v13.btm");
        let mut agent = ItemFixture::named(
            "8.com.example.agent",
            "0E6B7C9A-3F1D-4B5E-8C2A-1D9F0A7B6C5E",
            "com.example.agent",
        );
        agent.item_type = Some(0x8);
        agent.disposition = Some(0x3);
        agent.url = Some("file:///Library/LaunchAgents/com.example.agent.plist");
        agent.generation = Some(2);
        write(&path, store_archive(&[(USER, vec![agent])])).unwrap();

        let parsed = BTMParser::parse(&path).unwrap();
        assert_eq!(parsed.path, path.to_string_lossy());
        assert_eq!(parsed.item_count(), 1);

        let item = &parsed.items_by_user[USER][0];
        assert_eq!(item.type_details, "agent");
        assert_eq!(item.disposition_details, "enabled allowed visible not notified");
        assert_eq!(item.generation, Some(2));
        assert_eq!(
            item.manifest_path().unwrap(),
            "/Library/LaunchAgents/com.example.agent.plist"
        );
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn can_parse_deterministically() {
        let mut first = ItemFixture::named("2.b", "0E6B7C9A-3F1D-4B5E-8C2A-1D9F0A7B6C5E", "b");
        first.associated_bundle_identifiers = Some(vec!["com.example.b", "com.example.a"]);
        first.embedded_items = Some(vec!["4.c"]);
        let second = ItemFixture::named("2.a", "86703457-9137-4467-AF13-B21883C26467", "a");
        let bytes = store_archive(&[(USER, vec![first, second]), ("OTHER", vec![])]);

        let once = BTMParser::parse_bytes("memory", &bytes).unwrap();
        let twice = BTMParser::parse_bytes("memory", &bytes).unwrap();
        assert_eq!(once, twice);

        let names: Vec<_> = once.items_by_user[USER].iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(once.items_by_user["OTHER"].is_empty());
    }

    #[test]
    fn can_skip_record_missing_name() {
        let mut nameless = ItemFixture::named("2.nameless", "0E6B7C9A-3F1D-4B5E-8C2A-1D9F0A7B6C5E", "x");
        nameless.name = None;
        let kept = ItemFixture::named("2.kept", "86703457-9137-4467-AF13-B21883C26467", "kept");
        let bytes = store_archive(&[(USER, vec![nameless, kept])]);

        let parsed = BTMParser::parse_bytes("memory", &bytes).unwrap();
        assert_eq!(parsed.items_by_user[USER].len(), 1);
        assert_eq!(parsed.items_by_user[USER][0].identifier, "2.kept");
        assert_eq!(
            parsed.diagnostics,
            vec![Diagnostic::RecordSkipped {
                user: USER.to_string(),
                reason: "missing required field name".to_string(),
            }]
        );
    }

    #[test]
    fn can_skip_record_with_wrong_field_type() {
        let mut builder = ArchiveBuilder::new();
        let identifier = builder.string("2.typed");
        let name = builder.string("typed");
        let not_a_number = builder.string("agent");
        let item = builder.instance(
            "ItemRecord",
            vec![("identifier", identifier), ("name", name), ("type", not_a_number)],
        );
        let items = builder.array(vec![item]);
        let scopes = builder.dictionary(vec![(USER, items)]);
        let store = builder.instance("Storage", vec![("itemsByUserIdentifier", scopes)]);
        let bytes = builder.to_bytes(vec![("store", store)]);

        let parsed = BTMParser::parse_bytes("memory", &bytes).unwrap();
        assert!(parsed.items_by_user[USER].is_empty());
        assert_eq!(
            parsed.diagnostics,
            vec![Diagnostic::RecordSkipped {
                user: USER.to_string(),
                reason: "field type is not a integer (found NSString)".to_string(),
            }]
        );
    }

    #[test]
    fn can_skip_record_with_malformed_uuid() {
        let mut builder = ArchiveBuilder::new();
        let identifier = builder.string("2.broken");
        let name = builder.string("broken");
        let short_uuid = builder.instance("NSUUID", vec![("NS.uuidbytes", Value::Data(vec![0; 15]))]);
        let broken = builder.instance(
            "ItemRecord",
            vec![("identifier", identifier), ("name", name), ("uuid", short_uuid)],
        );
        let kept = ItemFixture::named("2.kept", "86703457-9137-4467-AF13-B21883C26467", "kept")
            .archive(&mut builder);
        let items = builder.array(vec![broken, kept]);
        let scopes = builder.dictionary(vec![(USER, items)]);
        let store = builder.instance("Storage", vec![("itemsByUserIdentifier", scopes)]);
        let bytes = builder.to_bytes(vec![("store", store)]);

        let parsed = BTMParser::parse_bytes("memory", &bytes).unwrap();
        assert_eq!(parsed.items_by_user[USER].len(), 1);
        assert_eq!(parsed.items_by_user[USER][0].identifier, "2.kept");
        assert_eq!(
            parsed.diagnostics,
            vec![Diagnostic::RecordSkipped {
                user: USER.to_string(),
                reason: "unreadable ItemRecord: NS.uuidbytes is not a 16 byte UUID".to_string(),
            }]
        );
    }

    #[test]
    fn cant_parse_deeply_nested_payload() {
        let mut builder = ArchiveBuilder::new();
        let mut payload = builder.array(vec![]);
        for _ in 0..MAX_DEPTH * 4 {
            payload = builder.array(vec![payload]);
        }
        let payloads = builder.dictionary(vec![("com.example.profile", payload)]);
        let store = builder.instance("Storage", vec![("mdmPayloadsByIdentifier", payloads)]);
        let bytes = builder.to_bytes(vec![("store", store)]);

        let error = std::thread::Builder::new()
            .stack_size(8 * 1024 * 1024)
            .spawn(move || BTMParser::parse_bytes("memory", &bytes))
            .unwrap()
            .join()
            .unwrap()
            .unwrap_err();
        assert_eq!(
            error,
            BTMParserError::MalformedArchive(format!(
                "object graph is nested deeper than {MAX_DEPTH} levels"
            ))
        );
    }

    #[test]
    fn cant_parse_missing_file() {
        assert_eq!(
            BTMParser::parse("/path/to/non/existent/file.btm").unwrap_err(),
            BTMParserError::FileNotFound {
                path: "/path/to/non/existent/file.btm".to_string()
            }
        );
    }

    #[test]
    fn cant_parse_directory() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            BTMParser::parse(dir.path()),
            Err(BTMParserError::CannotRead { .. })
        ));
    }

    #[test]
    fn cant_parse_unexpected_class() {
        let mut builder = ArchiveBuilder::new();
        let payload = builder.instance("NSValue", vec![]);
        let store = builder.instance("Storage", vec![("itemsByUserIdentifier", payload)]);
        let bytes = builder.to_bytes(vec![("store", store)]);

        assert_eq!(
            BTMParser::parse_bytes("memory", &bytes).unwrap_err(),
            BTMParserError::MalformedArchive("unexpected class: NSValue".to_string())
        );
    }

    #[test]
    fn cant_parse_bad_magic() {
        let mut bytes = store_archive(&[]);
        bytes[..8].copy_from_slice(b"bplist01");

        assert!(matches!(
            BTMParser::parse_bytes("memory", &bytes),
            Err(BTMParserError::MalformedArchive(_))
        ));
    }

    #[test]
    fn cant_parse_missing_root() {
        let builder = ArchiveBuilder::new();
        let bytes = builder.to_bytes(vec![]);

        assert_eq!(
            BTMParser::parse_bytes("memory", &bytes).unwrap_err().to_string(),
            "Malformed archive: root Store object not found"
        );
    }

    #[test]
    fn can_resolve_1password_launcher() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("1Password.app");
        let launcher = app.join("Contents/Library/LoginItems/1Password Launcher.app");
        create_dir_all(launcher.join("Contents/MacOS")).unwrap();
        let mut manifest = Dictionary::new();
        manifest.insert(
            "CFBundleExecutable".to_string(),
            "1Password Launcher".into(),
        );
        Value::Dictionary(manifest)
            .to_file_xml(launcher.join("Contents/Info.plist"))
            .unwrap();
        write(launcher.join("Contents/MacOS/1Password Launcher"), b"").unwrap();

        let parent_url = format!("file://{}/", app.display());
        let mut parent = ItemFixture::named(
            "2.com.1password.1password",
            "0E6B7C9A-3F1D-4B5E-8C2A-1D9F0A7B6C5E",
            "1Password",
        );
        parent.item_type = Some(0x2);
        parent.url = Some(&parent_url);
        let mut item = ItemFixture::named(
            "4.com.1password.1password-launcher",
            "86703457-9137-4467-AF13-B21883C26467",
            "1Password Launcher",
        );
        item.developer_name = Some("AgileBits Inc.");
        item.team_identifier = Some("2BUA8C4S2C");
        item.bundle_identifier = Some("com.1password.1password-launcher");
        item.item_type = Some(4);
        item.disposition = Some(10);
        item.container = Some("2.com.1password.1password");
        item.generation = Some(4);
        item.url = Some("/Contents/Library/LoginItems/1Password%20Launcher.app/");
        let bytes = store_archive(&[(USER, vec![parent, item])]);

        let parsed = BTMParser::parse_bytes("memory", &bytes).unwrap();
        let launcher = parsed.items_by_user[USER]
            .iter()
            .find(|item| item.identifier == "4.com.1password.1password-launcher")
            .unwrap();
        assert_eq!(launcher.name, "1Password Launcher");
        assert_eq!(launcher.uuid, "86703457-9137-4467-AF13-B21883C26467");
        assert_eq!(launcher.type_details, "login item");
        assert_eq!(
            launcher.disposition_details,
            "disabled allowed visible notified"
        );
        assert!(launcher
            .executable_path
            .as_ref()
            .unwrap()
            .ends_with("/Contents/MacOS/1Password Launcher"));
    }
}
