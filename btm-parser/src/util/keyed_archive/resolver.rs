/*!
 Contains logic to resolve the object graph of an `NSKeyedArchiver` archive.

 A keyed archive is a binary property list whose root dictionary holds:
   - `$archiver`: the name of the archiver, always `NSKeyedArchiver`
   - `$top`: symbolic root keys pointing into the object table
   - `$objects`: the object table; entry `0` is the `$null` marker
   - `$version`: the archive version

 Objects in the table refer to each other with `UID`s. Class instances are dictionaries
 with a `$class` entry pointing at a class description (`$classname`, `$classes`).
*/

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::{
    error::keyed_archive::KeyedArchiveError,
    util::{
        bplist::{models::PlistObject, parser::BinaryPlistReader},
        dates::from_apple_seconds,
        keyed_archive::models::{
            ArchivedClass, ArchivedObject, Fields, GenericValue, ARCHIVER, NULL_MARKER, ROOT_KEY,
            STORE_DATA_KEY, STORE_KEY,
        },
        location::FileLocation,
    },
};

/// Key of the class reference in an archived instance
const CLASS_KEY: &str = "$class";
/// Key of the class name in a class description
const CLASS_NAME_KEY: &str = "$classname";
/// Deepest nesting of pool objects that is decoded before giving up
pub const MAX_DEPTH: usize = 256;

/// Decode state of an entry in the `$objects` table
#[derive(Debug)]
enum Slot {
    /// Not decoded yet
    Pending,
    /// Currently being decoded further up the call stack
    InProgress,
    Done(Arc<ArchivedObject>),
}

/// Resolves `UID` references of a keyed archive into [`ArchivedObject`]s
///
/// Every `$objects` entry is decoded at most once; later references share the cached node.
/// Reaching an entry that is still being decoded yields [`ArchivedObject::BackReference`],
/// so cyclic graphs terminate.
#[derive(Debug)]
pub struct KeyedArchiveResolver<'a> {
    /// The container holding the archive
    reader: BinaryPlistReader<'a>,
    /// Pool indices of the `$objects` table, in order
    objects: Vec<usize>,
    /// `$top` keys and the pool index of their values
    top: Vec<(String, usize)>,
    /// Decoded `$objects` entries, indexed like [`KeyedArchiveResolver::objects`]
    cache: Vec<Slot>,
    /// Pool indices of inline containers currently being decoded
    stack: Vec<usize>,
    /// Number of [`KeyedArchiveResolver::resolve_value`] calls currently active
    depth: usize,
}

impl<'a> KeyedArchiveResolver<'a> {
    /// Read the archive header out of `stream`
    pub fn new(stream: &'a [u8]) -> Result<Self, KeyedArchiveError> {
        let reader = BinaryPlistReader::new(stream)?;
        let PlistObject::Dictionary(entries) = reader.read_object(reader.root())? else {
            return Err(KeyedArchiveError::InvalidType(
                "archive root".to_string(),
                "dictionary",
            ));
        };

        let mut objects = None;
        let mut top = None;
        for (key, value) in entries {
            match Self::read_key(&reader, key)?.as_str() {
                "$archiver" => {
                    let archiver = reader.read_object(value)?;
                    if archiver.as_str() != Some(ARCHIVER) {
                        let name = archiver
                            .as_str()
                            .map(String::from)
                            .unwrap_or_else(|| archiver.kind().to_string());
                        return Err(KeyedArchiveError::UnsupportedArchiver(name));
                    }
                }
                "$objects" => match reader.read_object(value)? {
                    PlistObject::Array(items) => objects = Some(items),
                    _ => {
                        return Err(KeyedArchiveError::InvalidType(
                            "$objects".to_string(),
                            "array",
                        ))
                    }
                },
                "$top" => match reader.read_object(value)? {
                    PlistObject::Dictionary(roots) => {
                        top = Some(
                            roots
                                .into_iter()
                                .map(|(name, index)| Ok((Self::read_key(&reader, name)?, index)))
                                .collect::<Result<Vec<_>, KeyedArchiveError>>()?,
                        )
                    }
                    _ => {
                        return Err(KeyedArchiveError::InvalidType(
                            "$top".to_string(),
                            "dictionary",
                        ))
                    }
                },
                _ => {}
            }
        }

        let objects = objects.ok_or_else(|| KeyedArchiveError::MissingKey("$objects".to_string()))?;
        let top = top.ok_or_else(|| KeyedArchiveError::MissingKey("$top".to_string()))?;
        let cache = objects.iter().map(|_| Slot::Pending).collect();

        Ok(Self {
            reader,
            objects,
            top,
            cache,
            stack: vec![],
            depth: 0,
        })
    }

    /// Read a dictionary key, which must be a string
    fn read_key(reader: &BinaryPlistReader, index: usize) -> Result<String, KeyedArchiveError> {
        match reader.read_object(index)? {
            PlistObject::String(key) => Ok(key),
            other => Err(KeyedArchiveError::InvalidType(
                format!("{} key at {index}", other.kind()),
                "string",
            )),
        }
    }

    /// The `$top` keys present in the archive
    pub fn top_keys(&self) -> impl Iterator<Item = &str> {
        self.top.iter().map(|(name, _)| name.as_str())
    }

    /// Resolve the object stored under `key` in `$top`, if there is one
    pub fn decode_top(&mut self, key: &str) -> Result<Option<Arc<ArchivedObject>>, KeyedArchiveError> {
        let index = self
            .top
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, index)| *index);

        match index {
            Some(index) => self.resolve_value(index).map(Some),
            None => Ok(None),
        }
    }

    /// Resolve a reference into the `$objects` table, consulting the cache first
    fn resolve_uid(&mut self, uid: u64) -> Result<Arc<ArchivedObject>, KeyedArchiveError> {
        let index = usize::try_from(uid)
            .ok()
            .filter(|index| *index < self.objects.len())
            .ok_or(KeyedArchiveError::InvalidUid(uid, self.objects.len()))?;

        match &self.cache[index] {
            Slot::Done(object) => return Ok(Arc::clone(object)),
            Slot::InProgress => return Ok(Arc::new(ArchivedObject::BackReference(index))),
            Slot::Pending => {}
        }

        self.cache[index] = Slot::InProgress;
        // Containers reached through a UID are guarded by the cache instead
        let outer = std::mem::take(&mut self.stack);
        let result = self.resolve_value(self.objects[index]);
        self.stack = outer;

        match result {
            Ok(object) => {
                self.cache[index] = Slot::Done(Arc::clone(&object));
                Ok(object)
            }
            Err(why) => {
                self.cache[index] = Slot::Pending;
                Err(why)
            }
        }
    }

    /// Run `decode` with `pool_index` marked as in use, failing if it already is
    fn guarded<T>(
        &mut self,
        pool_index: usize,
        decode: impl FnOnce(&mut Self) -> Result<T, KeyedArchiveError>,
    ) -> Result<T, KeyedArchiveError> {
        if self.stack.contains(&pool_index) {
            return Err(KeyedArchiveError::ReferenceCycle(pool_index));
        }
        self.stack.push(pool_index);
        let result = decode(self);
        self.stack.pop();
        result
    }

    fn resolve_all(&mut self, items: &[usize]) -> Result<Vec<Arc<ArchivedObject>>, KeyedArchiveError> {
        items.iter().map(|item| self.resolve_value(*item)).collect()
    }

    /// Resolve the pool object at `pool_index`, following `UID`s into the `$objects` table
    fn resolve_value(&mut self, pool_index: usize) -> Result<Arc<ArchivedObject>, KeyedArchiveError> {
        if self.depth >= MAX_DEPTH {
            return Err(KeyedArchiveError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = self.read_value(pool_index);
        self.depth -= 1;
        result
    }

    fn read_value(&mut self, pool_index: usize) -> Result<Arc<ArchivedObject>, KeyedArchiveError> {
        let value = match self.reader.read_object(pool_index)? {
            PlistObject::Uid(uid) => return self.resolve_uid(uid),
            PlistObject::Null => GenericValue::Null,
            PlistObject::Boolean(value) => GenericValue::Boolean(value),
            PlistObject::Integer(value) => GenericValue::Integer(value),
            PlistObject::Real(value) => GenericValue::Real(value),
            PlistObject::Date(seconds) => GenericValue::Date(
                from_apple_seconds(seconds)
                    .ok_or_else(|| KeyedArchiveError::InvalidDate(seconds.to_string()))?,
            ),
            PlistObject::Data(bytes) => GenericValue::Data(bytes.to_vec()),
            PlistObject::String(string) if string == NULL_MARKER => GenericValue::Null,
            PlistObject::String(string) => GenericValue::String(string),
            PlistObject::Array(items) => {
                GenericValue::Array(self.guarded(pool_index, |this| this.resolve_all(&items))?)
            }
            PlistObject::Set(items) => {
                GenericValue::Set(self.guarded(pool_index, |this| this.resolve_all(&items))?)
            }
            PlistObject::Dictionary(entries) => {
                return self
                    .guarded(pool_index, |this| this.resolve_dictionary(entries))
                    .map(Arc::new)
            }
        };
        Ok(Arc::new(ArchivedObject::Value(value)))
    }

    /// A dictionary is either a class instance (it has `$class`) or a plain dictionary
    fn resolve_dictionary(
        &mut self,
        entries: Vec<(usize, usize)>,
    ) -> Result<ArchivedObject, KeyedArchiveError> {
        let mut class_index = None;
        let mut keyed = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let key = Self::read_key(&self.reader, key)?;
            if key == CLASS_KEY {
                class_index = Some(value);
            } else {
                keyed.push((key, value));
            }
        }

        match class_index {
            Some(class_index) => {
                let class = self.read_class(class_index)?;
                self.decode_instance(class, &keyed)
            }
            None => {
                let mut out = Vec::with_capacity(keyed.len());
                for (key, value) in keyed {
                    out.push((key, self.resolve_value(value)?));
                }
                Ok(ArchivedObject::Value(GenericValue::Dictionary(out)))
            }
        }
    }

    /// Follow a `$class` reference and check the class name against the allow-list
    fn read_class(&self, class_index: usize) -> Result<ArchivedClass, KeyedArchiveError> {
        let PlistObject::Uid(uid) = self.reader.read_object(class_index)? else {
            return Err(KeyedArchiveError::InvalidType(CLASS_KEY.to_string(), "uid"));
        };
        let index = usize::try_from(uid)
            .ok()
            .filter(|index| *index < self.objects.len())
            .ok_or(KeyedArchiveError::InvalidUid(uid, self.objects.len()))?;

        let PlistObject::Dictionary(entries) = self.reader.read_object(self.objects[index])? else {
            return Err(KeyedArchiveError::InvalidType(
                format!("class description {index}"),
                "dictionary",
            ));
        };

        for (key, value) in entries {
            if Self::read_key(&self.reader, key)? == CLASS_NAME_KEY {
                let PlistObject::String(name) = self.reader.read_object(value)? else {
                    return Err(KeyedArchiveError::InvalidType(
                        CLASS_NAME_KEY.to_string(),
                        "string",
                    ));
                };
                return ArchivedClass::from_name(&name)
                    .ok_or(KeyedArchiveError::UnexpectedClass(name));
            }
        }
        Err(KeyedArchiveError::MissingKey(CLASS_NAME_KEY.to_string()))
    }

    /// Find the pool index stored under `key` in an instance
    fn member(keyed: &[(String, usize)], key: &str) -> Option<usize> {
        keyed
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, index)| *index)
    }

    fn resolve_member(
        &mut self,
        keyed: &[(String, usize)],
        key: &str,
    ) -> Result<Arc<ArchivedObject>, KeyedArchiveError> {
        let index =
            Self::member(keyed, key).ok_or_else(|| KeyedArchiveError::MissingKey(key.to_string()))?;
        self.resolve_value(index)
    }

    /// Resolve every element of the `UID` array stored under `key`
    fn resolve_members(
        &mut self,
        keyed: &[(String, usize)],
        key: &str,
    ) -> Result<Vec<Arc<ArchivedObject>>, KeyedArchiveError> {
        let index =
            Self::member(keyed, key).ok_or_else(|| KeyedArchiveError::MissingKey(key.to_string()))?;
        match self.reader.read_object(index)? {
            PlistObject::Array(items) => self.guarded(index, |this| this.resolve_all(&items)),
            _ => Err(KeyedArchiveError::InvalidType(key.to_string(), "array")),
        }
    }

    /// Build the node for an allowed class from its archived keys
    fn decode_instance(
        &mut self,
        class: ArchivedClass,
        keyed: &[(String, usize)],
    ) -> Result<ArchivedObject, KeyedArchiveError> {
        let value = match class {
            ArchivedClass::Storage => return Ok(ArchivedObject::Storage(self.resolve_fields(keyed)?)),
            ArchivedClass::ItemRecord => {
                // A bad value only costs this record; graph and container errors still abort
                return match self.resolve_fields(keyed) {
                    Ok(fields) => Ok(ArchivedObject::ItemRecord(fields)),
                    Err(why) if why.is_recoverable() => {
                        debug!("Unreadable ItemRecord: {why}");
                        Ok(ArchivedObject::UnreadableItem(why.to_string()))
                    }
                    Err(why) => Err(why),
                };
            }
            ArchivedClass::Dictionary => {
                let keys = self.resolve_members(keyed, "NS.keys")?;
                let values = self.resolve_members(keyed, "NS.objects")?;
                if keys.len() != values.len() {
                    return Err(KeyedArchiveError::MismatchedDictionary(
                        "NSDictionary",
                        keys.len(),
                        values.len(),
                    ));
                }

                let mut entries = Vec::with_capacity(keys.len());
                for (key, value) in keys.into_iter().zip(values) {
                    let key = key.as_str().ok_or_else(|| {
                        KeyedArchiveError::InvalidType(
                            format!("NSDictionary key of class {}", key.class_name()),
                            "string",
                        )
                    })?;
                    entries.push((key.to_string(), value));
                }
                GenericValue::Dictionary(entries)
            }
            ArchivedClass::Array => GenericValue::Array(self.resolve_members(keyed, "NS.objects")?),
            ArchivedClass::Set => GenericValue::Set(self.resolve_members(keyed, "NS.objects")?),
            ArchivedClass::String => {
                let string = self.resolve_member(keyed, "NS.string")?;
                GenericValue::String(
                    string
                        .as_str()
                        .ok_or_else(|| {
                            KeyedArchiveError::InvalidType("NS.string".to_string(), "string")
                        })?
                        .to_string(),
                )
            }
            ArchivedClass::Uuid => {
                let bytes = self.resolve_member(keyed, "NS.uuidbytes")?;
                let uuid = bytes
                    .as_bytes()
                    .and_then(|bytes| Uuid::from_slice(bytes).ok())
                    .ok_or_else(|| {
                        KeyedArchiveError::InvalidType("NS.uuidbytes".to_string(), "16 byte UUID")
                    })?;
                GenericValue::Uuid(uuid)
            }
            ArchivedClass::Url => {
                let base = match Self::member(keyed, "NS.base") {
                    Some(index) => Some(self.resolve_value(index)?),
                    None => None,
                };
                let base = match base.as_deref() {
                    None => None,
                    Some(base) if base.is_null() => None,
                    Some(base) => Some(base.as_location().ok_or_else(|| {
                        KeyedArchiveError::InvalidType("NS.base".to_string(), "NSURL")
                    })?),
                };
                let relative = self.resolve_member(keyed, "NS.relative")?;
                let relative = relative.as_str().ok_or_else(|| {
                    KeyedArchiveError::InvalidType("NS.relative".to_string(), "string")
                })?;
                let location = FileLocation::resolve(base, relative)
                    .map_err(|why| KeyedArchiveError::InvalidUrl(relative.to_string(), why))?;
                GenericValue::Url(location)
            }
            ArchivedClass::Date => {
                let seconds = match self.resolve_member(keyed, "NS.time")?.as_ref() {
                    ArchivedObject::Value(GenericValue::Real(seconds)) => *seconds,
                    ArchivedObject::Value(GenericValue::Integer(seconds)) => *seconds as f64,
                    _ => {
                        return Err(KeyedArchiveError::InvalidType(
                            "NS.time".to_string(),
                            "real",
                        ))
                    }
                };
                GenericValue::Date(
                    from_apple_seconds(seconds)
                        .ok_or_else(|| KeyedArchiveError::InvalidDate(seconds.to_string()))?,
                )
            }
            ArchivedClass::Data => {
                let data = self.resolve_member(keyed, "NS.data")?;
                GenericValue::Data(
                    data.as_bytes()
                        .ok_or_else(|| KeyedArchiveError::InvalidType("NS.data".to_string(), "data"))?
                        .to_vec(),
                )
            }
        };
        Ok(ArchivedObject::Value(value))
    }

    fn resolve_fields(&mut self, keyed: &[(String, usize)]) -> Result<Fields, KeyedArchiveError> {
        let mut fields = Fields::new();
        for (key, index) in keyed {
            let value = self.resolve_value(*index)?;
            fields.insert(key.clone(), value);
        }
        Ok(fields)
    }
}

/// Decode the `Storage` object of a BTM archive
///
/// The store is looked up under `$top["store"]`. Older stores wrap a complete nested
/// archive in `$top["storeData"]`, whose own root object is the store.
pub fn unarchive_store(stream: &[u8]) -> Result<Fields, KeyedArchiveError> {
    let mut resolver = KeyedArchiveResolver::new(stream)?;

    if let Some(store) = resolver.decode_top(STORE_KEY)? {
        if let Some(fields) = store.as_storage() {
            debug!("Decoded Storage object using '{STORE_KEY}' key");
            return Ok(fields.clone());
        }
        debug!(
            "'{STORE_KEY}' holds a {}, trying '{STORE_DATA_KEY}'",
            store.class_name()
        );
    }

    if let Some(store_data) = resolver.decode_top(STORE_DATA_KEY)? {
        if let Some(bytes) = store_data.as_bytes() {
            let mut nested = KeyedArchiveResolver::new(bytes)?;
            if let Some(store) = nested.decode_top(ROOT_KEY)? {
                if let Some(fields) = store.as_storage() {
                    debug!("Decoded Storage object using '{STORE_DATA_KEY}' key");
                    return Ok(fields.clone());
                }
            }
        }
    }

    Err(KeyedArchiveError::MissingRoot)
}
