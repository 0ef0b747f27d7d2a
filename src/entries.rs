use crate::{
    search,
    search_query::Record,
    storage::StorageManager,
    tags::{build_tag_tree, TagNode},
};
use anyhow::anyhow;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::{
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Instant, SystemTime},
};

const DATA_VERSION: u64 = 1;

const MAX_URL_LEN: usize = 2048;
const MAX_TITLE_LEN: usize = 120;
const MAX_DESCRIPTION_LEN: usize = 600;
const MAX_ID_LEN: usize = 80;
const MAX_TIMESTAMP_LEN: usize = 64;

static URL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://").expect("valid url scheme regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Entry {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub updated_at: String,

    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub icon_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(&Value::deserialize(deserializer)?))
}

// Blank items are kept as stored, the tag tree and path filter skip them.
fn lenient_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => vec![],
        Value::Array(items) => items.iter().map(value_to_string).collect(),
        Value::String(s) => parse_tags(&s),
        other => vec![value_to_string(&other)],
    })
}

impl Record for Entry {
    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Entry {
    fn apply(&mut self, fields: EntryFields) {
        self.title = fields.title;
        self.url = fields.url;
        self.icon_url = fields.icon_url;
        self.description = fields.description;
        self.tags = fields.tags;
    }
}

/// The on-disk document: `{ version, exportedAt, entries }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataFile {
    #[serde(deserialize_with = "lenient_version")]
    pub version: u64,
    #[serde(deserialize_with = "lenient_string")]
    pub exported_at: String,
    #[serde(deserialize_with = "lenient_entries")]
    pub entries: Vec<Entry>,
}

fn lenient_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Value::deserialize(deserializer)?
        .as_u64()
        .unwrap_or(DATA_VERSION))
}

fn lenient_entries<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Entry>, D::Error> {
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(vec![]),
    };
    let total = items.len();

    let entries = items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<Entry>(item).ok())
        .collect::<Vec<_>>();

    if entries.len() < total {
        log::warn!("skipped {} stored items that are not entries", total - entries.len());
    }

    Ok(entries)
}

impl Default for DataFile {
    fn default() -> Self {
        Self {
            version: DATA_VERSION,
            exported_at: utc_now_iso(),
            entries: vec![],
        }
    }
}

impl DataFile {
    /// Tolerant decode: a bare array is the entry list, anything that is not
    /// an object or array is an empty store.
    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        match value {
            Value::Array(_) => Ok(Self {
                entries: lenient_entries(value)?,
                ..Default::default()
            }),
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            _ => Ok(Self::default()),
        }
    }
}

pub fn utc_now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn generate_id() -> String {
    format!("e-{}", chrono::Utc::now().timestamp_millis())
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("url is required")]
    UrlRequired,

    #[error("url must start with http:// or https://")]
    UrlScheme,
}

/// User-editable fields after cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFields {
    pub title: String,
    pub url: String,
    pub icon_url: String,
    pub description: String,
    pub tags: Vec<String>,
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Stringify and truncate to `max_len` characters.
fn safe_str(value: Option<&Value>, max_len: usize) -> String {
    value
        .map(value_to_string)
        .unwrap_or_default()
        .chars()
        .take(max_len)
        .collect()
}

/// Comma separated tags, trimmed, blanks dropped.
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

pub fn normalize_tags(tags: Option<&Value>) -> Vec<String> {
    match tags {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| value_to_string(item).trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::String(s)) => parse_tags(s),
        _ => vec![],
    }
}

// A missing title defaults to the (truncated) url, a blank one to the full url.
fn clean_title(payload: &Map<String, Value>, url: &str) -> String {
    let title = match payload.get("title") {
        Some(title) => safe_str(Some(title), MAX_TITLE_LEN),
        None => url.chars().take(MAX_TITLE_LEN).collect(),
    };
    match title.trim() {
        "" => url.to_string(),
        t => t.to_string(),
    }
}

pub fn validate_entry_payload(payload: &Map<String, Value>) -> Result<EntryFields, ValidationError> {
    let url = safe_str(payload.get("url"), MAX_URL_LEN).trim().to_string();
    if url.is_empty() {
        return Err(ValidationError::UrlRequired);
    }
    if !URL_SCHEME.is_match(&url) {
        return Err(ValidationError::UrlScheme);
    }

    Ok(EntryFields {
        title: clean_title(payload, &url),
        icon_url: safe_str(payload.get("iconUrl"), MAX_URL_LEN).trim().to_string(),
        description: safe_str(payload.get("description"), MAX_DESCRIPTION_LEN)
            .trim()
            .to_string(),
        tags: normalize_tags(payload.get("tags")),
        url,
    })
}

/// Requested id from a payload, if any.
pub fn payload_id(payload: &Map<String, Value>) -> Option<String> {
    let id = safe_str(payload.get("id"), MAX_ID_LEN).trim().to_string();
    (!id.is_empty()).then_some(id)
}

/// Clean one item of a bulk import. Skips non-objects and items without a
/// url; the url scheme is not checked here.
pub fn clean_import_item(item: &Value) -> Option<Entry> {
    let obj = item.as_object()?;

    let url = safe_str(obj.get("url"), MAX_URL_LEN).trim().to_string();
    if url.is_empty() {
        return None;
    }

    let timestamp = |key: &str| match obj.get(key) {
        Some(v) => safe_str(Some(v), MAX_TIMESTAMP_LEN),
        None => utc_now_iso(),
    };

    Some(Entry {
        id: payload_id(obj).unwrap_or_else(generate_id),
        created_at: timestamp("createdAt"),
        updated_at: timestamp("updatedAt"),
        title: clean_title(obj, &url),
        icon_url: safe_str(obj.get("iconUrl"), MAX_URL_LEN).trim().to_string(),
        description: safe_str(obj.get("description"), MAX_DESCRIPTION_LEN)
            .trim()
            .to_string(),
        tags: normalize_tags(obj.get("tags")),
        url,
    })
}

pub trait EntryManager: Send + Sync {
    fn list(&self) -> anyhow::Result<Vec<Entry>>;
    fn get(&self, id: &str) -> anyhow::Result<Option<Entry>>;
    fn create(&self, id: Option<String>, fields: EntryFields) -> anyhow::Result<Entry>;
    fn update(&self, id: &str, fields: EntryFields) -> anyhow::Result<Option<Entry>>;
    fn delete(&self, id: &str) -> anyhow::Result<Option<Entry>>;
    fn export(&self) -> anyhow::Result<DataFile>;
    fn import(&self, entries: Vec<Entry>) -> anyhow::Result<usize>;
    fn search(&self, query: &str, path: &str) -> anyhow::Result<Vec<Entry>>;
    fn tag_tree(&self) -> anyhow::Result<TagNode>;
}

// mtime granularity can be coarser than two quick writes, the length
// catches most of those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

fn file_stamp(storage: &dyn StorageManager, file_name: &str) -> Option<FileStamp> {
    storage.metadata(file_name).map(|meta| FileStamp {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

/// Data file contents plus the stamp of the file they were read from.
struct Store {
    data: DataFile,
    stamp: Option<FileStamp>,
}

/// JSON file backed store. The file is re-read whenever its stamp moves,
/// so writes from another process (the CLI next to a running daemon) are
/// picked up before the next read and never overwritten.
pub struct BackendJson {
    store: Arc<RwLock<Store>>,
    storage: Arc<dyn StorageManager>,
    file_name: String,
}

impl BackendJson {
    pub fn load(storage: Arc<dyn StorageManager>, file_name: &str) -> anyhow::Result<Self> {
        let stamp = file_stamp(storage.as_ref(), file_name);
        let data = Self::read_file(storage.as_ref(), file_name)?;

        Ok(Self {
            store: Arc::new(RwLock::new(Store { data, stamp })),
            storage,
            file_name: file_name.to_string(),
        })
    }

    fn read_file(storage: &dyn StorageManager, file_name: &str) -> anyhow::Result<DataFile> {
        let now = Instant::now();

        let data = if storage.exists(file_name) {
            DataFile::from_slice(&storage.read(file_name)?)?
        } else {
            log::info!("no data file at {file_name}, starting empty");
            DataFile::default()
        };

        log::debug!(
            "took {}ms to read {} entries",
            now.elapsed().as_micros() as f64 / 1000.0,
            data.entries.len()
        );

        Ok(data)
    }

    fn reload_if_changed(&self, store: &mut Store) -> anyhow::Result<()> {
        let stamp = file_stamp(self.storage.as_ref(), &self.file_name);
        if store.stamp == stamp {
            return Ok(());
        }

        log::debug!("{} changed on disk, reloading", self.file_name);
        store.data = Self::read_file(self.storage.as_ref(), &self.file_name)?;
        store.stamp = stamp;
        Ok(())
    }

    fn read(&self) -> anyhow::Result<RwLockReadGuard<'_, Store>> {
        let stale = {
            let store = self
                .store
                .read()
                .map_err(|_| anyhow!("entry store lock poisoned"))?;
            store.stamp != file_stamp(self.storage.as_ref(), &self.file_name)
        };
        if stale {
            drop(self.write()?);
        }

        self.store
            .read()
            .map_err(|_| anyhow!("entry store lock poisoned"))
    }

    fn write(&self) -> anyhow::Result<RwLockWriteGuard<'_, Store>> {
        let mut store = self
            .store
            .write()
            .map_err(|_| anyhow!("entry store lock poisoned"))?;
        self.reload_if_changed(&mut store)?;
        Ok(store)
    }

    fn save(&self, store: &mut Store, now: String) -> anyhow::Result<()> {
        store.data.exported_at = now;
        let bytes = serde_json::to_vec_pretty(&store.data)?;
        self.storage.write(&self.file_name, &bytes)?;
        store.stamp = file_stamp(self.storage.as_ref(), &self.file_name);
        Ok(())
    }
}

impl EntryManager for BackendJson {
    fn list(&self) -> anyhow::Result<Vec<Entry>> {
        Ok(self.read()?.data.entries.clone())
    }

    fn get(&self, id: &str) -> anyhow::Result<Option<Entry>> {
        Ok(self.read()?.data.entries.iter().find(|e| e.id == id).cloned())
    }

    fn create(&self, id: Option<String>, fields: EntryFields) -> anyhow::Result<Entry> {
        let now = utc_now_iso();
        let mut entry = Entry {
            id: id.unwrap_or_else(generate_id),
            created_at: now.clone(),
            updated_at: now.clone(),
            ..Default::default()
        };
        entry.apply(fields);

        let mut store = self.write()?;
        store.data.entries.insert(0, entry.clone());
        self.save(&mut store, now)?;

        log::info!("created entry {}", entry.id);
        Ok(entry)
    }

    fn update(&self, id: &str, fields: EntryFields) -> anyhow::Result<Option<Entry>> {
        let now = utc_now_iso();
        let mut store = self.write()?;

        let Some(entry) = store.data.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        entry.apply(fields);
        entry.updated_at = now.clone();
        let entry = entry.clone();

        self.save(&mut store, now)?;
        Ok(Some(entry))
    }

    fn delete(&self, id: &str) -> anyhow::Result<Option<Entry>> {
        let mut store = self.write()?;

        let Some(idx) = store.data.entries.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let deleted = store.data.entries.remove(idx);

        self.save(&mut store, utc_now_iso())?;

        log::info!("deleted entry {id}");
        Ok(Some(deleted))
    }

    fn export(&self) -> anyhow::Result<DataFile> {
        Ok(self.read()?.data.clone())
    }

    fn import(&self, entries: Vec<Entry>) -> anyhow::Result<usize> {
        let count = entries.len();
        let mut store = self.write()?;
        store.data = DataFile {
            entries,
            ..Default::default()
        };
        self.save(&mut store, utc_now_iso())?;

        log::info!("imported {count} entries");
        Ok(count)
    }

    fn search(&self, query: &str, path: &str) -> anyhow::Result<Vec<Entry>> {
        let store = self.read()?;
        let results = search::search(&store.data.entries, query, path);
        Ok(results.matches.into_iter().cloned().collect())
    }

    fn tag_tree(&self) -> anyhow::Result<TagNode> {
        Ok(build_tag_tree(&self.read()?.data.entries))
    }
}
