use crate::{
    config::Config,
    ddg::{self, ExternalResult},
    entries::{self, BackendJson, DataFile, Entry, EntryManager},
    storage::{BackendLocal, StorageManager},
    tags::TagNode,
};
use serde_json::Value;
use std::{sync::Arc, time::Duration};

use super::{backend::*, errors::AppError};

pub struct AppLocal {
    pub entry_mgr: Arc<dyn EntryManager>,
    config: Arc<Config>,
}

impl AppLocal {
    /// Open the entry store under the config's base path.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let storage_mgr: Arc<dyn StorageManager> =
            Arc::new(BackendLocal::new(config.base_path())?);
        let entry_mgr = Arc::new(BackendJson::load(storage_mgr, &config.data_file)?);

        Ok(Self::new_with(entry_mgr, Arc::new(config)))
    }

    pub fn new_with(entry_mgr: Arc<dyn EntryManager>, config: Arc<Config>) -> Self {
        Self { entry_mgr, config }
    }
}

impl AppBackend for AppLocal {
    fn list(&self) -> anyhow::Result<Vec<Entry>, AppError> {
        Ok(self.entry_mgr.list()?)
    }

    fn get(&self, id: &str) -> anyhow::Result<Entry, AppError> {
        self.entry_mgr.get(id)?.ok_or(AppError::NotFound)
    }

    fn create(&self, payload: Payload) -> anyhow::Result<Entry, AppError> {
        let fields = entries::validate_entry_payload(&payload)?;
        let id = entries::payload_id(&payload);

        Ok(self.entry_mgr.create(id, fields)?)
    }

    fn update(&self, id: &str, payload: Payload) -> anyhow::Result<Entry, AppError> {
        let existing = self.get(id)?;

        // payload fields win over the stored ones, then the whole thing is re-validated
        let mut merged = match serde_json::to_value(existing)? {
            Value::Object(map) => map,
            _ => Payload::new(),
        };
        merged.extend(payload);

        let fields = entries::validate_entry_payload(&merged)?;

        self.entry_mgr
            .update(id, fields)?
            .ok_or(AppError::NotFound)
    }

    fn delete(&self, id: &str) -> anyhow::Result<Entry, AppError> {
        self.entry_mgr.delete(id)?.ok_or(AppError::NotFound)
    }

    fn export(&self) -> anyhow::Result<DataFile, AppError> {
        Ok(self.entry_mgr.export()?)
    }

    fn import(&self, payload: Payload) -> anyhow::Result<usize, AppError> {
        let Some(items) = payload.get("entries").and_then(Value::as_array) else {
            return Err(AppError::BadRequest("entries must be a list".to_string()));
        };

        let cleaned = items
            .iter()
            .filter_map(entries::clean_import_item)
            .collect::<Vec<_>>();

        if cleaned.len() < items.len() {
            log::warn!(
                "import skipped {} invalid items",
                items.len() - cleaned.len()
            );
        }

        Ok(self.entry_mgr.import(cleaned)?)
    }

    fn tag_tree(&self) -> anyhow::Result<TagNode, AppError> {
        Ok(self.entry_mgr.tag_tree()?)
    }

    fn search(&self, query: &str, path: &str) -> anyhow::Result<Vec<Entry>, AppError> {
        Ok(self.entry_mgr.search(query, path)?)
    }

    fn external_search(&self, query: &str) -> anyhow::Result<Vec<ExternalResult>, AppError> {
        let timeout = Duration::from_secs(self.config.external_search_timeout_secs);
        Ok(ddg::search(
            query,
            timeout,
            self.config.external_search_max_results,
        ))
    }

    fn config(&self) -> &Config {
        &self.config
    }
}
