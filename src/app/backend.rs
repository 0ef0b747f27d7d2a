use serde_json::{Map, Value};

use crate::{
    config::Config,
    ddg::ExternalResult,
    entries::{DataFile, Entry},
    tags::TagNode,
};

use super::errors::AppError;

/// Raw request bodies: anything that is not a JSON object reads as `{}`.
pub type Payload = Map<String, Value>;

pub trait AppBackend: Send + Sync {
    fn list(&self) -> anyhow::Result<Vec<Entry>, AppError>;
    fn get(&self, id: &str) -> anyhow::Result<Entry, AppError>;
    fn create(&self, payload: Payload) -> anyhow::Result<Entry, AppError>;
    fn update(&self, id: &str, payload: Payload) -> anyhow::Result<Entry, AppError>;
    fn delete(&self, id: &str) -> anyhow::Result<Entry, AppError>;

    fn export(&self) -> anyhow::Result<DataFile, AppError>;
    fn import(&self, payload: Payload) -> anyhow::Result<usize, AppError>;

    fn tag_tree(&self) -> anyhow::Result<TagNode, AppError>;
    fn search(&self, query: &str, path: &str) -> anyhow::Result<Vec<Entry>, AppError>;
    fn external_search(&self, query: &str) -> anyhow::Result<Vec<ExternalResult>, AppError>;

    fn config(&self) -> &Config;
}

pub fn payload_from_slice(body: &[u8]) -> Payload {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => map,
        _ => Payload::new(),
    }
}
