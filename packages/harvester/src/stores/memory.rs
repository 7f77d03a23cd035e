//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::store::{Dataset, KeyValueStore};
use crate::types::OfferRecord;

/// In-memory key-value store and dataset.
///
/// Useful for testing and dry runs. Not suitable for production
/// as data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Vec<u8>>>,
    records: RwLock<Vec<OfferRecord>>,
    writes: RwLock<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key with a JSON value.
    pub fn with_json(self, key: &str, value: &serde_json::Value) -> Self {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string().into_bytes());
        self
    }

    /// Stored value for `key` parsed as JSON.
    pub fn json(&self, key: &str) -> Option<serde_json::Value> {
        self.values
            .read()
            .unwrap()
            .get(key)
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }

    /// Records pushed so far, in push order.
    pub fn records(&self) -> Vec<OfferRecord> {
        self.records.read().unwrap().clone()
    }

    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Number of `set` calls (checkpoint flushes).
    pub fn write_count(&self) -> usize {
        *self.writes.read().unwrap()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        *self.writes.write().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl Dataset for MemoryStore {
    async fn push(&self, record: &OfferRecord) -> StoreResult<()> {
        self.records.write().unwrap().push(record.clone());
        Ok(())
    }
}
