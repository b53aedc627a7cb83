use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use super::{Keys, RecordStore};
use crate::error::StoreError;

/// Volatile store, used by tests and by callers that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Keys, StoreError> {
        let keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        Ok(keys.into_iter())
    }

    async fn replace_all(&self, entries: BTreeMap<String, JsonValue>) -> Result<(), StoreError> {
        *self.entries.write().await = entries;
        Ok(())
    }
}
