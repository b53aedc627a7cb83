use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

use super::{Keys, RecordStore};
use crate::error::StoreError;

/// One namespace persisted as a single JSON object on disk.
///
/// Every mutation writes the full map to a sibling temp file and renames it
/// over the original, so readers never observe a partial write. The map is
/// only updated in memory once the rename has succeeded.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, JsonValue>>,
}

impl JsonFileStore {
    /// Load `path` if it exists; a missing file is an empty store.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries: BTreeMap<String, JsonValue> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "opened store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &BTreeMap<String, JsonValue>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn keys(&self) -> Result<Keys, StoreError> {
        let keys: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        Ok(keys.into_iter())
    }

    async fn replace_all(&self, entries: BTreeMap<String, JsonValue>) -> Result<(), StoreError> {
        let mut current = self.entries.lock().await;
        self.persist(&entries).await?;
        *current = entries;
        Ok(())
    }
}
