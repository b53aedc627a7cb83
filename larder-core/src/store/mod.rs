//! Keyed persistence for recipes, vault envelopes and vault metadata.
//!
//! Each namespace is its own [`RecordStore`]; they never share keys. Every
//! operation is atomic with respect to the others on the same store.
//! Enumeration order is unspecified, so callers sort after retrieval.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::StoreError;

/// Metadata key holding the base64 vault salt.
pub const META_VAULT_SALT: &str = "vault_salt";
/// Metadata key holding the base64 password-verification hash.
pub const META_VAULT_HASH: &str = "vault_hash";
/// Metadata key holding the key-derivation parameters the vault was created with.
pub const META_VAULT_KDF: &str = "vault_kdf";

/// Snapshot of a store's keys. Finite; call [`RecordStore::keys`] again to restart.
pub type Keys = std::vec::IntoIter<String>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StoreError>;

    /// Insert or overwrite.
    async fn set(&self, key: &str, value: JsonValue) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn keys(&self) -> Result<Keys, StoreError>;

    /// Replace the whole namespace in one step.
    async fn replace_all(&self, entries: BTreeMap<String, JsonValue>) -> Result<(), StoreError>;
}

/// The three independent namespaces the application persists.
#[derive(Clone)]
pub struct LocalStores {
    pub recipes: Arc<dyn RecordStore>,
    pub vault: Arc<dyn RecordStore>,
    pub meta: Arc<dyn RecordStore>,
}

impl LocalStores {
    /// Open (or lazily create) the file-backed stores under `dir`.
    pub async fn open(dir: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            recipes: Arc::new(JsonFileStore::open(dir.join("recipes.json")).await?),
            vault: Arc::new(JsonFileStore::open(dir.join("vault.json")).await?),
            meta: Arc::new(JsonFileStore::open(dir.join("meta.json")).await?),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            recipes: Arc::new(MemoryStore::new()),
            vault: Arc::new(MemoryStore::new()),
            meta: Arc::new(MemoryStore::new()),
        }
    }
}
