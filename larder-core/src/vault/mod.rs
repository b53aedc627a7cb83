//! Password-protected collection of private links.
//!
//! A [`Vault`] moves between three states:
//!
//! - **Uninitialized**: no salt or verification hash stored.
//! - **Locked**: credential material stored, no key in memory.
//! - **Unlocked**: session key and decrypted entries held in memory.
//!
//! Entries only ever reach the store as [`EncryptedEnvelope`]s. Every save
//! re-encrypts the whole collection under fresh IVs and replaces the stored
//! envelopes in one step.
//!
//! All mutating methods take `&mut self`; share a vault across tasks behind a
//! mutex so that at most one operation runs per session.

pub mod crypto;

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

use crate::error::{StoreError, VaultError};
use crate::store::{LocalStores, RecordStore, META_VAULT_HASH, META_VAULT_KDF, META_VAULT_SALT};
use crate::types::{EncryptedEnvelope, VaultEntry};

pub use crypto::KdfParams;
use crypto::{constant_time_eq, decrypt_envelope, derive_in_background, encrypt_entry, generate_salt, KEY_LEN};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    Uninitialized,
    Locked,
    Unlocked,
}

struct Session {
    key: Zeroizing<[u8; KEY_LEN]>,
    entries: Vec<VaultEntry>,
}

pub struct Vault {
    envelopes: Arc<dyn RecordStore>,
    meta: Arc<dyn RecordStore>,
    /// Used when creating a vault. Unlock uses the stored parameters.
    params: KdfParams,
    session: Option<Session>,
}

impl Vault {
    pub fn new(envelopes: Arc<dyn RecordStore>, meta: Arc<dyn RecordStore>, params: KdfParams) -> Self {
        Self {
            envelopes,
            meta,
            params,
            session: None,
        }
    }

    pub fn from_stores(stores: &LocalStores, params: KdfParams) -> Self {
        Self::new(stores.vault.clone(), stores.meta.clone(), params)
    }

    pub async fn status(&self) -> Result<VaultStatus, VaultError> {
        if self.session.is_some() {
            return Ok(VaultStatus::Unlocked);
        }
        let initialized = self.meta.get(META_VAULT_SALT).await?.is_some()
            && self.meta.get(META_VAULT_HASH).await?.is_some();
        Ok(if initialized {
            VaultStatus::Locked
        } else {
            VaultStatus::Uninitialized
        })
    }

    pub fn is_unlocked(&self) -> bool {
        self.session.is_some()
    }

    /// Set up a new vault and leave it unlocked and empty.
    ///
    /// Nothing is written unless both passwords match and are long enough.
    pub async fn create_credential(&mut self, password: &str, confirm: &str) -> Result<(), VaultError> {
        if password != confirm {
            return Err(VaultError::Validation("Passwords do not match".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(VaultError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.status().await? != VaultStatus::Uninitialized {
            return Err(VaultError::State("already initialized"));
        }

        let salt = generate_salt();
        let derived = derive_in_background(password, salt.to_vec(), self.params).await?;

        self.envelopes.replace_all(BTreeMap::new()).await?;
        if let Err(e) = self.write_credential(&salt, &derived.verifier).await {
            self.discard_credential().await;
            return Err(e);
        }

        self.session = Some(Session {
            key: derived.key,
            entries: Vec::new(),
        });
        tracing::info!("vault created");
        Ok(())
    }

    /// Verify `password` and decrypt every stored envelope.
    ///
    /// Envelopes that fail to decode or decrypt are logged and left out; the
    /// unlock still succeeds with the rest.
    pub async fn unlock(&mut self, password: &str) -> Result<(), VaultError> {
        let (salt, stored_hash, params) = self.load_credential().await?;
        let derived = derive_in_background(password, salt, params).await?;
        if !constant_time_eq(&derived.verifier, &stored_hash) {
            return Err(VaultError::Auth);
        }

        let mut entries = Vec::new();
        for key in self.envelopes.keys().await? {
            let Some(value) = self.envelopes.get(&key).await? else {
                continue;
            };
            let envelope: EncryptedEnvelope = match serde_json::from_value(value) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "dropping malformed vault envelope");
                    continue;
                }
            };
            match decrypt_envelope(&derived.key, &envelope) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(id = %envelope.id, error = %e, "dropping undecryptable vault entry"),
            }
        }
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        tracing::info!(entries = entries.len(), "vault unlocked");
        self.session = Some(Session {
            key: derived.key,
            entries,
        });
        Ok(())
    }

    /// Drop the session key and decrypted entries. Locking a locked vault is a no-op.
    pub fn lock(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("vault locked");
        }
    }

    /// Decrypted entries, oldest first.
    pub fn entries(&self) -> Result<&[VaultEntry], VaultError> {
        Ok(&self.session()?.entries)
    }

    /// Fails with a validation error if an entry with the same id exists.
    pub async fn add_entry(&mut self, entry: VaultEntry) -> Result<(), VaultError> {
        let session = self.session()?;
        if session.entries.iter().any(|e| e.id == entry.id) {
            return Err(VaultError::Validation(format!(
                "Vault already has an entry with id {}",
                entry.id
            )));
        }
        let mut next = session.entries.clone();
        next.push(entry);
        self.persist(&session.key, &next).await?;
        self.commit(next);
        Ok(())
    }

    /// Returns whether an entry with `id` existed.
    pub async fn remove_entry(&mut self, id: &str) -> Result<bool, VaultError> {
        let session = self.session()?;
        let mut next = session.entries.clone();
        next.retain(|e| e.id != id);
        let removed = next.len() != session.entries.len();
        self.persist(&session.key, &next).await?;
        self.commit(next);
        Ok(removed)
    }

    /// Delete every envelope and the credential material. This is the only
    /// way to get a new salt.
    pub async fn wipe(&mut self) -> Result<(), VaultError> {
        self.session = None;
        self.envelopes.replace_all(BTreeMap::new()).await?;
        self.meta.delete(META_VAULT_HASH).await?;
        self.meta.delete(META_VAULT_SALT).await?;
        self.meta.delete(META_VAULT_KDF).await?;
        tracing::info!("vault wiped");
        Ok(())
    }

    fn session(&self) -> Result<&Session, VaultError> {
        self.session.as_ref().ok_or(VaultError::State("locked"))
    }

    fn commit(&mut self, entries: Vec<VaultEntry>) {
        if let Some(session) = self.session.as_mut() {
            session.entries = entries;
        }
    }

    async fn persist(&self, key: &[u8; KEY_LEN], entries: &[VaultEntry]) -> Result<(), VaultError> {
        let mut envelopes = BTreeMap::new();
        for entry in entries {
            let envelope = encrypt_entry(key, entry)?;
            let value = serde_json::to_value(&envelope).map_err(StoreError::from)?;
            envelopes.insert(envelope.id, value);
        }
        self.envelopes.replace_all(envelopes).await?;
        Ok(())
    }

    /// The hash goes last: a vault only counts as initialized once it exists.
    async fn write_credential(&self, salt: &[u8], verifier: &[u8]) -> Result<(), VaultError> {
        let params = serde_json::to_value(self.params).map_err(StoreError::from)?;
        self.meta.set(META_VAULT_KDF, params).await?;
        self.meta.set(META_VAULT_SALT, STANDARD.encode(salt).into()).await?;
        self.meta.set(META_VAULT_HASH, STANDARD.encode(verifier).into()).await?;
        Ok(())
    }

    async fn discard_credential(&self) {
        for key in [META_VAULT_HASH, META_VAULT_SALT, META_VAULT_KDF] {
            if let Err(e) = self.meta.delete(key).await {
                tracing::warn!(key, error = %e, "failed to remove partial vault credential");
            }
        }
    }

    async fn load_credential(&self) -> Result<(Vec<u8>, Vec<u8>, KdfParams), VaultError> {
        let salt = self.meta.get(META_VAULT_SALT).await?;
        let hash = self.meta.get(META_VAULT_HASH).await?;
        let (Some(salt), Some(hash)) = (salt, hash) else {
            return Err(VaultError::NotInitialized);
        };

        let decode = |name: &str, value: serde_json::Value| -> Result<Vec<u8>, VaultError> {
            let text = value
                .as_str()
                .ok_or_else(|| VaultError::CorruptCredential(format!("{name} is not a string")))?;
            STANDARD
                .decode(text)
                .map_err(|e| VaultError::CorruptCredential(format!("{name}: {e}")))
        };

        let params = match self.meta.get(META_VAULT_KDF).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| VaultError::CorruptCredential(format!("{META_VAULT_KDF}: {e}")))?,
            None => self.params,
        };

        Ok((
            decode(META_VAULT_SALT, salt)?,
            decode(META_VAULT_HASH, hash)?,
            params,
        ))
    }
}
