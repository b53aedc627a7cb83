//! Password key derivation and per-entry authenticated encryption.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::Config;
use crate::error::VaultError;
use crate::types::{EncryptedEnvelope, VaultEntry};

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
pub const VERIFIER_LEN: usize = 32;
pub const IV_LEN: usize = 12;

const OUTPUT_LEN: usize = KEY_LEN + VERIFIER_LEN;

/// Argon2id cost parameters. The same values must be used for creation and
/// every later unlock of a vault, so they are stored next to the salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub lanes: u32,
}

impl KdfParams {
    pub const STANDARD: Self = Self {
        memory_kib: 64 * 1024,
        iterations: 3,
        lanes: 1,
    };

    /// Minimal cost for dev/test. NOT SECURE FOR REAL VAULTS.
    pub const INSECURE: Self = Self {
        memory_kib: 1024,
        iterations: 1,
        lanes: 1,
    };

    pub fn from_config(config: &Config) -> Self {
        if config.insecure_kdf {
            Self::INSECURE
        } else {
            Self::STANDARD
        }
    }
}

/// Output of one derivation: the session key and the password verifier.
pub struct DerivedKeys {
    pub key: Zeroizing<[u8; KEY_LEN]>,
    pub verifier: [u8; VERIFIER_LEN],
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// One argon2id pass producing 64 bytes: the first half is the AES-256 key,
/// the second half is the stored verification hash.
pub fn derive(password: &str, salt: &[u8], params: KdfParams) -> Result<DerivedKeys, VaultError> {
    let params = Params::new(
        params.memory_kib,
        params.iterations,
        params.lanes,
        Some(OUTPUT_LEN),
    )
    .map_err(|e| VaultError::Crypto(format!("argon2 params: {e}")))?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; OUTPUT_LEN]);
    argon
        .hash_password_into(password.as_bytes(), salt, &mut output[..])
        .map_err(|e| VaultError::Crypto(format!("argon2 derive: {e}")))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&output[..KEY_LEN]);
    let mut verifier = [0u8; VERIFIER_LEN];
    verifier.copy_from_slice(&output[KEY_LEN..]);

    Ok(DerivedKeys { key, verifier })
}

/// [`derive`] on the blocking pool so the runtime keeps serving other tasks.
pub async fn derive_in_background(
    password: &str,
    salt: Vec<u8>,
    params: KdfParams,
) -> Result<DerivedKeys, VaultError> {
    let password = Zeroizing::new(password.to_string());
    tokio::task::spawn_blocking(move || derive(&password, &salt, params))
        .await
        .map_err(|e| VaultError::Crypto(format!("key derivation task failed: {e}")))?
}

/// Encrypt one entry under a fresh random IV, binding its id as associated data.
pub fn encrypt_entry(key: &[u8; KEY_LEN], entry: &VaultEntry) -> Result<EncryptedEnvelope, VaultError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let plaintext = Zeroizing::new(
        serde_json::to_vec(entry).map_err(|e| VaultError::Crypto(format!("encode entry: {e}")))?,
    );
    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext.as_slice(),
                aad: entry.id.as_bytes(),
            },
        )
        .map_err(|e| VaultError::Crypto(format!("encrypt: {e}")))?;

    Ok(EncryptedEnvelope {
        id: entry.id.clone(),
        iv: STANDARD.encode(nonce),
        ciphertext: STANDARD.encode(ciphertext),
    })
}

/// Any failure here (bad base64, wrong key, tampering, bad JSON) is a
/// [`VaultError::Decryption`] for that envelope.
pub fn decrypt_envelope(key: &[u8; KEY_LEN], envelope: &EncryptedEnvelope) -> Result<VaultEntry, VaultError> {
    let failed = || VaultError::Decryption {
        id: envelope.id.clone(),
    };

    let iv = STANDARD.decode(&envelope.iv).map_err(|_| failed())?;
    if iv.len() != IV_LEN {
        return Err(failed());
    }
    let ciphertext = STANDARD.decode(&envelope.ciphertext).map_err(|_| failed())?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: &ciphertext,
                    aad: envelope.id.as_bytes(),
                },
            )
            .map_err(|_| failed())?,
    );

    serde_json::from_slice(&plaintext).map_err(|_| failed())
}

/// Compare without short-circuiting on the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(password: &str) -> DerivedKeys {
        derive(password, b"0123456789abcdef", KdfParams::INSECURE).unwrap()
    }

    #[test]
    fn derivation_is_deterministic_per_salt() {
        let a = keys("correct horse");
        let b = keys("correct horse");
        assert_eq!(*a.key, *b.key);
        assert_eq!(a.verifier, b.verifier);
        assert_ne!(a.key[..], a.verifier[..]);

        let other = derive("correct horse", b"fedcba9876543210", KdfParams::INSECURE).unwrap();
        assert_ne!(other.verifier, a.verifier);
    }

    #[test]
    fn round_trip_preserves_entry() {
        let keys = keys("correct horse");
        let entry = VaultEntry::new("Clip", "https://video.test/1", "keep");
        let envelope = encrypt_entry(&keys.key, &entry).unwrap();

        assert_eq!(envelope.id, entry.id);
        assert!(!envelope.ciphertext.contains("video.test"));
        assert_eq!(decrypt_envelope(&keys.key, &envelope).unwrap(), entry);
    }

    #[test]
    fn every_encryption_uses_a_fresh_iv() {
        let keys = keys("correct horse");
        let entry = VaultEntry::new("Clip", "https://video.test/1", "");
        let a = encrypt_entry(&keys.key, &entry).unwrap();
        let b = encrypt_entry(&keys.key, &entry).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let entry = VaultEntry::new("Clip", "https://video.test/1", "");
        let envelope = encrypt_entry(&keys("correct horse").key, &entry).unwrap();

        let result = decrypt_envelope(&keys("wrong horse").key, &envelope);
        assert!(matches!(result, Err(VaultError::Decryption { .. })));
    }

    #[test]
    fn tampered_id_or_ciphertext_fails() {
        let keys = keys("correct horse");
        let entry = VaultEntry::new("Clip", "https://video.test/1", "");
        let envelope = encrypt_entry(&keys.key, &entry).unwrap();

        let mut moved = envelope.clone();
        moved.id = "someone-else".to_string();
        assert!(decrypt_envelope(&keys.key, &moved).is_err());

        let mut flipped = envelope;
        let mut bytes = STANDARD.decode(&flipped.ciphertext).unwrap();
        bytes[0] ^= 0x01;
        flipped.ciphertext = STANDARD.encode(bytes);
        assert!(decrypt_envelope(&keys.key, &flipped).is_err());
    }

    #[test]
    fn constant_time_eq_compares_content() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
