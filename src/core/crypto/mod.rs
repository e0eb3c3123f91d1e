//! Authenticated encryption engine.
//!
//! Values are encrypted with AES-256-GCM under a master key that is either
//! raw key material (hex/base64) or scrypt-derived from a passphrase. Each
//! blob is self-contained and portable:
//!
//! ```text
//! base64( [salt(16) if passphrase-derived] || nonce(12) || tag(16) || ciphertext )
//! ```
//!
//! The salt's presence is not flagged in the blob; the decrypting side infers
//! it from the shape of the supplied master key, using the same classification
//! rules as encryption. Rotating from a passphrase to a direct key (or back)
//! therefore changes how old blobs are sliced; rotated-in keys must keep the
//! shape the blob was written under, or rotation must re-encrypt first.
//!
//! Decryption never returns partial output: any authentication or framing
//! failure is fatal to the call.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::trace;

use crate::core::constants::{NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::error::{CryptoError, Result};

mod key;

pub use key::{KeyValidity, MasterKey};

/// Generate a fresh random master key as 64 lowercase hex characters.
pub fn generate_master_key() -> String {
    MasterKey::generate()
}

/// Validate a candidate master key string.
///
/// Accepts 64 hex characters, base64 decoding to exactly 32 bytes, or any
/// passphrase of at least 8 characters. Returns a validity value (not an
/// error) so startup code can surface the reason directly.
pub fn validate_master_key(candidate: &str) -> KeyValidity {
    MasterKey::validate(candidate)
}

/// Encrypt plaintext under a master key string.
///
/// Never fails for any plaintext, empty string and arbitrary Unicode
/// included. Two calls with identical arguments produce different blobs
/// (random nonce, and random salt for passphrase keys).
///
/// # Errors
///
/// Returns `KeyError` if the master key itself is invalid.
pub fn encrypt(plaintext: &str, master_key: &str) -> Result<String> {
    encrypt_with(plaintext, &MasterKey::parse(master_key)?)
}

/// Decrypt a blob under a master key string.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` if the blob is not valid base64,
/// is shorter than the minimum viable length, or fails authentication
/// (wrong key, tampering, truncation).
pub fn decrypt(blob: &str, master_key: &str) -> Result<String> {
    decrypt_with(blob, &MasterKey::parse(master_key)?)
}

/// Encrypt plaintext under an already-classified master key.
pub fn encrypt_with(plaintext: &str, key: &MasterKey) -> Result<String> {
    let salt = match key {
        MasterKey::Passphrase(_) => {
            let mut salt = vec![0u8; SALT_LEN];
            OsRng.fill_bytes(&mut salt);
            salt
        }
        MasterKey::Direct(_) => Vec::new(),
    };

    let material = key.material(&salt)?;
    let cipher = Aes256Gcm::new_from_slice(material.as_slice())
        .map_err(|e| CryptoError::EncryptionFailed(format!("{}", e)))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    // aes-gcm appends the tag; the wire format puts it before the ciphertext
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CryptoError::EncryptionFailed("AEAD seal failed".to_string()))?;
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

    let mut blob = Vec::with_capacity(salt.len() + NONCE_LEN + TAG_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(tag);
    blob.extend_from_slice(ciphertext);

    Ok(BASE64.encode(blob))
}

/// Decrypt a blob under an already-classified master key.
pub fn decrypt_with(blob: &str, key: &MasterKey) -> Result<String> {
    let raw = BASE64
        .decode(blob)
        .map_err(|_| CryptoError::DecryptionFailed("not valid base64".to_string()))?;

    let salt_len = key.salt_len();
    let min_len = salt_len + NONCE_LEN + TAG_LEN;
    if raw.len() < min_len {
        return Err(CryptoError::DecryptionFailed(format!(
            "blob too short: {} bytes (minimum {})",
            raw.len(),
            min_len
        ))
        .into());
    }

    let (salt, rest) = raw.split_at(salt_len);
    let (nonce, rest) = rest.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let material = key.material(salt)?;
    let cipher = Aes256Gcm::new_from_slice(material.as_slice())
        .map_err(|e| CryptoError::DecryptionFailed(format!("{}", e)))?;

    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), sealed.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed("authentication failed".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::DecryptionFailed(format!("UTF-8 error: {}", e)).into())
}

/// Heuristic: does this storage value look like an encrypted blob?
///
/// True if the string is valid base64 decoding to at least nonce + tag + one
/// byte. Used to tell already-encrypted values from legacy plaintext during
/// migrations. Low-probability false positives are acceptable.
pub fn is_encrypted(value: &str) -> bool {
    match BASE64.decode(value) {
        Ok(raw) => raw.len() > NONCE_LEN + TAG_LEN,
        Err(_) => false,
    }
}

/// Ordered key set for online rotation: one active key, zero or more
/// previous keys.
///
/// Encryption always uses the active key only. Decryption tries the active
/// key first, then each previous key in configured order, so old ciphertexts
/// stay readable while a rotation is in flight.
#[derive(Debug, Clone)]
pub struct Keyring {
    active: MasterKey,
    previous: Vec<MasterKey>,
}

impl Keyring {
    /// Build a keyring from raw key strings, validating all of them eagerly.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the active key or any previous key is invalid.
    pub fn new(active: &str, previous: &[String]) -> Result<Self> {
        let active = MasterKey::parse(active)?;
        let previous = previous
            .iter()
            .map(|raw| MasterKey::parse(raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { active, previous })
    }

    /// A keyring with no previous keys.
    pub fn single(active: &str) -> Result<Self> {
        Self::new(active, &[])
    }

    /// The active master key.
    pub fn active(&self) -> &MasterKey {
        &self.active
    }

    /// Total number of candidate keys (active + previous).
    pub fn key_count(&self) -> usize {
        1 + self.previous.len()
    }

    /// Encrypt under the active key only.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        encrypt_with(plaintext, &self.active)
    }

    /// Decrypt, falling back through previous keys in order.
    ///
    /// Returns the first successful plaintext; if every candidate fails,
    /// the last error encountered is returned.
    pub fn decrypt(&self, blob: &str) -> Result<String> {
        let mut last_err = None;

        for (i, key) in std::iter::once(&self.active)
            .chain(self.previous.iter())
            .enumerate()
        {
            match decrypt_with(blob, key) {
                Ok(plaintext) => {
                    if i > 0 {
                        trace!(candidate = i, "decrypted with previous key");
                    }
                    return Ok(plaintext);
                }
                Err(e) => last_err = Some(e),
            }
        }

        // key_count() >= 1, so at least one attempt ran
        Err(last_err.expect("keyring has at least one key"))
    }
}
