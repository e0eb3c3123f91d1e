//! Master key classification, validation, and generation.
//!
//! A master key string is either a *direct key* (64 hex characters, or base64
//! decoding to exactly 32 bytes, used as raw key material) or a *passphrase*
//! (any other string of at least 8 characters, stretched via scrypt with a
//! random per-encryption salt). The ciphertext blob carries no explicit flag;
//! classification is replayed at decrypt time from the supplied key alone, so
//! the same rules here apply symmetrically to both directions.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::core::constants::{
    KEY_LEN, MIN_PASSPHRASE_LEN, SCRYPT_LOG_N, SCRYPT_P, SCRYPT_R,
};
use crate::error::{CryptoError, KeyError, Result};

/// A classified master key.
#[derive(Clone)]
pub enum MasterKey {
    /// Raw 256-bit key material supplied as hex or base64.
    Direct(Zeroizing<[u8; KEY_LEN]>),
    /// Arbitrary passphrase, stretched via scrypt per encryption call.
    Passphrase(Zeroizing<String>),
}

/// Result of validating a candidate master key.
///
/// Returned as a value rather than an error so configuration code can fail
/// fast at startup with a descriptive reason.
#[derive(Debug, Clone)]
pub struct KeyValidity {
    pub valid: bool,
    pub error: Option<String>,
}

impl MasterKey {
    /// Classify a raw master key string.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Empty` for empty input and
    /// `KeyError::PassphraseTooShort` for non-direct keys under 8 characters.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(KeyError::Empty.into());
        }

        // 64 hex characters decode to exactly 32 bytes
        if raw.len() == KEY_LEN * 2 && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            let bytes = hex::decode(raw)
                .map_err(|e| KeyError::Invalid(format!("hex decode: {}", e)))?;
            return Ok(Self::Direct(copy_key(&bytes)));
        }

        // Base64 decoding to exactly 32 bytes is also direct key material
        if let Ok(bytes) = BASE64.decode(raw) {
            if bytes.len() == KEY_LEN {
                return Ok(Self::Direct(copy_key(&bytes)));
            }
        }

        let chars = raw.chars().count();
        if chars < MIN_PASSPHRASE_LEN {
            return Err(KeyError::PassphraseTooShort(chars).into());
        }

        Ok(Self::Passphrase(Zeroizing::new(raw.to_string())))
    }

    /// Validate a candidate master key without keeping it.
    pub fn validate(candidate: &str) -> KeyValidity {
        match Self::parse(candidate) {
            Ok(_) => KeyValidity {
                valid: true,
                error: None,
            },
            Err(e) => KeyValidity {
                valid: false,
                error: Some(e.to_string()),
            },
        }
    }

    /// Generate a fresh random master key as 64 lowercase hex characters.
    pub fn generate() -> String {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Whether this key is raw key material (no salt in the blob).
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }

    /// Number of salt bytes this key expects at the front of a blob.
    pub(crate) fn salt_len(&self) -> usize {
        match self {
            Self::Direct(_) => 0,
            Self::Passphrase(_) => crate::core::constants::SALT_LEN,
        }
    }

    /// Resolve the 256-bit key material for a given salt.
    ///
    /// Direct keys ignore the salt; passphrases are stretched with scrypt.
    pub(crate) fn material(&self, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        match self {
            Self::Direct(key) => Ok(key.clone()),
            Self::Passphrase(passphrase) => derive_key(passphrase, salt),
        }
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        match self {
            Self::Direct(_) => f.write_str("MasterKey::Direct(..)"),
            Self::Passphrase(_) => f.write_str("MasterKey::Passphrase(..)"),
        }
    }
}

fn copy_key(bytes: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(bytes);
    key
}

/// Stretch a passphrase into 256-bit key material.
///
/// scrypt with N=2^14, r=8, p=1: memory-hard, tuned for interactive use.
/// Each call is a bounded but non-negligible synchronous cost.
fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|e| CryptoError::KdfFailed(format!("{}", e)))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(passphrase.as_bytes(), salt, &params, key.as_mut_slice())
        .map_err(|e| CryptoError::KdfFailed(format!("{}", e)))?;

    Ok(key)
}
