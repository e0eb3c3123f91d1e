//! Error types for the stashway core.
//!
//! Errors are grouped per domain and wrapped by a single top-level [`Error`],
//! so callers can match broadly (`Error::Crypto(_)`) or precisely
//! (`Error::Crypto(CryptoError::DecryptionFailed(_))`).

use thiserror::Error;

/// Cryptographic failures.
///
/// A decryption failure is always fatal to the call that raised it; the
/// multi-key fallback loop lives in `Keyring`, not here.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("key derivation failed: {0}")]
    KdfFailed(String),
}

/// Master key validation failures.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("master key must not be empty")]
    Empty,

    #[error("passphrase too short: {0} characters (minimum is 8)")]
    PassphraseTooShort(usize),

    #[error("invalid master key: {0}")]
    Invalid(String),
}

/// Schema definition failures.
///
/// Validation findings (`missing`, `invalid_type`, ...) are data, not errors;
/// see `ValidationReport`.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid schema JSON: {0}")]
    Format(String),
}

/// Key rotation failures.
#[derive(Error, Debug)]
pub enum RotationError {
    #[error("rotation aborted at {table}#{id}: {source}")]
    Record {
        table: String,
        id: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

/// Top-level error type for all core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Rotation(#[from] RotationError),
}

pub type Result<T> = std::result::Result<T, Error>;
