//! Stashway - encryption-at-rest core for a self-hosted secrets manager.
//!
//! Projects hold named environments (local/staging/prod), each a set of
//! key-value variables encrypted at rest. This crate is the algorithmic core
//! consumed by the route and storage layers: it never talks to the network or
//! the database itself.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── error             # Error hierarchy (crypto, key, schema, rotation)
//! └── core/             # Core library components
//!     ├── constants     # Blob geometry, KDF parameters, defaults
//!     ├── crypto/       # AES-256-GCM engine + master key handling
//!     │   ├── mod       # encrypt/decrypt, blob framing, Keyring fallback
//!     │   └── key       # MasterKey classification and generation
//!     ├── rotation      # Bulk re-encryption under a new master key
//!     ├── env           # .env codec (quoting, escaping, comments)
//!     ├── detect        # Secret name classifier and value masking
//!     ├── schema        # Schema parsing and variable validation
//!     ├── diff          # Environment diff engine with secret masking
//!     └── config        # Crypto configuration (active + previous keys)
//! ```
//!
//! # Features
//!
//! - AES-256-GCM authenticated encryption with self-describing blobs
//! - Direct (hex/base64) or passphrase-derived (scrypt) master keys
//! - Online key rotation with multi-key decryption fallback
//! - Permissive .env parsing and stable serialization
//! - Schema validation and secret-aware environment diffs

pub mod core;
pub mod error;

pub use error::{Error, Result};
