//! Crypto configuration.
//!
//! The surrounding application owns these settings (usually process
//! environment variables); the core consumes them as an explicit, immutable
//! configuration object built once at startup and validated eagerly, so key
//! mistakes surface as descriptive errors instead of cryptic decrypt
//! failures later.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::constants::ROTATION_BATCH_SIZE;
use crate::core::crypto::{Keyring, MasterKey};
use crate::core::rotation::RotationOptions;
use crate::error::{KeyError, Result};

/// Active master key (required).
pub const MASTER_KEY_VAR: &str = "STASHWAY_MASTER_KEY";
/// Comma-separated previous master keys for rotation fallback.
pub const PREVIOUS_KEYS_VAR: &str = "STASHWAY_PREVIOUS_KEYS";
/// Records per rotation batch.
pub const ROTATION_BATCH_VAR: &str = "STASHWAY_ROTATION_BATCH_SIZE";
/// Set to `1`/`true`/`yes` to make rotation discard writes.
pub const ROTATION_DRY_RUN_VAR: &str = "STASHWAY_ROTATION_DRY_RUN";

/// Validated crypto settings for the process lifetime.
#[derive(Debug, Clone)]
pub struct CryptoConfig {
    pub active_key: String,
    pub previous_keys: Vec<String>,
    pub rotation: RotationOptions,
}

impl CryptoConfig {
    /// A config with only an active key, validated.
    pub fn new(active_key: impl Into<String>) -> Result<Self> {
        let config = Self {
            active_key: active_key.into(),
            previous_keys: Vec::new(),
            rotation: RotationOptions::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the active key is unset or any key is invalid.
    pub fn from_env() -> Result<Self> {
        let vars: BTreeMap<String, String> = std::env::vars().collect();
        Self::from_map(&vars)
    }

    /// Build from an environment-style map (dependency injection for tests
    /// and alternative config sources).
    pub fn from_map(vars: &BTreeMap<String, String>) -> Result<Self> {
        let active_key = vars
            .get(MASTER_KEY_VAR)
            .cloned()
            .ok_or(KeyError::Empty)?;

        let previous_keys: Vec<String> = vars
            .get(PREVIOUS_KEYS_VAR)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // Tuning values fall back to defaults when unparseable
        let batch_size = vars
            .get(ROTATION_BATCH_VAR)
            .and_then(|v| v.parse().ok())
            .unwrap_or(ROTATION_BATCH_SIZE);
        let dry_run = vars
            .get(ROTATION_DRY_RUN_VAR)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self {
            active_key,
            previous_keys,
            rotation: RotationOptions {
                batch_size,
                dry_run,
            },
        };
        config.validate()?;

        debug!(
            previous_keys = config.previous_keys.len(),
            batch_size = config.rotation.batch_size,
            dry_run = config.rotation.dry_run,
            "crypto config loaded"
        );

        Ok(config)
    }

    /// Check every configured key eagerly.
    pub fn validate(&self) -> Result<()> {
        MasterKey::parse(&self.active_key)?;
        for key in &self.previous_keys {
            MasterKey::parse(key)?;
        }
        Ok(())
    }

    /// Build the keyring: active key first, previous keys in configured
    /// order.
    pub fn keyring(&self) -> Result<Keyring> {
        Keyring::new(&self.active_key, &self.previous_keys)
    }
}
