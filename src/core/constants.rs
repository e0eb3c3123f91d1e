//! Constants used throughout stashway.
//!
//! Centralizes blob geometry, KDF parameters, and tuning defaults.

/// Symmetric key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Salt length in bytes, prepended to passphrase-derived blobs.
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Minimum passphrase length in characters.
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// scrypt cost parameter, log2(N). N = 2^14, tuned for interactive use.
pub const SCRYPT_LOG_N: u8 = 14;

/// scrypt block size parameter.
pub const SCRYPT_R: u32 = 8;

/// scrypt parallelization parameter.
pub const SCRYPT_P: u32 = 1;

/// Default record batch size for key rotation.
pub const ROTATION_BATCH_SIZE: usize = 200;

/// Default visible characters at each end of a masked value.
pub const MASK_VISIBLE: usize = 4;

/// Visible characters used when masking secrets in diff output.
pub const DIFF_MASK_VISIBLE: usize = 3;

/// Mask glyph used in diff output.
pub const DIFF_MASK_GLYPH: char = '•';
