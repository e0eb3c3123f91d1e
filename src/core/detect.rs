//! Secret detection and value masking.
//!
//! Flags variable names that likely hold sensitive values and masks values
//! for display. Both functions are pure and total over any string input;
//! callers across diff output, audit logging, and UI share the same rules
//! and only vary the mask glyph and visible count.

use crate::core::constants::MASK_VISIBLE;

/// Name fragments that mark a variable as likely secret.
///
/// Matched case-insensitively as substrings. `key` already covers the
/// `api_key`/`apikey` spellings; they stay listed for clarity.
const SECRET_TOKENS: &[&str] = &[
    "secret",
    "password",
    "token",
    "key",
    "api_key",
    "api-key",
    "apikey",
    "auth",
    "credential",
    "private",
    "passphrase",
    "seed",
    "mnemonic",
];

/// Whether a variable name looks like it holds a secret.
///
/// Heuristic only: `PORT` is not a secret, `API_SECRET` is. False negatives
/// are handled by the explicit secret-key lists callers can pass alongside.
pub fn is_secret_key(name: &str) -> bool {
    let lower = name.to_lowercase();
    SECRET_TOKENS.iter().any(|token| lower.contains(token))
}

/// Mask a value with `*`, keeping `visible` characters at each end.
pub fn mask_value(value: &str, visible: usize) -> String {
    mask_value_with(value, visible, '*')
}

/// Mask a value with an arbitrary glyph.
///
/// Values short enough that head + tail would reveal everything are masked
/// in full, preserving only their length.
pub fn mask_value_with(value: &str, visible: usize, glyph: char) -> String {
    let chars: Vec<char> = value.chars().collect();

    if chars.len() <= visible * 2 {
        return std::iter::repeat(glyph).take(chars.len()).collect();
    }

    let head: String = chars[..visible].iter().collect();
    let tail: String = chars[chars.len() - visible..].iter().collect();
    let middle: String = std::iter::repeat(glyph)
        .take(chars.len() - visible * 2)
        .collect();

    format!("{}{}{}", head, middle, tail)
}

/// Mask with the default visible count.
pub fn mask(value: &str) -> String {
    mask_value(value, MASK_VISIBLE)
}
