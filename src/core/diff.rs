//! Environment diff engine.
//!
//! Compares two plaintext variable maps and classifies every key as added,
//! removed, changed, or unchanged. Secret values are masked before they are
//! attached to the result, so a default diff can be logged or shown without
//! leaking plaintext; callers that need real values opt out explicitly.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::core::constants::{DIFF_MASK_GLYPH, DIFF_MASK_VISIBLE};
use crate::core::detect;

/// How a key differs between source and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
    Unchanged,
}

/// A single classified key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<String>,
    pub is_secret: bool,
}

/// The full comparison between two environments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    /// Classified entries sorted by key. Unchanged entries are excluded
    /// unless requested.
    pub entries: Vec<DiffEntry>,
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub has_changes: bool,
}

/// Options for [`diff_envs`].
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Mask secret values before attaching them (irreversible at this layer).
    pub mask_secrets: bool,
    /// Keys treated as secret in addition to the classifier's matches.
    pub secret_keys: Vec<String>,
    /// Include unchanged entries in the result.
    pub include_unchanged: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            mask_secrets: true,
            secret_keys: Vec::new(),
            include_unchanged: false,
        }
    }
}

/// Output format for [`format_diff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffFormat {
    Text,
    Json,
}

/// Compare two plaintext variable maps.
pub fn diff_envs(
    source: &BTreeMap<String, String>,
    target: &BTreeMap<String, String>,
    options: &DiffOptions,
) -> DiffResult {
    let explicit: HashSet<&str> = options.secret_keys.iter().map(String::as_str).collect();

    // BTreeMap keys are sorted, so the merged union is too
    let all_keys: Vec<&String> = {
        let mut keys: Vec<&String> = source.keys().chain(target.keys()).collect();
        keys.sort();
        keys.dedup();
        keys
    };

    let mut entries = Vec::new();
    let (mut added, mut removed, mut changed, mut unchanged) = (0, 0, 0, 0);

    for key in all_keys {
        let source_value = source.get(key);
        let target_value = target.get(key);

        let kind = match (source_value, target_value) {
            (None, Some(_)) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            (Some(s), Some(t)) if s != t => ChangeKind::Changed,
            (Some(_), Some(_)) => ChangeKind::Unchanged,
            (None, None) => unreachable!("key came from one of the maps"),
        };

        match kind {
            ChangeKind::Added => added += 1,
            ChangeKind::Removed => removed += 1,
            ChangeKind::Changed => changed += 1,
            ChangeKind::Unchanged => unchanged += 1,
        }

        if kind == ChangeKind::Unchanged && !options.include_unchanged {
            continue;
        }

        let is_secret = explicit.contains(key.as_str()) || detect::is_secret_key(key);
        let render = |v: &String| {
            if is_secret && options.mask_secrets {
                detect::mask_value_with(v, DIFF_MASK_VISIBLE, DIFF_MASK_GLYPH)
            } else {
                v.clone()
            }
        };

        entries.push(DiffEntry {
            key: key.clone(),
            kind,
            source_value: source_value.map(render),
            target_value: target_value.map(render),
            is_secret,
        });
    }

    DiffResult {
        entries,
        added,
        removed,
        changed,
        unchanged,
        has_changes: added + removed + changed > 0,
    }
}

/// Render a diff result as grouped text or pretty JSON.
pub fn format_diff(result: &DiffResult, format: DiffFormat) -> String {
    match format {
        DiffFormat::Json => {
            serde_json::to_string_pretty(result).expect("diff result serializes")
        }
        DiffFormat::Text => format_text(result),
    }
}

fn format_text(result: &DiffResult) -> String {
    if !result.has_changes {
        return "No differences found.".to_string();
    }

    let mut out = String::new();

    let section = |out: &mut String, title: &str, count: usize| {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("{} ({}):\n", title, count));
    };

    if result.added > 0 {
        section(&mut out, "Added", result.added);
        for entry in entries_of(result, ChangeKind::Added) {
            out.push_str(&format!(
                "  + {}={}\n",
                entry.key,
                entry.target_value.as_deref().unwrap_or("")
            ));
        }
    }

    if result.removed > 0 {
        section(&mut out, "Removed", result.removed);
        for entry in entries_of(result, ChangeKind::Removed) {
            out.push_str(&format!(
                "  - {}={}\n",
                entry.key,
                entry.source_value.as_deref().unwrap_or("")
            ));
        }
    }

    if result.changed > 0 {
        section(&mut out, "Changed", result.changed);
        for entry in entries_of(result, ChangeKind::Changed) {
            out.push_str(&format!("  ~ {}\n", entry.key));
            out.push_str(&format!(
                "      {}\n",
                entry.source_value.as_deref().unwrap_or("")
            ));
            out.push_str(&format!(
                "      {}\n",
                entry.target_value.as_deref().unwrap_or("")
            ));
        }
    }

    out
}

fn entries_of(result: &DiffResult, kind: ChangeKind) -> impl Iterator<Item = &DiffEntry> {
    result.entries.iter().filter(move |e| e.kind == kind)
}

/// One-line summary: `"1 added, 2 changed"`, or `"No changes"`.
pub fn diff_summary(result: &DiffResult) -> String {
    let mut parts = Vec::new();

    if result.added > 0 {
        parts.push(format!("{} added", result.added));
    }
    if result.removed > 0 {
        parts.push(format!("{} removed", result.removed));
    }
    if result.changed > 0 {
        parts.push(format!("{} changed", result.changed));
    }

    if parts.is_empty() {
        "No changes".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn diff_plain(
        source: &[(&str, &str)],
        target: &[(&str, &str)],
    ) -> DiffResult {
        diff_envs(&env(source), &env(target), &DiffOptions::default())
    }

    #[test]
    fn test_added_key() {
        let result = diff_plain(&[("A", "1")], &[("A", "1"), ("B", "2")]);

        assert!(result.has_changes);
        assert_eq!(result.added, 1);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].key, "B");
        assert_eq!(result.entries[0].kind, ChangeKind::Added);
        assert_eq!(result.entries[0].target_value.as_deref(), Some("2"));
        assert_eq!(result.entries[0].source_value, None);
    }

    #[test]
    fn test_removed_and_changed_keys() {
        let result = diff_plain(&[("GONE", "x"), ("EDIT", "old")], &[("EDIT", "new")]);

        assert_eq!(result.removed, 1);
        assert_eq!(result.changed, 1);

        let edit = result.entries.iter().find(|e| e.key == "EDIT").unwrap();
        assert_eq!(edit.kind, ChangeKind::Changed);
        assert_eq!(edit.source_value.as_deref(), Some("old"));
        assert_eq!(edit.target_value.as_deref(), Some("new"));
    }

    #[test]
    fn test_identical_envs_have_no_changes() {
        let result = diff_plain(&[("A", "1")], &[("A", "1")]);

        assert!(!result.has_changes);
        assert!(result.entries.is_empty());
        assert_eq!(result.unchanged, 1);
    }

    #[test]
    fn test_include_unchanged() {
        let result = diff_envs(
            &env(&[("A", "1")]),
            &env(&[("A", "1")]),
            &DiffOptions {
                include_unchanged: true,
                ..Default::default()
            },
        );

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].kind, ChangeKind::Unchanged);
    }

    #[test]
    fn test_entries_sorted_by_key() {
        let result = diff_plain(&[], &[("ZEBRA", "1"), ("APPLE", "2"), ("MANGO", "3")]);
        let keys: Vec<_> = result.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["APPLE", "MANGO", "ZEBRA"]);
    }

    #[test]
    fn test_secret_values_masked_by_default() {
        let result = diff_plain(&[], &[("API_SECRET", "supersecret")]);

        let entry = &result.entries[0];
        assert!(entry.is_secret);
        assert_eq!(entry.target_value.as_deref(), Some("sup•••••ret"));
    }

    #[test]
    fn test_explicit_secret_keys_masked() {
        let result = diff_envs(
            &env(&[]),
            &env(&[("INNOCUOUS_NAME", "longhiddenvalue")]),
            &DiffOptions {
                secret_keys: vec!["INNOCUOUS_NAME".to_string()],
                ..Default::default()
            },
        );

        let entry = &result.entries[0];
        assert!(entry.is_secret);
        assert_ne!(entry.target_value.as_deref(), Some("longhiddenvalue"));
    }

    #[test]
    fn test_mask_opt_out() {
        let result = diff_envs(
            &env(&[]),
            &env(&[("API_SECRET", "supersecret")]),
            &DiffOptions {
                mask_secrets: false,
                ..Default::default()
            },
        );

        let entry = &result.entries[0];
        assert!(entry.is_secret);
        assert_eq!(entry.target_value.as_deref(), Some("supersecret"));
    }

    #[test]
    fn test_format_text_groups() {
        let result = diff_plain(
            &[("GONE", "x"), ("EDIT", "old")],
            &[("EDIT", "new"), ("FRESH", "y")],
        );
        let text = format_diff(&result, DiffFormat::Text);

        assert!(text.contains("Added (1):"));
        assert!(text.contains("  + FRESH=y"));
        assert!(text.contains("Removed (1):"));
        assert!(text.contains("  - GONE=x"));
        assert!(text.contains("Changed (1):"));
        assert!(text.contains("  ~ EDIT"));
        assert!(text.contains("      old"));
        assert!(text.contains("      new"));
    }

    #[test]
    fn test_format_text_no_differences() {
        let result = diff_plain(&[("A", "1")], &[("A", "1")]);
        assert_eq!(format_diff(&result, DiffFormat::Text), "No differences found.");
    }

    #[test]
    fn test_format_json() {
        let result = diff_plain(&[], &[("B", "2")]);
        let json = format_diff(&result, DiffFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["hasChanges"], true);
        assert_eq!(parsed["entries"][0]["key"], "B");
        assert_eq!(parsed["entries"][0]["type"], "added");
        assert_eq!(parsed["entries"][0]["isSecret"], false);
    }

    #[test]
    fn test_summary() {
        let result = diff_plain(
            &[("GONE", "x"), ("EDIT", "old")],
            &[("EDIT", "new"), ("FRESH", "y")],
        );
        assert_eq!(diff_summary(&result), "1 added, 1 removed, 1 changed");

        let clean = diff_plain(&[("A", "1")], &[("A", "1")]);
        assert_eq!(diff_summary(&clean), "No changes");
    }
}
