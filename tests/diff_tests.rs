//! Tests for the environment diff engine.

use std::collections::BTreeMap;

use stashway::core::diff::{self, ChangeKind, DiffFormat, DiffOptions};

fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_staging_vs_production_scenario() {
    let staging = env(&[
        ("NODE_ENV", "staging"),
        ("DATABASE_URL", "postgres://staging-db/app"),
        ("API_SECRET", "staging-secret-value"),
        ("FEATURE_FLAG", "on"),
    ]);
    let production = env(&[
        ("NODE_ENV", "production"),
        ("DATABASE_URL", "postgres://prod-db/app"),
        ("API_SECRET", "production-secret-value"),
        ("SENTRY_DSN", "https://sentry.example.com/1"),
    ]);

    let result = diff::diff_envs(&staging, &production, &DiffOptions::default());

    assert!(result.has_changes);
    assert_eq!(result.added, 1);
    assert_eq!(result.removed, 1);
    assert_eq!(result.changed, 3);
    assert_eq!(result.unchanged, 0);

    // The secret's values are masked in both directions
    let secret = result
        .entries
        .iter()
        .find(|e| e.key == "API_SECRET")
        .unwrap();
    assert!(secret.is_secret);
    assert!(!secret
        .source_value
        .as_deref()
        .unwrap()
        .contains("staging-secret"));
    assert!(!secret
        .target_value
        .as_deref()
        .unwrap()
        .contains("production-secret"));

    // Non-secrets stay readable
    let node_env = result.entries.iter().find(|e| e.key == "NODE_ENV").unwrap();
    assert_eq!(node_env.source_value.as_deref(), Some("staging"));
    assert_eq!(node_env.target_value.as_deref(), Some("production"));
}

#[test]
fn test_text_output_shape() {
    let result = diff::diff_envs(
        &env(&[("OLD_HOST", "gone"), ("PORT", "3000")]),
        &env(&[("PORT", "8080"), ("NEW_FLAG", "fresh")]),
        &DiffOptions::default(),
    );

    let text = diff::format_diff(&result, DiffFormat::Text);
    let expected = "\
Added (1):
  + NEW_FLAG=fresh

Removed (1):
  - OLD_HOST=gone

Changed (1):
  ~ PORT
      3000
      8080
";
    assert_eq!(text, expected);
}

#[test]
fn test_no_differences_text() {
    let same = env(&[("A", "1")]);
    let result = diff::diff_envs(&same, &same, &DiffOptions::default());

    assert_eq!(
        diff::format_diff(&result, DiffFormat::Text),
        "No differences found."
    );
    assert_eq!(diff::diff_summary(&result), "No changes");
}

#[test]
fn test_json_output_is_camel_case() {
    let result = diff::diff_envs(
        &env(&[]),
        &env(&[("DB_PASSWORD", "hunter2hunter2")]),
        &DiffOptions::default(),
    );

    let json = diff::format_diff(&result, DiffFormat::Json);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["hasChanges"], true);
    assert_eq!(value["added"], 1);
    let entry = &value["entries"][0];
    assert_eq!(entry["key"], "DB_PASSWORD");
    assert_eq!(entry["type"], "added");
    assert_eq!(entry["isSecret"], true);
    // Masked before serialization: plaintext never reaches the output
    assert!(!json.contains("hunter2hunter2"));
    // Absent source value is omitted, not null
    assert!(entry.get("sourceValue").is_none());
}

#[test]
fn test_summary_counts() {
    let result = diff::diff_envs(
        &env(&[("A", "1"), ("B", "2")]),
        &env(&[("A", "other"), ("C", "3")]),
        &DiffOptions::default(),
    );

    assert_eq!(diff::diff_summary(&result), "1 added, 1 removed, 1 changed");
}

#[test]
fn test_unchanged_entries_hidden_unless_requested() {
    let source = env(&[("SAME", "value"), ("DIFF", "a")]);
    let target = env(&[("SAME", "value"), ("DIFF", "b")]);

    let hidden = diff::diff_envs(&source, &target, &DiffOptions::default());
    assert_eq!(hidden.entries.len(), 1);
    assert_eq!(hidden.unchanged, 1);

    let shown = diff::diff_envs(
        &source,
        &target,
        &DiffOptions {
            include_unchanged: true,
            ..Default::default()
        },
    );
    assert_eq!(shown.entries.len(), 2);
    assert!(shown
        .entries
        .iter()
        .any(|e| e.kind == ChangeKind::Unchanged));
}
