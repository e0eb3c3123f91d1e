//! .env format codec.
//!
//! Parses and serializes dotenv-style files. Parsing is permissive by
//! design: lines without `=` are skipped rather than rejected, matching
//! ecosystem convention for partial files. Serialization quotes and escapes
//! values so that a parse of its own output yields the same key-value pairs.

use std::collections::HashMap;

/// A single parsed entry.
///
/// Entries with an empty `key` are structural: a standalone comment when
/// `comment` is set, otherwise a preserved blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
    /// Comment text attached from the preceding `#` line(s).
    pub comment: Option<String>,
    /// The source line, trimmed at the end only, for round-trip-adjacent UIs.
    pub original_line: Option<String>,
}

impl EnvEntry {
    /// A plain key-value entry.
    pub fn pair(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            comment: None,
            original_line: None,
        }
    }

    /// A key-value entry with an attached comment.
    pub fn with_comment(
        key: impl Into<String>,
        value: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            comment: Some(comment.into()),
            ..Self::pair(key, value)
        }
    }

    /// A standalone comment line.
    pub fn comment_only(comment: impl Into<String>) -> Self {
        Self {
            key: String::new(),
            value: String::new(),
            comment: Some(comment.into()),
            original_line: None,
        }
    }

    /// A preserved blank line.
    pub fn blank() -> Self {
        Self {
            key: String::new(),
            value: String::new(),
            comment: None,
            original_line: None,
        }
    }

    /// Whether this entry carries a key-value pair (vs structural).
    pub fn is_pair(&self) -> bool {
        !self.key.is_empty()
    }
}

/// Options for [`parse`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Attach `#` comment text to the following entry.
    pub preserve_comments: bool,
    /// Keep blank lines as structural entries.
    pub preserve_empty_lines: bool,
}

/// Options for [`serialize`].
#[derive(Debug, Clone, Copy)]
pub struct SerializeOptions {
    /// Emit attached comments as `# text` lines before their entry.
    pub include_comments: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            include_comments: true,
        }
    }
}

/// A parsed .env file: ordered entries plus keyed lookup.
#[derive(Debug, Clone, Default)]
pub struct EnvDocument {
    entries: Vec<EnvEntry>,
    /// Index of the last occurrence of each key (last write wins).
    index: HashMap<String, usize>,
    /// Unique keys in first-occurrence order.
    keys: Vec<String>,
}

impl EnvDocument {
    /// All entries in source order, structural entries included.
    pub fn entries(&self) -> &[EnvEntry] {
        &self.entries
    }

    /// Unique keys in first-occurrence order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Look up the last entry for a key.
    pub fn get(&self, key: &str) -> Option<&EnvEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Look up the last value for a key.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(|e| e.value.as_str())
    }

    /// Key-value pairs as a sorted map (last occurrence wins).
    pub fn to_map(&self) -> std::collections::BTreeMap<String, String> {
        self.keys
            .iter()
            .filter_map(|k| self.value(k).map(|v| (k.clone(), v.to_string())))
            .collect()
    }

    /// Number of key-value entries (structural entries excluded).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Check that a string is usable as an entry key: non-empty, no embedded `=`.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('=')
}

/// Parse .env content.
///
/// Grammar, line by line:
/// - blank line: ends any pending comment association
/// - `# ...`: comment; attaches to the next entry when `preserve_comments`
/// - `KEY=value`: split on the first `=`, key trimmed
/// - anything without `=`: skipped silently
///
/// Values wrapped in double quotes are unescaped; single quotes are literal;
/// unquoted values lose any ` #` inline comment suffix.
pub fn parse(content: &str, options: &ParseOptions) -> EnvDocument {
    let mut doc = EnvDocument::default();
    let mut pending_comment: Option<String> = None;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            pending_comment = None;
            if options.preserve_empty_lines {
                doc.entries.push(EnvEntry::blank());
            }
            continue;
        }

        if let Some(comment) = trimmed.strip_prefix('#') {
            if options.preserve_comments {
                pending_comment = Some(comment.trim().to_string());
            }
            continue;
        }

        let Some((raw_key, raw_value)) = trimmed.split_once('=') else {
            // No '=': not an entry, not an error
            continue;
        };

        let key = raw_key.trim();
        if !is_valid_key(key) {
            continue;
        }

        doc.entries.push(EnvEntry {
            key: key.to_string(),
            value: decode_value(raw_value.trim()),
            comment: pending_comment.take(),
            original_line: Some(line.trim_end().to_string()),
        });

        let i = doc.entries.len() - 1;
        if doc.index.insert(key.to_string(), i).is_none() {
            doc.keys.push(key.to_string());
        }
    }

    doc
}

/// Serialize entries back to .env content.
///
/// Output ends with a newline when any line was produced.
pub fn serialize(entries: &[EnvEntry], options: &SerializeOptions) -> String {
    let mut lines = Vec::new();

    for entry in entries {
        if !entry.is_pair() {
            match &entry.comment {
                Some(comment) => lines.push(format!("# {}", comment)),
                None => lines.push(String::new()),
            }
            continue;
        }

        if options.include_comments {
            if let Some(comment) = &entry.comment {
                lines.push(format!("# {}", comment));
            }
        }
        lines.push(format!("{}={}", entry.key, encode_value(&entry.value)));
    }

    if lines.is_empty() {
        String::new()
    } else {
        lines.join("\n") + "\n"
    }
}

/// Build pair entries from a plain map, sorted by key.
pub fn entries_from_map(map: &std::collections::BTreeMap<String, String>) -> Vec<EnvEntry> {
    map.iter()
        .map(|(k, v)| EnvEntry::pair(k.clone(), v.clone()))
        .collect()
}

fn decode_value(raw: &str) -> String {
    if raw.len() > 1 && raw.starts_with('"') && raw.ends_with('"') {
        // Escapes resolve as independent ordered substitutions; backslash
        // goes last so `\\n` in source first becomes a real newline. Kept
        // for wire compatibility with existing stored files.
        return raw[1..raw.len() - 1]
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\t", "\t")
            .replace("\\\\", "\\");
    }

    if raw.len() > 1 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }

    // Unquoted: strip inline comment introduced by " #"
    match raw.find(" #") {
        Some(i) => raw[..i].trim().to_string(),
        None => raw.to_string(),
    }
}

fn needs_quotes(value: &str) -> bool {
    value.chars().any(|ch| ch.is_whitespace())
        || value.contains('#')
        || value.contains('=')
        || value.contains('"')
        || value.contains('\'')
}

fn encode_value(value: &str) -> String {
    if !needs_quotes(value) {
        return value.to_string();
    }

    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t");

    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_plain(content: &str) -> EnvDocument {
        parse(content, &ParseOptions::default())
    }

    #[test]
    fn test_parse_basic_pairs() {
        let doc = parse_plain("FOO=bar\nBAZ=qux");

        assert_eq!(doc.keys(), &["FOO".to_string(), "BAZ".to_string()]);
        assert_eq!(doc.value("FOO"), Some("bar"));
        assert_eq!(doc.value("BAZ"), Some("qux"));
    }

    #[test]
    fn test_parse_skips_lines_without_equals() {
        let doc = parse_plain("FOO=bar\nthis is not an entry\nBAZ=qux");
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_parse_last_occurrence_wins_in_map() {
        let doc = parse_plain("FOO=first\nFOO=second");

        // Both retained in order, lookup sees the last
        assert_eq!(doc.entries().len(), 2);
        assert_eq!(doc.keys().len(), 1);
        assert_eq!(doc.value("FOO"), Some("second"));
    }

    #[test]
    fn test_parse_double_quoted() {
        let doc = parse_plain("QUOTED=\"hello world\"");
        assert_eq!(doc.value("QUOTED"), Some("hello world"));
    }

    #[test]
    fn test_parse_single_quoted_is_literal() {
        let doc = parse_plain("SINGLE='no $expansion \\n kept'");
        assert_eq!(doc.value("SINGLE"), Some("no $expansion \\n kept"));
    }

    #[test]
    fn test_parse_escapes_in_double_quotes() {
        let doc = parse_plain("ESCAPED=\"say \\\"hello\\\"\"");
        assert_eq!(doc.value("ESCAPED"), Some("say \"hello\""));

        let doc = parse_plain("MULTI=\"line1\\nline2\\tend\"");
        assert_eq!(doc.value("MULTI"), Some("line1\nline2\tend"));
    }

    #[test]
    fn test_parse_unquoted_inline_comment() {
        let doc = parse_plain("HOST=localhost # dev only");
        assert_eq!(doc.value("HOST"), Some("localhost"));

        // '#' without a leading space is part of the value
        let doc = parse_plain("COLOR=#ff0000");
        assert_eq!(doc.value("COLOR"), Some("#ff0000"));
    }

    #[test]
    fn test_parse_comment_attaches_to_next_entry() {
        let options = ParseOptions {
            preserve_comments: true,
            ..Default::default()
        };
        let doc = parse("# database connection\nDB_URL=postgres://\nPORT=5432", &options);

        assert_eq!(
            doc.get("DB_URL").unwrap().comment.as_deref(),
            Some("database connection")
        );
        assert_eq!(doc.get("PORT").unwrap().comment, None);
    }

    #[test]
    fn test_parse_blank_line_resets_comment() {
        let options = ParseOptions {
            preserve_comments: true,
            ..Default::default()
        };
        let doc = parse("# orphaned\n\nKEY=value", &options);
        assert_eq!(doc.get("KEY").unwrap().comment, None);
    }

    #[test]
    fn test_parse_preserves_empty_lines_when_asked() {
        let options = ParseOptions {
            preserve_empty_lines: true,
            ..Default::default()
        };
        let doc = parse("A=1\n\nB=2", &options);

        assert_eq!(doc.entries().len(), 3);
        assert!(!doc.entries()[1].is_pair());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_parse_original_line_trims_end_only() {
        let doc = parse_plain("  KEY=value  ");
        assert_eq!(
            doc.get("KEY").unwrap().original_line.as_deref(),
            Some("  KEY=value")
        );
    }

    #[test]
    fn test_parse_empty_value() {
        let doc = parse_plain("EMPTY=");
        assert_eq!(doc.value("EMPTY"), Some(""));
    }

    #[test]
    fn test_serialize_plain_and_quoted() {
        let entries = vec![
            EnvEntry::pair("SIMPLE", "value"),
            EnvEntry::pair("SPACED", "value with spaces"),
            EnvEntry::pair("HASHED", "a#b"),
        ];
        let out = serialize(&entries, &SerializeOptions::default());

        assert_eq!(
            out,
            "SIMPLE=value\nSPACED=\"value with spaces\"\nHASHED=\"a#b\"\n"
        );
    }

    #[test]
    fn test_serialize_escapes_special_chars() {
        let entries = vec![EnvEntry::pair("SPECIAL", "line1\nsay \"hi\" \\ tail")];
        let out = serialize(&entries, &SerializeOptions::default());
        assert_eq!(out, "SPECIAL=\"line1\\nsay \\\"hi\\\" \\\\ tail\"\n");
    }

    #[test]
    fn test_serialize_comments_and_blanks() {
        let entries = vec![
            EnvEntry::comment_only("section one"),
            EnvEntry::with_comment("KEY", "value", "inline note"),
            EnvEntry::blank(),
            EnvEntry::pair("OTHER", "x"),
        ];
        let out = serialize(&entries, &SerializeOptions::default());
        assert_eq!(
            out,
            "# section one\n# inline note\nKEY=value\n\nOTHER=x\n"
        );
    }

    #[test]
    fn test_serialize_can_drop_comments() {
        let entries = vec![EnvEntry::with_comment("KEY", "value", "note")];
        let out = serialize(
            &entries,
            &SerializeOptions {
                include_comments: false,
            },
        );
        assert_eq!(out, "KEY=value\n");
    }

    #[test]
    fn test_serialize_empty_input() {
        assert_eq!(serialize(&[], &SerializeOptions::default()), "");
    }

    #[test]
    fn test_roundtrip_map_equivalence() {
        let entries = vec![
            EnvEntry::pair("A", "plain"),
            EnvEntry::pair("B", "with space"),
            EnvEntry::pair("C", "quote\"inside"),
            EnvEntry::pair("D", "tab\there"),
            EnvEntry::pair("E", ""),
        ];
        let out = serialize(&entries, &SerializeOptions::default());
        let doc = parse_plain(&out);

        for entry in &entries {
            assert_eq!(doc.value(&entry.key), Some(entry.value.as_str()), "{}", entry.key);
        }
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("DATABASE_URL"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("A=B"));
    }
}
