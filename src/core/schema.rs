//! Environment schema parsing and validation.
//!
//! Schemas come from two sources: a JSON document (either a top-level
//! `fields` object or a flat format) or a `.env.example`-style file where a
//! bare `KEY` line means required. Validation findings are data, not errors;
//! the caller decides how to react to a failing report.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SchemaError};

/// Field value types a schema can demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Url,
    Email,
}

/// Rules for a single variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaField {
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    pub required: bool,
    pub default: Option<String>,
    /// Pattern the value must match. Malformed patterns are skipped silently
    /// at validation time rather than rejected at upload time.
    pub regex: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub description: Option<String>,
    pub secret: bool,
}

/// An ordered set of field rules keyed by variable name.
///
/// Definition order is preserved so generated `.env.example` output is
/// stable.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, SchemaField)>,
}

impl Schema {
    /// Fields in definition order.
    pub fn fields(&self) -> &[(String, SchemaField)] {
        &self.fields
    }

    /// Look up a field by variable name.
    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    /// Add or replace a field definition.
    pub fn insert(&mut self, name: impl Into<String>, field: SchemaField) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = field,
            None => self.fields.push((name, field)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse a `.env.example`-style schema.
///
/// A bare `KEY` line becomes `{required: true}`; `KEY=value` becomes an
/// optional field whose default is the value (no default when empty).
/// Comments and blank lines are ignored.
pub fn parse_env_example(content: &str) -> Schema {
    let mut schema = Schema::default();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match trimmed.split_once('=') {
            None => {
                schema.insert(
                    trimmed,
                    SchemaField {
                        required: true,
                        ..Default::default()
                    },
                );
            }
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                let value = value.trim();
                schema.insert(
                    key,
                    SchemaField {
                        required: false,
                        default: (!value.is_empty()).then(|| value.to_string()),
                        ..Default::default()
                    },
                );
            }
        }
    }

    schema
}

/// Parse a JSON schema document.
///
/// A top-level `fields` object is used as-is; otherwise every top-level key
/// except `$schema` and `version` is treated as a field definition (flat
/// format).
///
/// # Errors
///
/// Returns `SchemaError::Format` for structurally invalid JSON or field
/// definitions.
pub fn parse_schema_json(content: &str) -> Result<Schema> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| SchemaError::Format(format!("{}", e)))?;

    let root = value
        .as_object()
        .ok_or_else(|| SchemaError::Format("top level must be an object".to_string()))?;

    let (defs, flat) = match root.get("fields") {
        Some(fields) => {
            let obj = fields.as_object().ok_or_else(|| {
                SchemaError::Format("`fields` must be an object".to_string())
            })?;
            (obj, false)
        }
        None => (root, true),
    };

    let mut schema = Schema::default();
    for (name, def) in defs {
        if flat && (name == "$schema" || name == "version") {
            continue;
        }
        let field: SchemaField = serde_json::from_value(def.clone())
            .map_err(|e| SchemaError::Format(format!("field `{}`: {}", name, e)))?;
        schema.insert(name.clone(), field);
    }

    debug!(fields = schema.len(), "parsed JSON schema");
    Ok(schema)
}

/// What a validation finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    Missing,
    InvalidType,
    InvalidFormat,
    TooShort,
    TooLong,
    Extra,
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub key: String,
    pub code: IssueCode,
    pub message: String,
}

impl ValidationIssue {
    fn new(key: &str, code: IssueCode, message: String) -> Self {
        Self {
            key: key.to_string(),
            code,
            message,
        }
    }
}

/// Outcome of validating a variable set against a schema.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Options for [`validate_env`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Demote unknown variables from errors to warnings.
    pub allow_extra: bool,
}

/// Validate plaintext variables against a schema.
///
/// Per field: a required-but-missing value short-circuits everything else;
/// a type failure short-circuits the remaining checks; regex and length
/// checks each contribute their own finding. `valid` is true iff there are
/// zero errors.
pub fn validate_env(
    vars: &BTreeMap<String, String>,
    schema: &Schema,
    options: &ValidateOptions,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (name, field) in schema.fields() {
        let value = vars.get(name).map(String::as_str).unwrap_or("");

        if value.is_empty() {
            if field.required {
                errors.push(ValidationIssue::new(
                    name,
                    IssueCode::Missing,
                    "required variable is missing or empty".to_string(),
                ));
            }
            continue;
        }

        if let Some(field_type) = field.field_type {
            if let Some(message) = type_failure(field_type, value) {
                errors.push(ValidationIssue::new(name, IssueCode::InvalidType, message));
                continue;
            }
        }

        if let Some(pattern) = &field.regex {
            match Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(value) {
                        errors.push(ValidationIssue::new(
                            name,
                            IssueCode::InvalidFormat,
                            format!("value does not match pattern {}", pattern),
                        ));
                    }
                }
                // Malformed schema patterns are skipped, not surfaced
                Err(_) => debug!(key = %name, "skipping malformed schema regex"),
            }
        }

        let chars = value.chars().count();
        if let Some(min) = field.min_length {
            if chars < min {
                errors.push(ValidationIssue::new(
                    name,
                    IssueCode::TooShort,
                    format!("length {} is below minimum {}", chars, min),
                ));
            }
        }
        if let Some(max) = field.max_length {
            if chars > max {
                errors.push(ValidationIssue::new(
                    name,
                    IssueCode::TooLong,
                    format!("length {} is above maximum {}", chars, max),
                ));
            }
        }
    }

    for key in vars.keys() {
        if schema.get(key).is_none() {
            let issue = ValidationIssue::new(
                key,
                IssueCode::Extra,
                "variable is not declared in the schema".to_string(),
            );
            if options.allow_extra {
                warnings.push(issue);
            } else {
                errors.push(issue);
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Generate `.env.example` content from a schema, in definition order.
pub fn generate_env_example(schema: &Schema) -> String {
    let mut lines = Vec::new();

    for (name, field) in schema.fields() {
        if let Some(description) = &field.description {
            lines.push(format!("# {}", description));
        }
        if field.required {
            lines.push(format!("{}=", name));
        } else {
            lines.push(format!("{}={}", name, field.default.as_deref().unwrap_or("")));
        }
        lines.push(String::new());
    }

    if lines.is_empty() {
        String::new()
    } else {
        lines.join("\n") + "\n"
    }
}

fn type_failure(field_type: FieldType, value: &str) -> Option<String> {
    match field_type {
        FieldType::String => None,
        FieldType::Number => match value.parse::<f64>() {
            Ok(n) if n.is_finite() => None,
            _ => Some(format!("`{}` is not a number", value)),
        },
        FieldType::Boolean => {
            let lower = value.to_lowercase();
            if matches!(lower.as_str(), "true" | "false" | "1" | "0" | "yes" | "no") {
                None
            } else {
                Some(format!("`{}` is not a boolean", value))
            }
        }
        FieldType::Url => {
            if url::Url::parse(value).is_ok() {
                None
            } else {
                Some(format!("`{}` is not an absolute URL", value))
            }
        }
        FieldType::Email => {
            if email_regex().is_match(value) {
                None
            } else {
                Some(format!("`{}` is not an email address", value))
            }
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static pattern"))
}
