//! YAML-frontmatter parsing and writing shared by the Agent and Skill
//! repositories.
//!
//! The wire format is `CLAUDE.md`/`SKILL.md`: a leading `---\n...\n---\n`
//! YAML block followed by free-form markdown. List-valued fields are
//! re-emitted in flow style (`tags: [a, b]`) rather than YAML's default
//! block style, matching the format these files were originally authored
//! in by hand.

use std::collections::BTreeMap;

use regex::Regex;
use serde_yaml::Value;

use crate::error::{RepoError, RepoResult};

fn frontmatter_pattern() -> Regex {
    Regex::new(r"(?s)^---\n(.*?)\n---\n(.*)$").expect("static regex is valid")
}

/// A parsed frontmatter block plus the markdown body that follows it.
pub struct ParsedFrontmatter {
    /// The YAML frontmatter, as a field-name → value map.
    pub fields: BTreeMap<String, Value>,
    /// The markdown body following the closing `---`.
    pub body: String,
}

/// Parse `content` (the full text of a `CLAUDE.md`/`SKILL.md` file) into its
/// frontmatter map and body.
///
/// # Errors
///
/// Returns [`RepoError::InvalidFrontmatter`] if `content` starts with `---`
/// but the block is malformed, or if the frontmatter is not a YAML mapping.
pub fn parse(content: &str, path_for_errors: &str) -> RepoResult<ParsedFrontmatter> {
    if !content.starts_with("---") {
        return Ok(ParsedFrontmatter {
            fields: BTreeMap::new(),
            body: content.to_string(),
        });
    }

    let captures = frontmatter_pattern()
        .captures(content)
        .ok_or_else(|| RepoError::InvalidFrontmatter {
            path: path_for_errors.to_string(),
            reason: "malformed --- frontmatter block".to_string(),
        })?;

    let yaml_block = &captures[1];
    let body = captures[2].to_string();

    let value: Value =
        serde_yaml::from_str(yaml_block).map_err(|e| RepoError::InvalidFrontmatter {
            path: path_for_errors.to_string(),
            reason: e.to_string(),
        })?;

    let mapping = value
        .as_mapping()
        .ok_or_else(|| RepoError::InvalidFrontmatter {
            path: path_for_errors.to_string(),
            reason: "frontmatter must be a mapping".to_string(),
        })?;

    let mut fields = BTreeMap::new();
    for (k, v) in mapping {
        if let Some(key) = k.as_str() {
            fields.insert(key.to_string(), v.clone());
        }
    }

    Ok(ParsedFrontmatter { fields, body })
}

/// Read a frontmatter field as a list of strings.
///
/// Legacy files sometimes store list fields as a single comma-separated
/// string, or a single bare scalar; both are coerced into a `Vec<String>`,
/// matching the original format's leniency.
#[must_use]
pub fn field_as_list(fields: &BTreeMap<String, Value>, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            }
        }
        Some(other) => other.as_str().map(|s| vec![s.to_string()]).unwrap_or_default(),
        None => Vec::new(),
    }
}

/// Read a frontmatter field as a string, if present and non-empty.
#[must_use]
pub fn field_as_string(fields: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A frontmatter field value to be re-emitted.
pub enum FieldValue {
    /// A bare scalar, emitted as a quoted-if-needed YAML string.
    Str(String),
    /// A list, emitted in flow style (`[a, b]`).
    List(Vec<String>),
}

/// Emit `---\n<frontmatter>\n---\n<body>`, with list fields in flow style.
///
/// `fields` controls both the set of emitted keys and their order — callers
/// should list only the keys that should actually appear, consistent with
/// "omit optional fields rather than emit them empty".
#[must_use]
pub fn render(fields: &[(&str, FieldValue)], body: &str) -> String {
    let mut yaml = String::new();
    for (key, value) in fields {
        match value {
            FieldValue::Str(s) => {
                yaml.push_str(key);
                yaml.push_str(": ");
                yaml.push_str(&scalar(s));
                yaml.push('\n');
            }
            FieldValue::List(items) => {
                yaml.push_str(key);
                yaml.push_str(": ");
                yaml.push_str(&flow_list(items));
                yaml.push('\n');
            }
        }
    }
    format!("---\n{yaml}---\n{body}")
}

fn flow_list(items: &[String]) -> String {
    let rendered: Vec<String> = items.iter().map(|s| scalar(s)).collect();
    format!("[{}]", rendered.join(", "))
}

fn scalar(s: &str) -> String {
    let needs_quoting = s.is_empty()
        || s.contains([':', '#', ',', '[', ']', '{', '}', '\n'])
        || s.starts_with(['"', '\'', ' '])
        || s.ends_with(' ');
    if needs_quoting {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_frontmatter() {
        let content = "---\nname: Backend Dev\ntags: [a, b]\n---\nBody text\n";
        let parsed = parse(content, "CLAUDE.md").unwrap();
        assert_eq!(field_as_string(&parsed.fields, "name"), Some("Backend Dev".to_string()));
        assert_eq!(field_as_list(&parsed.fields, "tags"), vec!["a", "b"]);
        assert_eq!(parsed.body, "Body text\n");
    }

    #[test]
    fn coerces_comma_separated_legacy_string() {
        let content = "---\nname: X\ntags: a, b, c\n---\nBody\n";
        let parsed = parse(content, "CLAUDE.md").unwrap();
        assert_eq!(field_as_list(&parsed.fields, "tags"), vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_frontmatter_defaults_to_empty_fields() {
        let parsed = parse("# just a body\n", "CLAUDE.md").unwrap();
        assert!(parsed.fields.is_empty());
        assert_eq!(parsed.body, "# just a body\n");
    }

    #[test]
    fn render_emits_flow_style_lists() {
        let out = render(
            &[
                ("name", FieldValue::Str("Backend Dev".to_string())),
                (
                    "tags",
                    FieldValue::List(vec!["management".to_string(), "planning".to_string()]),
                ),
            ],
            "# Backend Dev\n",
        );
        assert!(out.contains("tags: [management, planning]\n"));
        assert!(out.starts_with("---\nname: Backend Dev\n"));
        assert!(out.ends_with("---\n# Backend Dev\n"));
    }

    #[test]
    fn round_trips_through_parse_and_render() {
        let rendered = render(
            &[
                ("name", FieldValue::Str("X".to_string())),
                ("tags", FieldValue::List(vec!["a".to_string()])),
            ],
            "body\n",
        );
        let parsed = parse(&rendered, "CLAUDE.md").unwrap();
        assert_eq!(field_as_string(&parsed.fields, "name"), Some("X".to_string()));
        assert_eq!(field_as_list(&parsed.fields, "tags"), vec!["a"]);
    }
}
