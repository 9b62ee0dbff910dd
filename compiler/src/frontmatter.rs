//! Frontmatter extraction and normalization.
//!
//! A test case starts with a YAML block fenced by `---` lines. Authors
//! frequently leave out the opening fence, so it is treated as optional:
//! everything up to the first `---` line is frontmatter.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use models::Frontmatter;
use serde_json::Value;

use crate::error::DateParseError;

/// A source document split into its frontmatter text and markdown body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceParts<'a> {
    /// The YAML text between the fences (empty when there is none).
    pub frontmatter: &'a str,
    pub body: &'a str,
}

/// Split raw file contents on the frontmatter fences.
///
/// A missing opening fence is synthesized. Without any closing fence the
/// whole text is body and the frontmatter is empty.
pub fn split_source(raw: &str) -> SourceParts<'_> {
    let content = raw
        .strip_prefix("---\r\n")
        .or_else(|| raw.strip_prefix("---\n"))
        .unwrap_or(raw);

    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim() == "---" {
            return SourceParts {
                frontmatter: &content[..offset],
                body: &content[offset + line.len()..],
            };
        }
        offset += line.len();
    }

    SourceParts {
        frontmatter: "",
        body: content,
    }
}

/// Parse frontmatter YAML exactly as the author wrote it.
///
/// Blank frontmatter yields an empty mapping. Anything that is not a
/// mapping is rejected with a message suitable for the author.
pub fn parse_frontmatter(yaml: &str) -> Result<Frontmatter, String> {
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::new());
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| format!("invalid frontmatter: {e}"))?;
    let mapping = match value {
        serde_yaml::Value::Null => return Ok(Frontmatter::new()),
        serde_yaml::Value::Mapping(m) => m,
        _ => return Err("frontmatter must be a mapping of `key: value` pairs".into()),
    };

    let mut fm = Frontmatter::new();
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            other => return Err(format!("unsupported frontmatter key: {other:?}")),
        };
        let value = serde_json::to_value(&value)
            .map_err(|e| format!("unsupported value for `{key}`: {e}"))?;
        fm.insert(key, value);
    }
    Ok(fm)
}

/// Normalize parsed frontmatter.
///
/// Keys are lower-cased, `test case id` becomes `id`, and `created` is
/// converted to Unix epoch seconds. Running this on its own output
/// returns the same mapping.
pub fn normalize(raw: &Frontmatter) -> Result<Frontmatter, DateParseError> {
    let mut out = Frontmatter::new();
    for (key, value) in raw.iter() {
        let key = match key.to_lowercase() {
            k if k == "test case id" => "id".to_string(),
            k => k,
        };
        let value = if key == "created" {
            Value::from(created_to_epoch(value)?)
        } else {
            value.clone()
        };
        out.insert(key, value);
    }
    Ok(out)
}

/// Epoch seconds for a `created` value. Integers are taken to be epoch
/// seconds already.
fn created_to_epoch(value: &Value) -> Result<i64, DateParseError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => parse_date(s),
        _ => None,
    };
    parsed.ok_or_else(|| DateParseError {
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse a calendar date or date-time into epoch seconds.
///
/// Values without an offset are read as UTC. `@<seconds>` is accepted
/// as an explicit epoch.
fn parse_date(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Some(epoch) = s.strip_prefix('@') {
        return epoch.parse().ok();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        }
    }
    None
}
