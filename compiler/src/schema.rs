//! Structural validation of a test case against a JSON Schema.
//!
//! The validated record is built from what the author wrote: the raw
//! frontmatter (original key spelling, unconverted dates) merged with the
//! raw markdown of every `##` section. Error messages therefore point at
//! the author's own input rather than at rewritten output.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use jsonschema::Validator;
use models::{Frontmatter, Sections};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{CompileError, Result};
use crate::markdown;

pub const SCHEMA_FILE: &str = "test_case.schema.json";

const BUILTIN_SCHEMA: &str = include_str!("../schemas/test_case.schema.json");

const TEST_DATA: &str = "Test Data";

static H2_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##[ \t]+(.+?)[ \t]*$").expect("h2 line pattern"));

/// Split a markdown body into its `##` sections.
///
/// Text before the first heading is not part of any section. Content is
/// trimmed; a heading used twice keeps the content of its last use.
pub fn split_sections(body: &str) -> Sections {
    let mut sections = Sections::new();
    let headings: Vec<_> = H2_LINE_RE.captures_iter(body).collect();
    for (i, caps) in headings.iter().enumerate() {
        let (Some(line), Some(title)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(body.len(), |m| m.start());
        let title = title.as_str().trim_end_matches('#').trim_end();
        sections.insert(title, body[line.end()..end].trim());
    }
    sections
}

pub struct SchemaValidator {
    validator: Validator,
    origin: PathBuf,
}

impl SchemaValidator {
    /// Load `<dir>/test_case.schema.json`, or the built-in schema when no
    /// directory is configured.
    pub fn from_dir(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => {
                let path = dir.join(SCHEMA_FILE);
                let source = fs::read_to_string(&path).map_err(|e| CompileError::Schema {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                Self::from_source(&source, path)
            }
            None => Self::builtin(),
        }
    }

    pub fn builtin() -> Result<Self> {
        Self::from_source(BUILTIN_SCHEMA, PathBuf::from(SCHEMA_FILE))
    }

    fn from_source(source: &str, origin: PathBuf) -> Result<Self> {
        let schema: Value = serde_json::from_str(source).map_err(|e| CompileError::Schema {
            path: origin.clone(),
            message: e.to_string(),
        })?;
        let validator = jsonschema::validator_for(&schema).map_err(|e| CompileError::Schema {
            path: origin.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { validator, origin })
    }

    /// Where the schema was loaded from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Validate one document. `path` only labels the error.
    pub fn validate(
        &self,
        path: &Path,
        frontmatter: &Frontmatter,
        sections: &Sections,
    ) -> Result<()> {
        let record = build_record(path, frontmatter, sections)?;
        if let Err(error) = self.validator.validate(&record) {
            let location = error.instance_path.to_string();
            let message = if location.is_empty() {
                error.to_string()
            } else {
                format!("{error} (at {location})")
            };
            return Err(CompileError::MarkdownSyntax {
                path: path.to_path_buf(),
                message,
                code: Some(error.schema_path.to_string()),
            });
        }
        Ok(())
    }
}

/// Frontmatter merged with `heading -> content`. The Test Data section
/// is replaced by its parsed fenced block (null when there is none).
/// Frontmatter wins when a key and a heading collide.
fn build_record(path: &Path, frontmatter: &Frontmatter, sections: &Sections) -> Result<Value> {
    let mut record: Map<String, Value> = frontmatter.as_map().clone();
    for (heading, content) in sections.iter() {
        if record.contains_key(heading) {
            tracing::debug!(heading, "section shadowed by a frontmatter key");
            continue;
        }
        let value = if heading == TEST_DATA {
            let html = markdown::render(content);
            markdown::parse_code_block_yaml(&html).map_err(|e| {
                CompileError::syntax(path, format!("Test Data block is not valid YAML: {e}"))
            })?
        } else {
            Value::String(content.to_string())
        };
        record.insert(heading.to_string(), value);
    }
    Ok(Value::Object(record))
}
