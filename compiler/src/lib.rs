mod body;
mod compile;
mod config;
mod discover;
mod error;
mod frontmatter;
mod hooks;
mod markdown;
mod pdf;
mod print;
mod schema;
mod sections;
mod templates;
mod tokens;

pub use body::{absolutize_links, ensure_test_data_section, resolve_relative_sources, rewrite};
pub use compile::{
    Compiler, Filter, SUITE_KEY, SourceEntry, ValidationSummary, id_filter, suite_filter,
};
pub use config::{CONFIG_ENV, CONFIG_FILE, FailurePolicy, ProjectConfig};
pub use discover::{Source, discover, suite_names};
pub use error::{CompileError, DateParseError, Result};
pub use frontmatter::{SourceParts, normalize, parse_frontmatter, split_source};
pub use hooks::DocumentHook;
pub use markdown::render as render_markdown;
pub use pdf::save_pdf;
pub use print::{derive as derive_print_config, parse_descriptor};
pub use schema::{SchemaValidator, split_sections};
pub use sections::{BuiltSections, build_sections, extract_rows, render_execution_table};
pub use templates::Templates;
pub use tokens::substitute_tokens;
