use std::path::{Path, PathBuf};

use thiserror::Error;

/// A `created` frontmatter value that is not a recognizable date.
#[derive(Debug, Error)]
#[error("Could not parse created date value: {value}")]
pub struct DateParseError {
    pub value: String,
}

/// Errors that can occur while compiling a test suite.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Problem in file \"{}\": {source}", file_label(.path))]
    DateParse {
        path: PathBuf,
        #[source]
        source: DateParseError,
    },

    /// The document does not match the expected test case format.
    #[error("Problem in file \"{}\": {message}", file_label(.path))]
    MarkdownSyntax {
        path: PathBuf,
        message: String,
        /// Where in the schema the violation was found, when it came
        /// from schema validation.
        code: Option<String>,
    },

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("invalid schema {}: {message}", .path.display())]
    Schema { path: PathBuf, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("no test suites are configured")]
    NoSuites,

    #[error("there are no source files to convert")]
    NoSources,

    #[error("wkhtmltopdf not found. Please install it from https://wkhtmltopdf.org/downloads.html")]
    RendererNotFound,

    #[error("PDF rendering failed: {0}")]
    Render(String),
}

impl CompileError {
    /// The source document this error is about, if it is scoped to one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            CompileError::DateParse { path, .. } | CompileError::MarkdownSyntax { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }

    pub(crate) fn syntax(path: &Path, message: impl Into<String>) -> Self {
        CompileError::MarkdownSyntax {
            path: path.to_path_buf(),
            message: message.into(),
            code: None,
        }
    }
}

/// The file name shown in error messages.
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_names_the_file_not_the_directory() {
        let err = CompileError::syntax(Path::new("/cases/login/tc-001.md"), "missing id");
        assert_eq!(err.to_string(), "Problem in file \"tc-001.md\": missing id");
        assert_eq!(err.path(), Some(Path::new("/cases/login/tc-001.md")));
    }

    #[test]
    fn date_error_carries_the_value() {
        let err = CompileError::DateParse {
            path: PathBuf::from("a/b.md"),
            source: DateParseError { value: "not-a-date".into() },
        };
        assert_eq!(
            err.to_string(),
            "Problem in file \"b.md\": Could not parse created date value: not-a-date"
        );
    }

    #[test]
    fn run_level_errors_have_no_path() {
        assert!(CompileError::NoSources.path().is_none());
    }
}
