use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CompileError, Result};

/// A markdown file and the suite it was found in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub suite: String,
    pub path: PathBuf,
}

/// Collect the `*.md` files directly inside each suite's directories.
///
/// Suites are visited by name and files by file name. A file reachable
/// from two suites belongs to the first one. Directories that do not
/// exist are skipped with a warning.
pub fn discover(suites: &BTreeMap<String, Vec<PathBuf>>) -> Result<Vec<Source>> {
    if suites.is_empty() {
        return Err(CompileError::NoSuites);
    }

    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for (suite, dirs) in suites {
        for dir in dirs {
            if !dir.is_dir() {
                tracing::warn!(suite = %suite, dir = %dir.display(), "suite directory not found");
                continue;
            }
            for path in find_markdown(dir)? {
                if seen.insert(path.clone()) {
                    sources.push(Source {
                        suite: suite.clone(),
                        path,
                    });
                }
            }
        }
    }

    if sources.is_empty() {
        return Err(CompileError::NoSources);
    }
    tracing::debug!(count = sources.len(), "discovered source files");
    Ok(sources)
}

/// Every `.md` file directly inside `dir`, sorted by file name.
fn find_markdown(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && let Some(ext) = path.extension()
            && ext.eq_ignore_ascii_case("md")
        {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Configured suite names, alphabetically.
pub fn suite_names(suites: &BTreeMap<String, Vec<PathBuf>>) -> Vec<&str> {
    suites.keys().map(String::as_str).collect()
}
