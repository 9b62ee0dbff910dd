use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CompileError, Result};

/// Default file name looked up in the working directory.
pub const CONFIG_FILE: &str = "mantest.toml";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MANTEST_CONFIG";

/// What to do when one document fails to compile.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing document.
    Abort,
    /// Record the failure and carry on with the other documents.
    #[default]
    Skip,
}

/// A `mantest.toml` project file.
///
/// ```toml
/// project = "Acme Portal"
/// tester = "Jane Doe"
/// base_url = "https://staging.acme.test"
/// template_dir = "templates"
/// on_error = "abort"
///
/// [suites]
/// Login = ["cases/login"]
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub tester: String,
    /// Prefix for site-relative links in test case bodies.
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,
    #[serde(default)]
    pub on_error: FailurePolicy,
    /// Suite name to the directories holding its test cases.
    #[serde(default)]
    pub suites: BTreeMap<String, Vec<PathBuf>>,
}

impl ProjectConfig {
    /// Locate and load the project file.
    ///
    /// Priority: explicit `--config` path → `MANTEST_CONFIG` → `./mantest.toml`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(explicit);
        Self::load_from(&path)
    }

    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(CONFIG_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }
        PathBuf::from(CONFIG_FILE)
    }

    /// Load a specific file; relative paths inside it are taken from the
    /// file's directory.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| CompileError::Config(format!("cannot read {}: {e}", path.display())))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&raw, base)
            .map_err(|e| CompileError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse TOML text, resolving relative paths against `base`.
    pub fn parse(raw: &str, base: &Path) -> std::result::Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(raw)?;
        config.resolve_relative(base);
        Ok(config)
    }

    fn resolve_relative(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(dir) = self.template_dir.as_mut() {
            resolve(dir);
        }
        if let Some(dir) = self.schema_dir.as_mut() {
            resolve(dir);
        }
        self.suites.values_mut().flatten().for_each(resolve);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
project = "Acme Portal"
tester = "Jane Doe"
base_url = "https://staging.acme.test"
template_dir = "templates"
on_error = "abort"

[suites]
Login = ["cases/login"]
Checkout = ["cases/checkout", "/shared/payments"]
"#;

    #[test]
    fn relative_paths_follow_the_config_file() {
        let config = ProjectConfig::parse(SAMPLE, Path::new("/work/acme")).unwrap();
        assert_eq!(config.project, "Acme Portal");
        assert_eq!(config.on_error, FailurePolicy::Abort);
        assert_eq!(config.template_dir, Some(PathBuf::from("/work/acme/templates")));
        assert_eq!(config.schema_dir, None);
        assert_eq!(
            config.suites["Checkout"],
            vec![
                PathBuf::from("/work/acme/cases/checkout"),
                PathBuf::from("/shared/payments")
            ]
        );
    }

    #[test]
    fn defaults_for_a_minimal_file() {
        let config = ProjectConfig::parse("[suites]\nA = [\"a\"]\n", Path::new("")).unwrap();
        assert_eq!(config.on_error, FailurePolicy::Skip);
        assert!(config.base_url.is_empty());
        assert_eq!(config.suites["A"], vec![PathBuf::from("a")]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ProjectConfig::parse("projekt = \"x\"\n", Path::new("")).is_err());
        assert!(ProjectConfig::parse("on_error = \"maybe\"\n", Path::new("")).is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, SAMPLE).unwrap();

        assert_eq!(ProjectConfig::resolve_path(Some(&path)), path);
        let config = ProjectConfig::load(Some(&path)).unwrap();
        assert_eq!(config.suites["Login"], vec![tmp.path().join("cases/login")]);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        let err = ProjectConfig::load_from(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
    }
}
