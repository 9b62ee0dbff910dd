//! The template environment used for page assembly and for the generated
//! fragments (Test Data block, pass/fail checkboxes, page descriptor).
//!
//! Templates are looked up in the project's template directory first and
//! fall back to the built-in set.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Environment, ErrorKind};
use serde::Serialize;

use crate::error::Result;

pub const PAGE_TEMPLATE: &str = "testcase.html";
pub const TEST_DATA_TEMPLATE: &str = "test_data.html";
pub const PASS_TEMPLATE: &str = "pass.html";
/// The optional page-layout descriptor; there is no built-in one.
pub const PAGE_DESCRIPTOR_TEMPLATE: &str = "pdf.xml";

const STYLESHEET: &str = "style.css";

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        PAGE_TEMPLATE => Some(include_str!("../templates/testcase.html")),
        TEST_DATA_TEMPLATE => Some(include_str!("../templates/test_data.html")),
        PASS_TEMPLATE => Some(include_str!("../templates/pass.html")),
        _ => None,
    }
}

pub struct Templates {
    env: Environment<'static>,
    template_dir: Option<PathBuf>,
}

impl Templates {
    /// Built-in templates only.
    pub fn builtin() -> Self {
        Self::new(None)
    }

    pub fn new(template_dir: Option<&Path>) -> Self {
        let template_dir = template_dir.map(Path::to_path_buf);
        let search = template_dir.clone();

        let mut env = Environment::new();
        env.set_loader(move |name| {
            if let Some(dir) = &search {
                let path = dir.join(name);
                if path.is_file() {
                    return fs::read_to_string(&path).map(Some).map_err(|e| {
                        minijinja::Error::new(
                            ErrorKind::InvalidOperation,
                            format!("cannot read template {}", path.display()),
                        )
                        .with_source(e)
                    });
                }
            }
            Ok(builtin(name).map(str::to_string))
        });

        Self { env, template_dir }
    }

    /// Whether `name` resolves to a template.
    ///
    /// Other loader errors (unreadable file, syntax errors) are returned.
    pub fn exists(&self, name: &str) -> Result<bool> {
        match self.env.get_template(name) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::TemplateNotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let tmpl = self.env.get_template(name)?;
        Ok(tmpl.render(ctx)?)
    }

    /// The stylesheets inlined into the page: the template directory's
    /// `style.css` when present, the built-in one otherwise.
    pub fn stylesheets(&self) -> Result<Vec<String>> {
        if let Some(dir) = &self.template_dir {
            let path = dir.join(STYLESHEET);
            if path.is_file() {
                return Ok(vec![fs::read_to_string(path)?]);
            }
        }
        Ok(vec![include_str!("../templates/style.css").to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;
    use tempfile::TempDir;

    #[test]
    fn builtin_pass_checkbox_carries_name() {
        let t = Templates::builtin();
        let html = t.render(PASS_TEMPLATE, context! { name => 7 }).unwrap();
        assert!(html.contains(r#"name="7""#));
    }

    #[test]
    fn page_descriptor_has_no_builtin() {
        let t = Templates::builtin();
        assert!(!t.exists(PAGE_DESCRIPTOR_TEMPLATE).unwrap());
        assert!(t.exists(PAGE_TEMPLATE).unwrap());
    }

    #[test]
    fn template_dir_overrides_builtin() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PASS_TEMPLATE), "[box {{ name }}]").unwrap();
        fs::write(dir.path().join("pdf.xml"), "<page/>").unwrap();
        let t = Templates::new(Some(dir.path()));
        assert_eq!(t.render(PASS_TEMPLATE, context! { name => 3 }).unwrap(), "[box 3]");
        assert!(t.exists(PAGE_DESCRIPTOR_TEMPLATE).unwrap());
        // Not overridden, still served from the built-in set.
        assert!(t.exists(TEST_DATA_TEMPLATE).unwrap());
    }

    #[test]
    fn stylesheet_from_template_dir_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("style.css"), "h1 { color: red; }").unwrap();
        let t = Templates::new(Some(dir.path()));
        assert_eq!(t.stylesheets().unwrap(), vec!["h1 { color: red; }".to_string()]);

        let builtin = Templates::builtin().stylesheets().unwrap();
        assert!(builtin[0].contains("pure-table"));
    }

    #[test]
    fn syntax_errors_surface() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pdf.xml"), "{% if %}").unwrap();
        let t = Templates::new(Some(dir.path()));
        assert!(t.exists(PAGE_DESCRIPTOR_TEMPLATE).is_err());
    }
}
