//! The per-document pipeline and the suite-level run around it.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::context;
use models::{CheckboxCounter, CompiledTestCase, Frontmatter, PrintConfig, SuiteReport};
use serde_json::{Map, Value};

use crate::body;
use crate::config::{FailurePolicy, ProjectConfig};
use crate::discover::{self, Source};
use crate::error::{CompileError, Result};
use crate::frontmatter::{normalize, parse_frontmatter, split_source};
use crate::hooks::{self, DocumentHook};
use crate::markdown;
use crate::print;
use crate::schema::{self, SchemaValidator};
use crate::sections::build_sections;
use crate::templates::{PAGE_TEMPLATE, Templates};
use crate::tokens::substitute_tokens;

const PAGE_TITLE: &str = "Test Suite";

/// Meta key carrying the suite name during filtering.
pub const SUITE_KEY: &str = "test suite";

/// What a filter gets to look at.
#[derive(Clone, Debug)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub suite: String,
    /// Normalized frontmatter plus `test suite`.
    pub meta: Frontmatter,
}

pub type Filter = Box<dyn Fn(&SourceEntry) -> bool>;

/// Result of a validation-only run.
#[derive(Debug, Default)]
pub struct ValidationSummary {
    pub checked: usize,
    pub failures: Vec<CompileError>,
}

pub struct Compiler {
    config: ProjectConfig,
    templates: Templates,
    validator: SchemaValidator,
    hooks: Vec<Box<dyn DocumentHook>>,
    filters: Vec<Filter>,
}

impl Compiler {
    pub fn new(config: ProjectConfig) -> Result<Self> {
        let templates = Templates::new(config.template_dir.as_deref());
        let validator = SchemaValidator::from_dir(config.schema_dir.as_deref())?;
        tracing::debug!(schema = %validator.origin().display(), "schema loaded");
        Ok(Self {
            config,
            templates,
            validator,
            hooks: Vec::new(),
            filters: Vec::new(),
        })
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn set_failure_policy(&mut self, policy: FailurePolicy) {
        self.config.on_error = policy;
    }

    /// Register a hook; hooks run in registration order.
    pub fn add_hook(&mut self, hook: impl DocumentHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Only documents accepted by every filter are compiled.
    pub fn add_filter(&mut self, filter: impl Fn(&SourceEntry) -> bool + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn remove_filters(&mut self) {
        self.filters.clear();
    }

    // ───────────────────────── selection ─────────────────────────

    /// Discovered documents that pass the filters.
    pub fn sources(&self) -> Result<Vec<Source>> {
        let discovered = discover::discover(&self.config.suites)?;
        if self.filters.is_empty() {
            return Ok(discovered);
        }
        let mut selected = Vec::new();
        for source in discovered {
            if self.accepts(&source)? {
                selected.push(source);
            }
        }
        Ok(selected)
    }

    fn accepts(&self, source: &Source) -> Result<bool> {
        let raw = fs::read_to_string(&source.path)?;
        let parts = split_source(&raw);
        let Some(mut meta) = parse_frontmatter(parts.frontmatter)
            .ok()
            .and_then(|fm| normalize(&fm).ok())
        else {
            // Let compilation report the problem.
            return Ok(true);
        };
        meta.insert(SUITE_KEY, Value::String(source.suite.clone()));
        let entry = SourceEntry {
            path: source.path.clone(),
            suite: source.suite.clone(),
            meta,
        };
        Ok(self.filters.iter().all(|f| f(&entry)))
    }

    // ───────────────────────── compilation ─────────────────────────

    /// Compile every selected document into a report.
    ///
    /// Checkbox names are unique across the whole run. Under
    /// [`FailurePolicy::Skip`] failing documents are collected in the
    /// report instead of ending the run.
    pub fn compile(&self) -> Result<SuiteReport<CompileError>> {
        let sources = self.sources()?;
        let mut counter = CheckboxCounter::new();
        let mut report = SuiteReport {
            print: self.print_config()?,
            ..SuiteReport::default()
        };

        for source in &sources {
            match self.compile_document(source, &mut counter) {
                Ok(testcase) => report.push(testcase),
                Err(e) if self.config.on_error == FailurePolicy::Skip => {
                    tracing::warn!(path = %source.path.display(), "skipping: {e}");
                    report.failures.push(e);
                }
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(
            compiled = report.testcase_count(),
            failed = report.failures.len(),
            checkboxes = counter.last(),
            "suite compiled"
        );
        Ok(report)
    }

    /// Run one document through the whole pipeline.
    pub fn compile_document(
        &self,
        source: &Source,
        counter: &mut CheckboxCounter,
    ) -> Result<CompiledTestCase> {
        let path = source.path.as_path();
        let raw = fs::read_to_string(path)?;
        let raw = hooks::apply(&self.hooks, raw, |h, v| h.on_load(v, path));

        let parts = split_source(&raw);
        let authored = parse_frontmatter(parts.frontmatter)
            .map_err(|message| CompileError::syntax(path, message))?;
        let meta = normalize(&authored).map_err(|source| CompileError::DateParse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), keys = meta.len(), "frontmatter normalized");

        let md = body::rewrite(parts.body, &self.config.base_url);
        let md = hooks::apply(&self.hooks, md, |h, v| h.on_markdown(v, path));

        let html = markdown::render(&md);
        let html = body::resolve_relative_sources(&html, document_dir(path));
        let built = build_sections(&html, &self.templates, counter)?;
        let html = substitute_tokens(&built.html, &built.test_data);
        let html = hooks::apply(&self.hooks, html, |h, v| h.on_html(v, path));

        // Checked against what the author wrote, not the rewritten body.
        self.validator
            .validate(path, &authored, &schema::split_sections(parts.body))?;

        Ok(CompiledTestCase {
            path: path.to_path_buf(),
            suite: source.suite.clone(),
            meta,
            html,
        })
    }

    /// Schema-check every selected document without building output.
    pub fn validate_all(&self) -> Result<ValidationSummary> {
        let mut summary = ValidationSummary::default();
        for source in self.sources()? {
            summary.checked += 1;
            if let Err(e) = self.validate_document(&source.path) {
                summary.failures.push(e);
            }
        }
        Ok(summary)
    }

    fn validate_document(&self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)?;
        let parts = split_source(&raw);
        let authored = parse_frontmatter(parts.frontmatter)
            .map_err(|message| CompileError::syntax(path, message))?;
        // A date that would stop compilation fails validation too.
        normalize(&authored).map_err(|source| CompileError::DateParse {
            path: path.to_path_buf(),
            source,
        })?;
        self.validator
            .validate(path, &authored, &schema::split_sections(parts.body))
    }

    // ───────────────────────── output ─────────────────────────

    pub fn print_config(&self) -> Result<PrintConfig> {
        print::derive(&self.templates, &self.config.project)
    }

    /// Assemble the final HTML page.
    pub fn render_page(&self, report: &SuiteReport<CompileError>) -> Result<String> {
        let suites: Vec<Value> = report
            .suites
            .iter()
            .map(|suite| {
                serde_json::json!({
                    "name": suite.name,
                    "testcases": suite.testcases.iter().map(page_testcase).collect::<Vec<_>>(),
                })
            })
            .collect();
        let testcases: Vec<Value> = report.testcases().map(page_testcase).collect();

        self.templates.render(
            PAGE_TEMPLATE,
            context! {
                page => context! {
                    title => PAGE_TITLE,
                    styles => self.templates.stylesheets()?,
                },
                project => context! { name => &self.config.project },
                tester => context! { name => &self.config.tester },
                suites => suites,
                testcases => testcases,
            },
        )
    }
}

/// A test case as the page template sees it: its metadata with `html`,
/// `suite` and `path` alongside.
fn page_testcase(testcase: &CompiledTestCase) -> Value {
    let mut map: Map<String, Value> = testcase.meta.as_map().clone();
    map.insert("html".into(), Value::String(testcase.html.clone()));
    map.insert("suite".into(), Value::String(testcase.suite.clone()));
    map.insert(
        "path".into(),
        Value::String(testcase.path.display().to_string()),
    );
    Value::Object(map)
}

fn document_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

// ───────────────────────── filters ─────────────────────────

/// Accept documents from any of `suites`.
pub fn suite_filter(suites: Vec<String>) -> impl Fn(&SourceEntry) -> bool {
    move |entry: &SourceEntry| suites.iter().any(|s| *s == entry.suite)
}

/// Accept documents whose `id` is one of `ids`.
pub fn id_filter(ids: Vec<String>) -> impl Fn(&SourceEntry) -> bool {
    move |entry: &SourceEntry| {
        let id = match entry.meta.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return false,
        };
        ids.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn case(id: &str, title: &str) -> String {
        format!(
            "\
Test Case ID: {id}
Title: {title}
Created: 2020-01-15
---
See [the docs](/help).

## Test Data

```
username: alice
```

## Test Execution

1. Open the login page
2. Log in as {{{{ username }}}}
    - The dashboard loads
    - A welcome banner is shown
"
        )
    }

    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("login")).unwrap();
            fs::create_dir_all(dir.path().join("checkout")).unwrap();
            Self { dir }
        }

        fn write(&self, rel: &str, content: &str) {
            fs::write(self.dir.path().join(rel), content).unwrap();
        }

        fn config(&self) -> ProjectConfig {
            let mut suites = BTreeMap::new();
            suites.insert("Login".to_string(), vec![self.dir.path().join("login")]);
            suites.insert("Checkout".to_string(), vec![self.dir.path().join("checkout")]);
            ProjectConfig {
                project: "Acme".into(),
                tester: "Jane Doe".into(),
                base_url: "https://acme.test".into(),
                suites,
                ..ProjectConfig::default()
            }
        }

        fn compiler(&self) -> Compiler {
            Compiler::new(self.config()).unwrap()
        }
    }

    #[test]
    fn document_runs_through_every_stage() {
        let p = Project::new();
        p.write("login/tc-001.md", &case("TC-001", "Login works"));

        let report = p.compiler().compile().unwrap();
        assert!(report.failures.is_empty());
        let tc = report.testcases().next().unwrap();

        assert_eq!(tc.id(), Some("TC-001"));
        assert_eq!(tc.suite, "Login");
        assert_eq!(tc.meta.get("created"), Some(&serde_json::json!(1579046400)));
        assert!(tc.html.contains("href=\"https://acme.test/help\""));
        assert!(tc.html.contains("class=\"test__execution"));
        assert!(tc.html.contains("Log in as <code>alice</code>"));
        assert!(tc.html.contains("<th>username</th>"));
        assert_eq!(report.print, PrintConfig::default());
    }

    #[test]
    fn checkbox_names_continue_across_documents() {
        let p = Project::new();
        p.write("login/a.md", &case("TC-001", "First"));
        p.write("login/b.md", &case("TC-002", "Second"));

        let report = p.compiler().compile().unwrap();
        let html: Vec<_> = report.testcases().map(|t| t.html.as_str()).collect();
        assert!(html[0].contains(r#"name="1""#) && html[0].contains(r#"name="2""#));
        assert!(html[1].contains(r#"name="3""#) && html[1].contains(r#"name="4""#));
        assert!(!html[1].contains(r#"name="1""#));

        // A new run starts from 1 again.
        let again = p.compiler().compile().unwrap();
        assert!(again.testcases().next().unwrap().html.contains(r#"name="1""#));
    }

    #[test]
    fn failures_are_collected_when_skipping() {
        let p = Project::new();
        p.write("login/a.md", &case("TC-001", "Good"));
        p.write(
            "login/b.md",
            &case("TC-002", "Bad date").replace("2020-01-15", "not-a-date"),
        );

        let mut compiler = p.compiler();
        compiler.set_failure_policy(FailurePolicy::Skip);
        let report = compiler.compile().unwrap();
        assert_eq!(report.testcase_count(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], CompileError::DateParse { .. }));
        assert!(report.failures[0].to_string().contains("\"b.md\""));
    }

    #[test]
    fn first_failure_aborts_when_asked() {
        let p = Project::new();
        p.write("login/a.md", "Title: no execution\n---\n## Notes\n\nnothing\n");
        p.write("login/b.md", &case("TC-002", "Fine"));

        let mut compiler = p.compiler();
        compiler.set_failure_policy(FailurePolicy::Abort);
        let err = compiler.compile().unwrap_err();
        assert!(matches!(err, CompileError::MarkdownSyntax { .. }));
        assert_eq!(err.path().and_then(|p| p.file_name()).unwrap(), "a.md");
    }

    #[test]
    fn filters_select_by_suite_and_id() {
        let p = Project::new();
        p.write("login/a.md", &case("TC-001", "A"));
        p.write("login/b.md", &case("TC-002", "B"));
        p.write("checkout/c.md", &case("TC-003", "C"));

        let mut compiler = p.compiler();
        compiler.add_filter(suite_filter(vec!["Login".into()]));
        assert_eq!(compiler.sources().unwrap().len(), 2);

        compiler.add_filter(id_filter(vec!["TC-002".into()]));
        let report = compiler.compile().unwrap();
        let ids: Vec<_> = report.testcases().filter_map(|t| t.id()).collect();
        assert_eq!(ids, vec!["TC-002"]);

        compiler.remove_filters();
        compiler.add_filter(|e: &SourceEntry| e.meta.get_str(SUITE_KEY) == Some("Checkout"));
        assert_eq!(compiler.sources().unwrap().len(), 1);
    }

    #[test]
    fn broken_frontmatter_passes_filters_and_fails_compilation() {
        let p = Project::new();
        p.write("login/a.md", "Created: whenever\n---\n## Test Execution\n\n1. x\n    - y\n");

        let mut compiler = p.compiler();
        compiler.add_filter(id_filter(vec!["TC-999".into()]));
        assert_eq!(compiler.sources().unwrap().len(), 1);
        let report = compiler.compile().unwrap();
        assert_eq!(report.failures.len(), 1);
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl DocumentHook for Recorder {
        fn on_load(&self, raw: String, _path: &Path) -> String {
            self.0.lock().unwrap().push("load".into());
            raw
        }
        fn on_markdown(&self, markdown: String, _path: &Path) -> String {
            self.0.lock().unwrap().push("markdown".into());
            markdown
        }
        fn on_html(&self, html: String, _path: &Path) -> String {
            self.0.lock().unwrap().push("html".into());
            format!("{html}<!-- stamped -->")
        }
    }

    #[test]
    fn hooks_run_at_each_stage() {
        let p = Project::new();
        p.write("login/a.md", &case("TC-001", "A"));

        let recorder = Recorder::default();
        let mut compiler = p.compiler();
        compiler.add_hook(recorder.clone());
        let report = compiler.compile().unwrap();

        assert_eq!(*recorder.0.lock().unwrap(), vec!["load", "markdown", "html"]);
        assert!(report.testcases().next().unwrap().html.ends_with("<!-- stamped -->"));
    }

    #[test]
    fn page_lists_suites_and_tester() {
        let p = Project::new();
        p.write("login/a.md", &case("TC-001", "Login works"));
        p.write("checkout/c.md", &case("TC-003", "Checkout works"));

        let compiler = p.compiler();
        let report = compiler.compile().unwrap();
        let page = compiler.render_page(&report).unwrap();

        assert!(page.contains("<title>Test Suite | Acme</title>"));
        assert!(page.contains("Jane Doe"));
        assert!(page.contains("Login works"));
        assert!(page.contains("Checkout works"));
        assert!(page.contains("pure-table"));
        assert!(page.find("Checkout works").unwrap() < page.find("Login works").unwrap());
    }

    #[test]
    fn validate_all_reports_every_failure() {
        let p = Project::new();
        p.write("login/a.md", &case("TC-001", "A"));
        p.write("login/b.md", "Title: x\n---\n## Notes\n");
        p.write("checkout/c.md", "Title: [broken\n---\n## Test Execution\n\n1. x\n");

        let summary = p.compiler().validate_all().unwrap();
        assert_eq!(summary.checked, 3);
        assert_eq!(summary.failures.len(), 2);
    }
    #[test]
    fn sections_are_validated_before_body_rewrites() {
        let p = Project::new();
        fs::create_dir_all(p.dir.path().join("schemas")).unwrap();
        p.write(
            "schemas/test_case.schema.json",
            r#"{
                "type": "object",
                "required": ["Test Execution"],
                "not": { "required": ["Test Data"] },
                "properties": {
                    "Test Execution": { "type": "string", "pattern": "\\]\\(/a\\)" }
                }
            }"#,
        );
        p.write(
            "login/a.md",
            "Title: No data\n---\n## Test Execution\n\nSee [x](/a).\n\n1. Do\n    - Done\n",
        );
        let mut config = p.config();
        config.schema_dir = Some(p.dir.path().join("schemas"));
        let compiler = Compiler::new(config).unwrap();

        let summary = compiler.validate_all().unwrap();
        assert_eq!(summary.checked, 1);
        assert!(summary.failures.is_empty(), "{:?}", summary.failures);

        let report = compiler.compile().unwrap();
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(report.testcase_count(), 1);
        let html = &report.testcases().next().unwrap().html;
        assert!(html.contains("href=\"https://acme.test/a\""));
    }

    #[test]
    fn unreadable_created_date_fails_validation() {
        let p = Project::new();
        p.write(
            "login/a.md",
            &case("TC-001", "Bad date").replace("2020-01-15", "not-a-date"),
        );

        let summary = p.compiler().validate_all().unwrap();
        assert_eq!(summary.checked, 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(summary.failures[0], CompileError::DateParse { .. }));
    }
}
