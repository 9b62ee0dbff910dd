use std::path::PathBuf;

use serde::Serialize;

use crate::{Frontmatter, PrintConfig};

/// A test case that made it through the whole pipeline.
#[derive(Clone, Debug, Serialize)]
pub struct CompiledTestCase {
    pub path: PathBuf,
    /// Name of the suite the source file was discovered in.
    pub suite: String,
    /// Normalized frontmatter.
    pub meta: Frontmatter,
    /// The finished HTML fragment for this test case.
    pub html: String,
}

impl CompiledTestCase {
    /// The test case id, when the author gave one.
    pub fn id(&self) -> Option<&str> {
        self.meta.get_str("id")
    }
}

/// All compiled test cases of one suite, in discovery order.
#[derive(Clone, Debug, Serialize)]
pub struct SuiteRecord {
    pub name: String,
    pub testcases: Vec<CompiledTestCase>,
}

/// The outcome of compiling every selected document.
#[derive(Debug)]
pub struct SuiteReport<E> {
    /// Suites sorted by name; suites without compiled cases are omitted.
    pub suites: Vec<SuiteRecord>,
    pub print: PrintConfig,
    /// Documents that failed, when failures are collected instead of
    /// aborting the run.
    pub failures: Vec<E>,
}

impl<E> Default for SuiteReport<E> {
    fn default() -> Self {
        Self {
            suites: Vec::new(),
            print: PrintConfig::default(),
            failures: Vec::new(),
        }
    }
}

impl<E> SuiteReport<E> {
    pub fn testcase_count(&self) -> usize {
        self.suites.iter().map(|s| s.testcases.len()).sum()
    }

    pub fn testcases(&self) -> impl Iterator<Item = &CompiledTestCase> {
        self.suites.iter().flat_map(|s| s.testcases.iter())
    }

    /// Append a compiled test case to its suite, creating the suite
    /// record on first use and keeping suites sorted by name.
    pub fn push(&mut self, testcase: CompiledTestCase) {
        match self.suites.binary_search_by(|s| s.name.as_str().cmp(&testcase.suite)) {
            Ok(i) => self.suites[i].testcases.push(testcase),
            Err(i) => self.suites.insert(
                i,
                SuiteRecord {
                    name: testcase.suite.clone(),
                    testcases: vec![testcase],
                },
            ),
        }
    }
}
