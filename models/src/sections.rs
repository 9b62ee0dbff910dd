use serde::Serialize;
use serde_json::{Map, Value};

/// The `##` sections of a document, keyed by heading text.
///
/// A heading that appears twice keeps its first position but takes the
/// content of its last occurrence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sections {
    entries: Vec<(String, String)>,
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, heading: impl Into<String>, content: impl Into<String>) {
        let heading = heading.into();
        let content = content.into();
        match self.entries.iter_mut().find(|(h, _)| *h == heading) {
            Some(entry) => entry.1 = content,
            None => self.entries.push((heading, content)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(h, c)| (h.as_str(), c.as_str()))
    }
}

/// Key/value fixture data parsed from the fenced block of a "Test Data"
/// section. Empty when the section or its block is missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TestData(Map<String, Value>);

impl TestData {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for TestData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One group of consecutive steps and the results expected after them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionRow {
    pub steps: Vec<String>,
    pub results: Vec<String>,
}
