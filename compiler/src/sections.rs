//! Post-processing of rendered test case HTML, one `<h2>` section at a
//! time.
//!
//! The "Test Data" section is replaced by the Test Data template, fed
//! with the YAML from its fenced block. The nested step/result list of
//! the "Test Execution" section becomes a two column table with a
//! pass/fail checkbox in front of every expected result.

use std::sync::LazyLock;

use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;
use minijinja::context;
use models::{CheckboxCounter, ExecutionRow, TestData};
use regex::Regex;
use serde_json::Value;

use crate::error::Result;
use crate::markdown;
use crate::templates::{PASS_TEMPLATE, TEST_DATA_TEMPLATE, Templates};

const H2_OPEN: &str = "<h2>";

static OL_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)ol\b[^>]*>").expect("ol tag pattern"));

/// Rendered HTML with its sections rebuilt, plus the Test Data found on
/// the way (used for token substitution).
#[derive(Debug)]
pub struct BuiltSections {
    pub html: String,
    pub test_data: TestData,
}

/// Split `html` on `<h2>`, rebuild the Test Data and Test Execution
/// sections, and join everything back in the original order.
///
/// Every bare `<table>` additionally gets the `pure-table` class.
pub fn build_sections(
    html: &str,
    templates: &Templates,
    counter: &mut CheckboxCounter,
) -> Result<BuiltSections> {
    let mut slices: Vec<String> = html.split(H2_OPEN).map(str::to_string).collect();
    let mut test_data = TestData::new();

    // The first slice is whatever precedes the first heading.
    for slice in slices.iter_mut().skip(1) {
        let heading = heading_text(slice).to_string();
        let lower = heading.to_lowercase();
        if lower.starts_with("test data") {
            test_data = parse_test_data(slice);
            *slice = templates.render(
                TEST_DATA_TEMPLATE,
                context! { heading => heading, data => &test_data },
            )?;
        } else if lower.starts_with("test execution") {
            let rows = extract_rows(slice);
            let table = render_execution_table(&rows, templates, counter)?;
            *slice = replace_top_level_lists(slice, &table);
        }
    }

    let html = slices
        .join(H2_OPEN)
        .replace("<table>", "<table class=\"pure-table\">");
    Ok(BuiltSections { html, test_data })
}

/// Heading text of a slice that starts right after `<h2>`.
fn heading_text(slice: &str) -> &str {
    slice.split("</h2>").next().unwrap_or_default().trim()
}

/// The Test Data mapping of a section; empty when the block is missing,
/// unparseable, or not a mapping.
pub fn parse_test_data(section_html: &str) -> TestData {
    match markdown::parse_code_block_yaml(section_html) {
        Ok(Value::Object(map)) => TestData::from(map),
        Ok(_) => TestData::new(),
        Err(e) => {
            tracing::warn!("ignoring unparseable test data block: {e}");
            TestData::new()
        }
    }
}

/// Flatten the nested lists of a Test Execution section into rows.
///
/// Each item of a top-level ordered list is a step; the items of the
/// unordered lists nested inside it are results. Steps accumulate until
/// an item brings results, which closes the row. Steps left over after
/// the last result list have no row and are dropped.
pub fn extract_rows(section_html: &str) -> Vec<ExecutionRow> {
    let doc = kuchiki::parse_html().one(section_html);
    let mut rows = Vec::new();
    let mut pending = Vec::new();

    let Ok(lists) = doc.select("ol") else {
        return rows;
    };
    for list in lists {
        let list = list.as_node();
        if list.ancestors().any(|n| is_element(&n, "li")) {
            continue;
        }
        for item in list.children().filter(|n| is_element(n, "li")) {
            pending.push(step_text(&item));
            let results = result_items(&item);
            if !results.is_empty() {
                rows.push(ExecutionRow {
                    steps: std::mem::take(&mut pending),
                    results,
                });
            }
        }
    }

    if !pending.is_empty() {
        tracing::debug!(
            steps = pending.len(),
            "dropping trailing steps that have no expected results"
        );
    }
    rows
}

fn is_element(node: &NodeRef, name: &str) -> bool {
    node.as_element().is_some_and(|e| &*e.name.local == name)
}

fn inner_html(node: &NodeRef) -> String {
    node.children().map(|child| child.to_string()).collect()
}

/// The item's own text: its first line, before any nested list.
fn step_text(item: &NodeRef) -> String {
    let html = inner_html(item);
    html.trim()
        .split('\n')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn result_items(item: &NodeRef) -> Vec<String> {
    let Ok(results) = item.select("ul > li") else {
        return Vec::new();
    };
    results
        .map(|li| inner_html(li.as_node()).trim().to_string())
        .collect()
}

/// Render rows as the two column steps/results table.
///
/// Step numbering runs on across rows. Every non-empty result gets a
/// checkbox named by `counter`.
pub fn render_execution_table(
    rows: &[ExecutionRow],
    templates: &Templates,
    counter: &mut CheckboxCounter,
) -> Result<String> {
    let mut table = vec![
        "<table class=\"test__execution pure-table pure-table-bordered\">".to_string(),
        "<thead><tr><th>Test Steps</th><th>Test Results</th></tr></thead>".to_string(),
    ];

    let mut list_index = 1;
    for row in rows {
        let steps = format!(
            "<ol start=\"{list_index}\"><li>{}</li></ol>",
            row.steps.join("</li><li>")
        );
        list_index += row.steps.len();

        let mut results = String::from("<ul class=\"test-results\">");
        for result in &row.results {
            if result.is_empty() {
                results.push_str("<li></li>");
                continue;
            }
            let checkbox =
                templates.render(PASS_TEMPLATE, context! { name => counter.next_name() })?;
            results.push_str(&format!("<li>{} {result}</li>", checkbox.trim()));
        }
        results.push_str("</ul>");

        table.push(format!(
            "<tr class=\"\"><td class=\"\">{steps}</td><td class=\"\">{results}</td></tr>"
        ));
    }
    table.push("</table>".to_string());

    Ok(table.join("\n"))
}

/// Put `table` where the first top-level `<ol>` was and drop any further
/// top-level ordered lists; prose around them stays.
fn replace_top_level_lists(section: &str, table: &str) -> String {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for caps in OL_TAG_RE.captures_iter(section) {
        let Some(m) = caps.get(0) else { continue };
        if caps[1].is_empty() {
            if depth == 0 {
                start = m.start();
            }
            depth += 1;
        } else if depth > 0 {
            depth -= 1;
            if depth == 0 {
                spans.push(start..m.end());
            }
        }
    }

    if spans.is_empty() {
        return section.to_string();
    }
    let mut out = String::with_capacity(section.len() + table.len());
    let mut last = 0;
    for (i, span) in spans.iter().enumerate() {
        out.push_str(&section[last..span.start]);
        if i == 0 {
            out.push_str(table);
        }
        last = span.end;
    }
    out.push_str(&section[last..]);
    out
}
