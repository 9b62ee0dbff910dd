//! `{{ key }}` placeholders filled from the Test Data block.
//!
//! Matching is a literal string search, so keys may contain spaces and
//! punctuation that a template expression would reject. The search runs
//! on rendered HTML, where `&`, `<`, `>` and quotes in a key have been
//! turned into entities, so the escaped spellings are matched too.

use models::TestData;
use serde_json::Value;

use crate::markdown::escape_html;

const OPEN: &str = "{{";

/// Replace every `{{ key }}` whose key is in `data` with the value in
/// inline code. Unknown placeholders stay as they are.
pub fn substitute_tokens(html: &str, data: &TestData) -> String {
    if !html.contains(OPEN) || data.is_empty() {
        return html.to_string();
    }
    let mut out = html.to_string();
    for (key, value) in data.iter() {
        let code = format!("<code>{}</code>", escape_html(&display_value(value)));
        for spelling in key_spellings(key) {
            let token = format!("{{{{ {spelling} }}}}");
            if out.contains(&token) {
                out = out.replace(&token, &code);
            }
        }
    }
    out
}

/// The key as written plus the ways HTML serializers escape it: text
/// nodes escape `&<>`, the markdown renderer also escapes `"`.
fn key_spellings(key: &str) -> Vec<String> {
    let text = key
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    let quoted = text.replace('"', "&quot;");
    let mut spellings = vec![key.to_string(), text, quoted, escape_html(key)];
    spellings.sort();
    spellings.dedup();
    spellings
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
