//! Markdown rendering and fenced-block extraction.

use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use serde_json::Value;

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre><code[^>]*>(.+?)</code></pre>").expect("code block pattern")
});

/// Render CommonMark (plus tables and strikethrough) to HTML.
pub fn render(markdown: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, opts);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// The text of the first `<pre><code>` block in rendered HTML, with the
/// renderer's entity escaping undone.
pub fn first_code_block(html: &str) -> Option<String> {
    CODE_BLOCK_RE
        .captures(html)
        .map(|caps| unescape_html(&caps[1]))
}

/// Parse the first fenced block of rendered HTML as YAML.
///
/// `Ok(Value::Null)` when there is no block at all.
pub fn parse_code_block_yaml(html: &str) -> Result<Value, serde_yaml::Error> {
    match first_code_block(html) {
        Some(text) => serde_yaml::from_str(&text),
        None => Ok(Value::Null),
    }
}

fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Escape text for use inside HTML element content or attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
