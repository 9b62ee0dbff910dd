//! Rewrites applied to the markdown body before and the HTML right after
//! rendering.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static AUTOLINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/(?:[^/<>\s][^<>\s]*)?)>").expect("autolink pattern"));

static LINK_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\]\((/(?:[^/)\s][^)\s]*)?)([)\s])").expect("link target pattern")
});

static TEST_DATA_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^##[ \t]*Test Data\b").expect("test data heading"));

static TEST_EXECUTION_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^##[ \t]*Test Execution\b").expect("test execution heading")
});

static SRC_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bsrc="([^"]+)""#).expect("src attribute"));

/// `</name>` with a tag-shaped name is an HTML closing tag, not a link.
/// Site paths that need rewriting in autolink form must have a second
/// segment or a character a tag name cannot hold (`</user/login>`,
/// `</login.html>`).
fn is_closing_tag(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next().is_some_and(|c: char| c.is_ascii_alphabetic())
        && chars.all(|c: char| c.is_ascii_alphanumeric() || c == '-')
}

/// Apply both body rewrites: site-relative links become absolute against
/// `base_url`, and a `## Test Data` heading is added where missing.
pub fn rewrite(markdown: &str, base_url: &str) -> String {
    let markdown = absolutize_links(markdown, base_url);
    ensure_test_data_section(&markdown)
}

/// Prefix `base_url` to `</path>` autolinks and `](/path)` link targets.
///
/// Absolute, protocol-relative (`//host`) and document-relative links
/// are left alone.
pub fn absolutize_links(markdown: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let out = AUTOLINK_RE.replace_all(markdown, |caps: &Captures| {
        let path = &caps[1];
        if is_closing_tag(&path[1..]) {
            caps[0].to_string()
        } else {
            format!("<{base}{path}>")
        }
    });
    LINK_TARGET_RE
        .replace_all(&out, |caps: &Captures| format!("]({base}{}{}", &caps[1], &caps[2]))
        .into_owned()
}

/// Insert `## Test Data` right before `## Test Execution` when the body
/// has no Test Data heading. Bodies without a Test Execution heading are
/// returned unchanged.
pub fn ensure_test_data_section(markdown: &str) -> String {
    if TEST_DATA_HEADING_RE.is_match(markdown) {
        return markdown.to_string();
    }
    match TEST_EXECUTION_HEADING_RE.find(markdown) {
        Some(m) => {
            let mut out = String::with_capacity(markdown.len() + 16);
            out.push_str(&markdown[..m.start()]);
            out.push_str("## Test Data\n\n");
            out.push_str(&markdown[m.start()..]);
            out
        }
        None => markdown.to_string(),
    }
}

/// Point relative `src="..."` attributes at the document's directory so
/// the PDF renderer can find images next to the source file.
pub fn resolve_relative_sources(html: &str, document_dir: &Path) -> String {
    SRC_ATTR_RE
        .replace_all(html, |caps: &Captures| {
            let src = &caps[1];
            if is_relative_reference(src) {
                format!("src=\"{}\"", document_dir.join(src).display())
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn is_relative_reference(src: &str) -> bool {
    !(src.starts_with('/')
        || src.starts_with('#')
        || src.starts_with("data:")
        || src.contains("://"))
}
