//! Print layout for the PDF renderer, derived from the `pdf.xml` page
//! descriptor.
//!
//! The descriptor is a template rendering to a small XML tree:
//!
//! ```xml
//! <page style="margin-top: 0.5in; margin-bottom: 0.5in">
//!   <header style="margin-bottom: 1in; font-family: Helvetica, Arial; font-size: 9pt">
//!     <left>{{ project.name }}</left>
//!     <right>Page {{ page_number }} of {{ total_pages }}</right>
//!   </header>
//!   <footer style="font-size: 8pt"><center>Confidential</center></footer>
//! </page>
//! ```

use std::collections::HashMap;

use minijinja::context;
use models::{PrintBand, PrintConfig, PrintLayout};
use roxmltree::{Document, Node};

use crate::error::{CompileError, Result};
use crate::templates::{PAGE_DESCRIPTOR_TEMPLATE, Templates};

const MM_PER_INCH: f64 = 25.4;
/// The renderer draws the header gap larger than declared.
const HEADER_SPACING_FACTOR: f64 = 0.66;

/// Placeholders the renderer swaps for the current and last page number.
const PAGE_NUMBER: &str = "[page]";
const TOTAL_PAGES: &str = "[toPage]";

/// Derive the print configuration for a project.
///
/// Without a descriptor the default (forms enabled, no layout) is
/// returned. Missing style declarations produce zero or empty values.
pub fn derive(templates: &Templates, project_name: &str) -> Result<PrintConfig> {
    if !templates.exists(PAGE_DESCRIPTOR_TEMPLATE)? {
        tracing::debug!("no page descriptor, using default print config");
        return Ok(PrintConfig::default());
    }
    let xml = templates.render(
        PAGE_DESCRIPTOR_TEMPLATE,
        context! {
            page_number => PAGE_NUMBER,
            total_pages => TOTAL_PAGES,
            project => context! { name => project_name },
        },
    )?;
    Ok(PrintConfig::with_layout(parse_descriptor(&xml)?))
}

/// Build the layout from rendered descriptor XML.
pub fn parse_descriptor(xml: &str) -> Result<PrintLayout> {
    let doc = Document::parse(xml.trim()).map_err(|e| {
        CompileError::Config(format!("{PAGE_DESCRIPTOR_TEMPLATE} is not well-formed: {e}"))
    })?;
    let page = doc.root_element();
    let header = child(page, "header");
    let footer = child(page, "footer");

    let page_style = style_of(Some(page));
    let header_style = style_of(header);

    let header_spacing =
        round2(inches_to_mm(declaration(&header_style, "margin-bottom")) * HEADER_SPACING_FACTOR);
    let margin_top = round2(inches_to_mm(declaration(&page_style, "margin-top")) + header_spacing);

    Ok(PrintLayout {
        margin_top,
        margin_bottom: inches_to_mm(declaration(&page_style, "margin-bottom")),
        header_spacing,
        header: band(header),
        footer: band(footer),
    })
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn band(node: Option<Node<'_, '_>>) -> PrintBand {
    let style = style_of(node);
    let text = |name: &str| node.and_then(|n| child(n, name)).map(text_of).unwrap_or_default();
    PrintBand {
        left: text("left"),
        center: text("center"),
        right: text("right"),
        font_size: int_value(declaration(&style, "font-size")),
        font_name: first_font(declaration(&style, "font-family")),
    }
}

fn text_of(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn style_of(node: Option<Node<'_, '_>>) -> HashMap<String, String> {
    node.and_then(|n| n.attribute("style"))
        .map(parse_style)
        .unwrap_or_default()
}

fn declaration<'a>(style: &'a HashMap<String, String>, property: &str) -> &'a str {
    style.get(property).map(String::as_str).unwrap_or_default()
}

/// Parse an inline `style` attribute. A property declared twice keeps
/// its last value.
pub fn parse_style(style: &str) -> HashMap<String, String> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// `"0.5in"` -> `12.7`. Everything but digits and `.` is ignored, and
/// the number is taken as inches.
pub fn inches_to_mm(value: &str) -> f64 {
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    round2(digits.parse::<f64>().unwrap_or(0.0) * MM_PER_INCH)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Leading integer of a value, `0` when there is none.
pub fn int_value(value: &str) -> i64 {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse().unwrap_or(0)
}

/// First font of a `font-family` stack, without quotes.
pub fn first_font(value: &str) -> String {
    value
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .to_string()
}
