use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Options handed to the external PDF renderer.
///
/// Without a page-layout descriptor only the form flag is set.
#[derive(Clone, Debug, PartialEq)]
pub struct PrintConfig {
    pub enable_forms: bool,
    pub layout: Option<PrintLayout>,
}

/// Margins and running header/footer derived from the page descriptor.
/// Lengths are millimetres.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrintLayout {
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub header_spacing: f64,
    pub header: PrintBand,
    pub footer: PrintBand,
}

/// A running header or footer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrintBand {
    pub left: String,
    pub center: String,
    pub right: String,
    pub font_size: i64,
    pub font_name: String,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            enable_forms: true,
            layout: None,
        }
    }
}

impl PrintConfig {
    pub fn with_layout(layout: PrintLayout) -> Self {
        Self {
            layout: Some(layout),
            ..Self::default()
        }
    }

    /// The flat option mapping, keyed by renderer option name.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(layout) = &self.layout {
            map.insert("margin-top".into(), layout.margin_top.into());
            map.insert("margin-bottom".into(), layout.margin_bottom.into());
            map.insert("header-spacing".into(), layout.header_spacing.into());
            insert_band(&mut map, "header", &layout.header);
            insert_band(&mut map, "footer", &layout.footer);
        }
        if self.enable_forms {
            map.insert("enable-forms".into(), Value::Bool(true));
        }
        map
    }

    /// Command-line arguments for the renderer, e.g.
    /// `["--margin-top", "29.46", ..., "--enable-forms"]`.
    ///
    /// Empty text options are left out.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (key, value) in self.to_map() {
            match value {
                Value::Bool(true) => args.push(format!("--{key}")),
                Value::Bool(false) | Value::Null => {}
                Value::String(s) if s.is_empty() => {}
                Value::String(s) => {
                    args.push(format!("--{key}"));
                    args.push(s);
                }
                other => {
                    args.push(format!("--{key}"));
                    args.push(other.to_string());
                }
            }
        }
        args
    }
}

fn insert_band(map: &mut Map<String, Value>, prefix: &str, band: &PrintBand) {
    map.insert(format!("{prefix}-left"), band.left.clone().into());
    map.insert(format!("{prefix}-center"), band.center.clone().into());
    map.insert(format!("{prefix}-right"), band.right.clone().into());
    map.insert(format!("{prefix}-font-size"), band.font_size.into());
    map.insert(format!("{prefix}-font-name"), band.font_name.clone().into());
}

impl Serialize for PrintConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> PrintLayout {
        PrintLayout {
            margin_top: 29.46,
            margin_bottom: 12.7,
            header_spacing: 16.76,
            header: PrintBand {
                left: "Acme".into(),
                center: String::new(),
                right: "[page] / [toPage]".into(),
                font_size: 9,
                font_name: "Helvetica".into(),
            },
            footer: PrintBand::default(),
        }
    }

    #[test]
    fn default_has_only_the_form_flag() {
        let map = PrintConfig::default().to_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("enable-forms"), Some(&Value::Bool(true)));
    }

    #[test]
    fn layout_produces_every_option_key() {
        let map = PrintConfig::with_layout(sample_layout()).to_map();
        for key in [
            "margin-top",
            "margin-bottom",
            "header-spacing",
            "header-left",
            "header-center",
            "header-right",
            "footer-left",
            "footer-center",
            "footer-right",
            "header-font-size",
            "header-font-name",
            "footer-font-size",
            "footer-font-name",
            "enable-forms",
        ] {
            assert!(map.contains_key(key), "missing {key}");
        }
        assert_eq!(map["margin-top"], serde_json::json!(29.46));
    }

    #[test]
    fn args_skip_empty_text_and_keep_numbers() {
        let args = PrintConfig::with_layout(sample_layout()).to_args();
        let joined = args.join(" ");
        assert!(joined.contains("--margin-top 29.46"));
        assert!(joined.contains("--header-right [page] / [toPage]"));
        assert!(joined.contains("--header-font-size 9"));
        assert!(!joined.contains("--header-center"));
        assert!(!joined.contains("--footer-font-name"));
        assert_eq!(args.last().map(String::as_str), Some("--enable-forms"));
    }
}
