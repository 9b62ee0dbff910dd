use std::path::Path;

/// Per-document transformation callbacks.
///
/// Every registered hook is called at every stage, in registration
/// order. The defaults return their input unchanged, so a hook only
/// implements the stages it cares about.
pub trait DocumentHook {
    /// Raw file contents, before the frontmatter is split off.
    fn on_load(&self, raw: String, _path: &Path) -> String {
        raw
    }

    /// The markdown body after link and section rewriting.
    fn on_markdown(&self, markdown: String, _path: &Path) -> String {
        markdown
    }

    /// The finished HTML fragment, after token substitution.
    fn on_html(&self, html: String, _path: &Path) -> String {
        html
    }
}

/// Run `stage` of every hook over `value`, feeding each hook the previous
/// one's output.
pub(crate) fn apply<F>(hooks: &[Box<dyn DocumentHook>], value: String, mut stage: F) -> String
where
    F: FnMut(&dyn DocumentHook, String) -> String,
{
    hooks.iter().fold(value, |acc, hook| stage(hook.as_ref(), acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;
    impl DocumentHook for Upper {
        fn on_html(&self, html: String, _path: &Path) -> String {
            html.to_uppercase()
        }
    }

    struct Suffix(&'static str);
    impl DocumentHook for Suffix {
        fn on_html(&self, html: String, _path: &Path) -> String {
            html + self.0
        }
    }

    #[test]
    fn hooks_run_in_order_and_default_to_identity() {
        let hooks: Vec<Box<dyn DocumentHook>> = vec![Box::new(Upper), Box::new(Suffix("!"))];
        let path = Path::new("a.md");

        let html = apply(&hooks, "<p>hi</p>".into(), |h, v| h.on_html(v, path));
        assert_eq!(html, "<P>HI</P>!");

        let md = apply(&hooks, "# t".into(), |h, v| h.on_markdown(v, path));
        assert_eq!(md, "# t");
    }
}
