use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::process::Command;

use models::PrintConfig;
use tempfile::TempDir;

use crate::error::{CompileError, Result};

const RENDERER: &str = "wkhtmltopdf";

// ───────────────────────── PDF rendering ─────────────────────────

/// Render `html` to `output` with wkhtmltopdf.
///
/// An existing `output` is left untouched unless `overwrite` is set;
/// returns whether a file was written.
pub fn save_pdf(html: &str, config: &PrintConfig, output: &Path, overwrite: bool) -> Result<bool> {
    if output.exists() && !overwrite {
        tracing::warn!(path = %output.display(), "output exists, not overwriting");
        return Ok(false);
    }

    let renderer = find_wkhtmltopdf().ok_or(CompileError::RendererNotFound)?;

    let tmp = TempDir::with_prefix("mantest_")?;
    let page = tmp.path().join("suite.html");
    let pdf = tmp.path().join("suite.pdf");
    fs::write(&page, html)?;

    tracing::debug!(renderer = %renderer, args = ?config.to_args(), "running PDF renderer");
    let result = Command::new(&renderer)
        .args(renderer_args(config, &page, &pdf))
        .output()?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let tail: Vec<_> = stderr.lines().rev().take(20).collect();
        return Err(CompileError::Render(format!(
            "{RENDERER} failed ({}):\n{}",
            result.status,
            tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
        )));
    }
    if !pdf.exists() {
        return Err(CompileError::Render(format!(
            "{RENDERER} exited successfully but produced no PDF"
        )));
    }

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&pdf, output)?;
    Ok(true)
}

/// Full argument list: the print options, then input and output.
fn renderer_args(config: &PrintConfig, input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--quiet".into(), "--enable-local-file-access".into()];
    args.extend(config.to_args().into_iter().map(OsString::from));
    args.push(input.into());
    args.push(output.into());
    args
}

/// Search for `wkhtmltopdf` in `$PATH` and common install locations.
fn find_wkhtmltopdf() -> Option<String> {
    if let Ok(output) = Command::new("which").arg(RENDERER).output() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() && output.status.success() {
            return Some(path);
        }
    }

    let candidates = [
        "/usr/bin/wkhtmltopdf",
        "/usr/local/bin/wkhtmltopdf",
        "/opt/homebrew/bin/wkhtmltopdf",
        "/opt/wkhtmltox/bin/wkhtmltopdf",
    ];
    candidates
        .iter()
        .find(|c| Path::new(c).exists())
        .map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{PrintBand, PrintLayout};

    #[test]
    fn existing_output_is_kept_without_overwrite() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("suite.pdf");
        fs::write(&out, b"old").unwrap();

        let written = save_pdf("<html></html>", &PrintConfig::default(), &out, false).unwrap();
        assert!(!written);
        assert_eq!(fs::read(&out).unwrap(), b"old");
    }

    #[test]
    fn args_end_with_input_and_output() {
        let config = PrintConfig::with_layout(PrintLayout {
            margin_top: 29.46,
            header: PrintBand {
                left: "Acme".into(),
                ..PrintBand::default()
            },
            ..PrintLayout::default()
        });
        let args = renderer_args(&config, Path::new("in.html"), Path::new("out.pdf"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(&args[args.len() - 2..], ["in.html", "out.pdf"]);
        let joined = args.join(" ");
        assert!(joined.contains("--margin-top 29.46"));
        assert!(joined.contains("--header-left Acme"));
        assert!(joined.contains("--enable-forms"));
    }
}
