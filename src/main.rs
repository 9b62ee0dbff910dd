use std::io::{self, Write};
use std::process;

#[macro_use]
mod log;

use cli::{Commands, Selection, parse_args};
use compiler::{
    CompileError, Compiler, FailurePolicy, ProjectConfig, id_filter, suite_filter, suite_names,
};
use models::SuiteReport;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        error!("{e}");
        process::exit(1);
    }
}

fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();
    init_tracing(args.verbose);

    let config = ProjectConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Suites {} => {
            let compiler = Compiler::new(config)?;
            let sources = match compiler.sources() {
                Err(CompileError::NoSources) => Vec::new(),
                other => other?,
            };
            for name in suite_names(&compiler.config().suites) {
                let count = sources.iter().filter(|s| s.suite == name).count();
                info!("{} ({} test case(s))", name, count);
            }
        }

        Commands::PrintConfig {} => {
            let compiler = Compiler::new(config)?;
            let print = compiler.print_config()?;
            println!("{}", serde_json::to_string_pretty(&print)?);
        }

        Commands::Validate { selection } => {
            let compiler = select(Compiler::new(config)?, selection);
            let summary = compiler.validate_all()?;
            for failure in &summary.failures {
                error!("{failure}");
            }
            if !summary.failures.is_empty() {
                return Err(format!(
                    "{} of {} test case(s) failed validation",
                    summary.failures.len(),
                    summary.checked
                )
                .into());
            }
            success!("{} test case(s) valid", summary.checked);
        }

        Commands::Compile { selection, output, keep_going } => {
            let compiler = prepare(config, selection, keep_going)?;
            let report = compile(&compiler)?;
            let page = compiler.render_page(&report)?;

            if output == "-" {
                io::stdout().write_all(page.as_bytes())?;
            } else {
                summarize(&report);
                std::fs::write(&output, &page)?;
                success!("Test suite written to {}", output);
            }
        }

        Commands::Pdf { selection, output, overwrite, keep_going } => {
            let compiler = prepare(config, selection, keep_going)?;
            let report = compile(&compiler)?;
            summarize(&report);
            let page = compiler.render_page(&report)?;

            if compiler::save_pdf(&page, &report.print, &output, overwrite)? {
                success!("Test suite written to {}", output.display());
            } else {
                warn!(
                    "{} already exists, use --overwrite to replace it",
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn prepare(
    config: ProjectConfig,
    selection: Selection,
    keep_going: bool,
) -> Result<Compiler, CompileError> {
    let mut compiler = select(Compiler::new(config)?, selection);
    if keep_going {
        compiler.set_failure_policy(FailurePolicy::Skip);
    }
    Ok(compiler)
}

/// Apply the `--suite` / `--id` filters.
fn select(mut compiler: Compiler, selection: Selection) -> Compiler {
    if !selection.suites.is_empty() {
        compiler.add_filter(suite_filter(selection.suites));
    }
    if !selection.ids.is_empty() {
        compiler.add_filter(id_filter(selection.ids));
    }
    compiler
}

/// Compile and report skipped documents; an empty suite is an error.
fn compile(
    compiler: &Compiler,
) -> std::result::Result<SuiteReport<CompileError>, Box<dyn std::error::Error>> {
    let report = compiler.compile()?;
    for failure in &report.failures {
        warn!("Skipped: {failure}");
    }
    if report.testcase_count() == 0 {
        return Err("No test cases match the given filters".into());
    }
    Ok(report)
}

fn summarize(report: &SuiteReport<CompileError>) {
    info!(
        "Compiled {} test case(s) in {} suite(s)",
        report.testcase_count(),
        report.suites.len()
    );
}
