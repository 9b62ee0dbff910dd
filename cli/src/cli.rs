use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mantest")]
#[command(version)]
#[command(about = "Compile markdown manual test cases into a printable test suite")]
pub struct Cli {
    /// the project file (default: $MANTEST_CONFIG, then ./mantest.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// log pipeline details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// the command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Which documents to include.
#[derive(Args, Clone, Debug, Default)]
pub struct Selection {
    /// only compile this suite (repeatable)
    #[arg(short, long = "suite")]
    pub suites: Vec<String>,

    /// only compile the test case with this id (repeatable)
    #[arg(long = "id")]
    pub ids: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the assembled HTML test suite
    Compile {
        #[command(flatten)]
        selection: Selection,

        /// the output file, `-` for stdout
        #[arg(short, long, default_value = "suite.html")]
        output: String,

        /// skip failing test cases instead of stopping
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Render the test suite to PDF with wkhtmltopdf
    Pdf {
        #[command(flatten)]
        selection: Selection,

        /// the output file
        #[arg(short, long, default_value = "suite.pdf")]
        output: PathBuf,

        /// replace an existing output file
        #[arg(long)]
        overwrite: bool,

        /// skip failing test cases instead of stopping
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Check every test case against the schema
    Validate {
        #[command(flatten)]
        selection: Selection,
    },

    /// Show the print options derived from the page descriptor
    PrintConfig {},

    /// List the configured suites
    Suites {},
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
