//! Command-line parsing for the sales report generator.
//!
//! Argument parsing and command dispatch stay separate from the pipeline
//! code; every flag here has an environment-variable fallback resolved in
//! `app::config_from_args`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "salesrep", version, about = "Watch a folder for sales files and generate Word/PDF reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch the input directory and report on every new sales file (default).
    Watch(WatchArgs),
    /// Run the report pipeline once for a single file.
    Run(RunArgs),
    /// Print the metrics for a file without writing any artifacts.
    Summary(SummaryArgs),
}

/// Output locations shared by `watch` and `run`.
#[derive(Debug, Args, Clone, Default)]
pub struct OutputArgs {
    /// Directory that receives processed source files [env: SALES_ARCHIVE_DIR].
    #[arg(long, value_name = "DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Directory for the chart and reports [env: SALES_OUTPUT_DIR].
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// TrueType font used for chart text [env: SALES_CHART_FONT].
    #[arg(long, value_name = "TTF")]
    pub chart_font: Option<PathBuf>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct WatchArgs {
    /// Directory to watch recursively [env: SALES_INPUT_DIR].
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Only files whose name starts with this are processed [env: SALES_FILE_PREFIX].
    #[arg(long)]
    pub prefix: Option<String>,

    /// Milliseconds to wait after a file appears before reading it [env: SALES_SETTLE_MS].
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,

    /// Also process matching files already present at startup.
    #[arg(long)]
    pub process_existing: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Sales CSV file to process.
    pub file: PathBuf,

    /// Leave the source file in place instead of archiving it.
    #[arg(long)]
    pub no_archive: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    /// Sales CSV file to summarize.
    pub file: PathBuf,

    /// Print the metrics as JSON.
    #[arg(long)]
    pub json: bool,
}
