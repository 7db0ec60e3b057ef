//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initialises logging
//! - parses CLI arguments
//! - resolves the runtime configuration (flag > env > default)
//! - dispatches to the watch loop, a one-shot run, or a summary

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::cli::{Command, OutputArgs, RunArgs, SummaryArgs, WatchArgs};
use crate::domain::{MetricsResult, ReportConfig};
use crate::error::{AppError, PipelineError};

pub mod pipeline;
pub mod watch;

pub const ENV_INPUT_DIR: &str = "SALES_INPUT_DIR";
pub const ENV_FILE_PREFIX: &str = "SALES_FILE_PREFIX";
pub const ENV_ARCHIVE_DIR: &str = "SALES_ARCHIVE_DIR";
pub const ENV_OUTPUT_DIR: &str = "SALES_OUTPUT_DIR";
pub const ENV_CHART_FONT: &str = "SALES_CHART_FONT";
pub const ENV_SETTLE_MS: &str = "SALES_SETTLE_MS";

/// Entry point for the `salesrep` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // `salesrep` and `salesrep --input-dir X` behave like `salesrep watch ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Watch(args) => handle_watch(args),
        Command::Run(args) => handle_run(args),
        Command::Summary(args) => handle_summary(args),
    }
}

fn handle_watch(args: WatchArgs) -> Result<(), AppError> {
    let config = config_from_args(&args, env_var)?;
    watch::run_watch(&config, args.process_existing)?;
    Ok(())
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = output_config_from_args(&args.output, env_var);
    let options = pipeline::RunOptions {
        archive: !args.no_archive,
        ..pipeline::RunOptions::today()
    };

    let out = pipeline::process_file(&args.file, &config, options)?;

    log::info!("Processed {} records from {}", out.metrics.record_count, args.file.display());
    for report in &out.reports {
        log::info!("Report: {}", report.path.display());
    }
    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let metrics = pipeline::extract_metrics(&args.file)?;

    if args.json {
        println!("{}", metrics_json(&metrics, &args.file)?);
    } else {
        let name = args.file.display().to_string();
        println!("{}", crate::report::format_run_summary(&metrics, &name));
    }
    Ok(())
}

fn metrics_json(metrics: &MetricsResult, source: &Path) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(metrics)
        .map_err(|e| PipelineError::render(source, format!("Failed to serialize metrics: {e}")))
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve configuration: explicit flag, then environment, then default.
pub fn config_from_args<E>(args: &WatchArgs, env: E) -> Result<ReportConfig, PipelineError>
where
    E: Fn(&str) -> Option<String>,
{
    let file_prefix = args
        .prefix
        .clone()
        .or_else(|| env(ENV_FILE_PREFIX))
        .unwrap_or_else(|| ReportConfig::DEFAULT_FILE_PREFIX.to_string());
    if file_prefix.is_empty() {
        return Err(PipelineError::config("File prefix must not be empty."));
    }

    let settle_ms = match args.settle_ms {
        Some(ms) => ms,
        None => match env(ENV_SETTLE_MS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                PipelineError::config(format!("{ENV_SETTLE_MS} must be a whole number of milliseconds, got '{raw}'."))
            })?,
            None => ReportConfig::DEFAULT_SETTLE_MS,
        },
    };

    Ok(ReportConfig {
        input_dir: path_or(&args.input_dir, ENV_INPUT_DIR, ReportConfig::DEFAULT_INPUT_DIR, &env),
        file_prefix,
        settle_delay: Duration::from_millis(settle_ms),
        ..output_config_from_args(&args.output, &env)
    })
}

/// Resolve only the output locations. Watch-only settings keep their
/// defaults, so a one-shot run never fails on them.
pub fn output_config_from_args<E>(args: &OutputArgs, env: E) -> ReportConfig
where
    E: Fn(&str) -> Option<String>,
{
    ReportConfig {
        archive_dir: path_or(&args.archive_dir, ENV_ARCHIVE_DIR, ReportConfig::DEFAULT_ARCHIVE_DIR, &env),
        output_dir: path_or(&args.output_dir, ENV_OUTPUT_DIR, ReportConfig::DEFAULT_OUTPUT_DIR, &env),
        chart_font: args.chart_font.clone().or_else(|| env(ENV_CHART_FONT).map(PathBuf::from)),
        ..ReportConfig::default()
    }
}

fn path_or<E>(flag: &Option<PathBuf>, key: &str, default: &str, env: &E) -> PathBuf
where
    E: Fn(&str) -> Option<String>,
{
    flag.clone()
        .or_else(|| env(key).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Rewrite argv so `salesrep` defaults to `salesrep watch`.
///
/// Rules:
/// - `salesrep`                      -> `salesrep watch`
/// - `salesrep --prefix x ...`       -> `salesrep watch --prefix x ...`
/// - `salesrep --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("watch".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "watch" | "run" | "summary");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "watch flags".
    if arg1.starts_with('-') {
        argv.insert(1, "watch".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn env_from(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn rewrite_defaults_to_watch() {
        assert_eq!(rewrite_args(argv(&["salesrep"])), argv(&["salesrep", "watch"]));
        assert_eq!(
            rewrite_args(argv(&["salesrep", "--prefix", "x"])),
            argv(&["salesrep", "watch", "--prefix", "x"])
        );
        assert_eq!(rewrite_args(argv(&["salesrep", "--help"])), argv(&["salesrep", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["salesrep", "run", "f.csv"])),
            argv(&["salesrep", "run", "f.csv"])
        );
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let config = config_from_args(&WatchArgs::default(), |_| None).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("data/incoming"));
        assert_eq!(config.file_prefix, "sales_");
        assert_eq!(config.archive_dir, PathBuf::from("data/archive"));
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.chart_font, None);
        assert_eq!(config.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn flags_override_env() {
        let env = env_from(&[
            (ENV_INPUT_DIR, "/env/in"),
            (ENV_FILE_PREFIX, "env_"),
            (ENV_OUTPUT_DIR, "/env/out"),
            (ENV_SETTLE_MS, "50"),
        ]);
        let args = WatchArgs {
            prefix: Some("flag_".to_string()),
            ..WatchArgs::default()
        };
        let config = config_from_args(&args, |k| env.get(k).cloned()).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("/env/in"));
        assert_eq!(config.file_prefix, "flag_");
        assert_eq!(config.output_dir, PathBuf::from("/env/out"));
        assert_eq!(config.settle_delay, Duration::from_millis(50));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let empty_prefix = WatchArgs {
            prefix: Some(String::new()),
            ..WatchArgs::default()
        };
        assert!(matches!(
            config_from_args(&empty_prefix, |_| None),
            Err(PipelineError::Config { .. })
        ));
        let env = env_from(&[(ENV_SETTLE_MS, "soon")]);
        assert!(matches!(
            config_from_args(&WatchArgs::default(), |k| env.get(k).cloned()),
            Err(PipelineError::Config { .. })
        ));
    }

    #[test]
    fn summary_json_has_totals() {
        let metrics = crate::report::compute_metrics(&[]);
        let json = metrics_json(&metrics, Path::new("sales_x.csv")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["record_count"], 0);
        assert!(value["sales_by_region"].as_array().unwrap().is_empty());
    }

    #[test]
    fn output_config_ignores_watch_settings() {
        let env = env_from(&[
            (ENV_SETTLE_MS, "soon"),
            (ENV_FILE_PREFIX, ""),
            (ENV_OUTPUT_DIR, "/env/out"),
        ]);
        let args = OutputArgs {
            archive_dir: Some(PathBuf::from("/flag/archive")),
            ..OutputArgs::default()
        };

        let config = output_config_from_args(&args, |k| env.get(k).cloned());

        assert_eq!(config.output_dir, PathBuf::from("/env/out"));
        assert_eq!(config.archive_dir, PathBuf::from("/flag/archive"));
        assert_eq!(config.settle_delay, Duration::from_millis(ReportConfig::DEFAULT_SETTLE_MS));
    }
}
