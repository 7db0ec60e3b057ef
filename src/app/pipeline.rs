//! The per-file report pipeline shared by the watch loop and `salesrep run`.
//!
//! extract metrics -> chart -> Word report -> PDF report -> archive
//!
//! Extraction runs before anything is written, so a bad file leaves no
//! artifacts behind. Archiving runs last; if it fails, the reports already
//! written stay in place and the source file stays where it was.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::{ChartArtifact, GroupTotal, MetricsResult, ReportArtifact, ReportConfig};
use crate::error::PipelineError;

/// Knobs that vary per invocation rather than per deployment.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Date stamped into titles and file names.
    pub report_date: NaiveDate,
    /// Move the source file to the archive after reporting.
    pub archive: bool,
}

impl RunOptions {
    pub fn today() -> Self {
        Self {
            report_date: chrono::Local::now().date_naive(),
            archive: true,
        }
    }
}

/// Everything produced for one input file.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub metrics: MetricsResult,
    pub chart: ChartArtifact,
    pub reports: Vec<ReportArtifact>,
    pub archived_to: Option<PathBuf>,
}

/// Parse a sales file and aggregate it. Writes nothing.
pub fn extract_metrics(path: &Path) -> Result<MetricsResult, PipelineError> {
    log::info!("Loading sales file: {}", path.display());
    let records = crate::io::load_sales_records(path)?;
    log::info!("Loaded {} records; calculating metrics", records.len());
    Ok(crate::report::compute_metrics(&records))
}

/// Run the full pipeline for one file.
pub fn process_file(path: &Path, config: &ReportConfig, options: RunOptions) -> Result<RunOutput, PipelineError> {
    let metrics = extract_metrics(path)?;
    log::info!(
        "Total sales {} across {} regions and {} categories",
        crate::report::format_currency(metrics.total_sales),
        metrics.sales_by_region.len(),
        metrics.sales_by_category.len()
    );
    log_group_rows("Region", &metrics.sales_by_region);
    log_group_rows("Category", &metrics.sales_by_category);

    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        PipelineError::render(&config.output_dir, format!("Failed to create output dir: {e}"))
    })?;

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let chart = crate::plot::render_region_chart(
        &metrics.sales_by_region,
        &config.output_dir,
        config.chart_font.as_deref(),
    )?;
    let word = crate::report::write_word_report(&metrics, &chart, &source_name, options.report_date, &config.output_dir)?;
    let pdf = crate::report::write_pdf_report(&metrics, &chart, &source_name, options.report_date, &config.output_dir)?;
    log::info!("All reports generated for {source_name}");

    let archived_to = if options.archive {
        log::info!("Archiving processed file: {source_name}");
        let dest = crate::io::archive_file(path, &config.archive_dir)?;
        log::info!("Archived to {}", dest.display());
        Some(dest)
    } else {
        None
    };

    Ok(RunOutput {
        metrics,
        chart,
        reports: vec![word, pdf],
        archived_to,
    })
}

fn log_group_rows(label: &str, groups: &[GroupTotal]) {
    for line in group_log_lines(label, groups) {
        log::info!("{line}");
    }
}

/// One log line per aggregate row, in metrics order.
fn group_log_lines(label: &str, groups: &[GroupTotal]) -> Vec<String> {
    crate::report::format::table_rows(groups)
        .into_iter()
        .map(|(key, amount)| format!("{label} {key}: ${amount}"))
        .collect()
}
