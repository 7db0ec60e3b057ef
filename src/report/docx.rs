//! Word report renderer.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use docx_rs::{
    AlignmentType, Docx, Paragraph, Pic, Run, Style, StyleType, Table, TableCell, TableRow, WidthType,
};

use crate::domain::{ChartArtifact, GroupTotal, MetricsResult, ReportArtifact, ReportFormat};
use crate::error::PipelineError;
use crate::report::format::{
    self, AMOUNT_HEADER, CATEGORY_HEADER, CATEGORY_TABLE_INTRO, HEADING_CATEGORY, HEADING_REGION, HEADING_SUMMARY,
    REGION_CHART_INTRO, REGION_HEADER, REGION_TABLE_INTRO,
};

const EMU_PER_INCH: f64 = 914_400.0;
const CHART_WIDTH_IN: f64 = 6.0;
// Table column widths in twentieths of a point.
const LABEL_COL_DXA: usize = 5600;
const AMOUNT_COL_DXA: usize = 3400;

/// Write `Sales_Report_<date>.docx` into `output_dir`, replacing any report
/// from the same day.
pub fn write_word_report(
    metrics: &MetricsResult,
    chart: &ChartArtifact,
    source_name: &str,
    date: NaiveDate,
    output_dir: &Path,
) -> Result<ReportArtifact, PipelineError> {
    let path = output_dir.join(format::report_file_name(date, ReportFormat::Docx));
    log::info!("Generating Word report: {}", path.display());

    let chart_bytes = std::fs::read(&chart.path).map_err(|e| {
        PipelineError::render(&path, format!("Failed to read chart '{}': {e}", chart.path.display()))
    })?;

    let docx = build_document(metrics, chart, chart_bytes, source_name, date);
    let file = File::create(&path).map_err(|e| PipelineError::render(&path, e.to_string()))?;
    docx.build()
        .pack(file)
        .map_err(|e| PipelineError::render(&path, format!("Failed to write document: {e}")))?;

    log::info!("Word report saved to {}", path.display());
    Ok(ReportArtifact {
        format: ReportFormat::Docx,
        path,
    })
}

/// Assemble the report in memory; `chart_png` is embedded as-is.
pub fn build_document(
    metrics: &MetricsResult,
    chart: &ChartArtifact,
    chart_png: Vec<u8>,
    source_name: &str,
    date: NaiveDate,
) -> Docx {
    let chart_width_emu = (CHART_WIDTH_IN * EMU_PER_INCH) as u32;
    let chart_height_emu = (CHART_WIDTH_IN * chart.aspect_ratio() * EMU_PER_INCH) as u32;
    let picture = Pic::new_with_dimensions(chart_png, chart.width_px, chart.height_px)
        .size(chart_width_emu, chart_height_emu);

    with_heading_styles(Docx::new())
        .add_paragraph(heading(&format::report_title(date), "Heading1"))
        .add_paragraph(heading(HEADING_SUMMARY, "Heading2"))
        .add_paragraph(text(&format::summary_paragraph(metrics, source_name)))
        .add_paragraph(Paragraph::new())
        .add_paragraph(heading(HEADING_REGION, "Heading2"))
        .add_paragraph(text(REGION_CHART_INTRO))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_image(picture)))
        .add_paragraph(text(REGION_TABLE_INTRO))
        .add_table(totals_table(REGION_HEADER, &metrics.sales_by_region))
        .add_paragraph(Paragraph::new())
        .add_paragraph(heading(HEADING_CATEGORY, "Heading2"))
        .add_paragraph(text(CATEGORY_TABLE_INTRO))
        .add_table(totals_table(CATEGORY_HEADER, &metrics.sales_by_category))
}

fn with_heading_styles(docx: Docx) -> Docx {
    docx.add_style(
        Style::new("Heading1", StyleType::Paragraph)
            .name("Heading 1")
            .size(32)
            .bold()
            .color("2F5496"),
    )
    .add_style(
        Style::new("Heading2", StyleType::Paragraph)
            .name("Heading 2")
            .size(26)
            .bold()
            .color("2F5496"),
    )
}

fn heading(s: &str, style_id: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(s)).style(style_id)
}

fn text(s: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(s))
}

fn totals_table(label_header: &str, groups: &[GroupTotal]) -> Table {
    let mut rows = Vec::with_capacity(groups.len() + 1);
    rows.push(TableRow::new(vec![
        cell(Run::new().add_text(label_header).bold(), LABEL_COL_DXA, AlignmentType::Left),
        cell(Run::new().add_text(AMOUNT_HEADER).bold(), AMOUNT_COL_DXA, AlignmentType::Left),
    ]));
    for (label, amount) in format::table_rows(groups) {
        rows.push(TableRow::new(vec![
            cell(Run::new().add_text(label), LABEL_COL_DXA, AlignmentType::Left),
            cell(Run::new().add_text(amount), AMOUNT_COL_DXA, AlignmentType::Right),
        ]));
    }
    Table::new(rows).set_grid(vec![LABEL_COL_DXA, AMOUNT_COL_DXA])
}

fn cell(run: Run, width: usize, align: AlignmentType) -> TableCell {
    TableCell::new()
        .add_paragraph(Paragraph::new().add_run(run).align(align))
        .width(width, WidthType::Dxa)
}
