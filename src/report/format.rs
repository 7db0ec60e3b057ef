//! Text formatting shared by the Word and PDF reports and the terminal
//! summary.
//!
//! Keeping all wording and number formatting here means both documents
//! always show identical figures.

use chrono::NaiveDate;

use crate::domain::{GroupTotal, MetricsResult, ReportFormat};

pub const HEADING_SUMMARY: &str = "Executive Summary";
pub const HEADING_REGION: &str = "Sales Performance by Region";
pub const HEADING_CATEGORY: &str = "Sales Performance by Category";
pub const REGION_CHART_INTRO: &str =
    "The bar chart below illustrates the sales distribution across different regions.";
pub const REGION_TABLE_INTRO: &str = "The table below provides the detailed sales figures for each region.";
pub const CATEGORY_TABLE_INTRO: &str =
    "The table below provides the detailed sales figures for each product category.";
pub const AMOUNT_HEADER: &str = "Total Sales ($)";
pub const REGION_HEADER: &str = "Region";
pub const CATEGORY_HEADER: &str = "Category";

/// Format an amount with thousands separators and two decimals: `1,234.50`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0.00" is not useful in a report.
    let negative = value < 0.0 && fixed.bytes().any(|b| (b'1'..=b'9').contains(&b));
    if negative {
        format!("-{grouped}.{frac_part}")
    } else {
        format!("{grouped}.{frac_part}")
    }
}

pub fn report_title(date: NaiveDate) -> String {
    format!("Sales Report - {}", date.format("%Y-%m-%d"))
}

/// `Sales_Report_<YYYY-MM-DD>.<ext>`; one file per day and format.
pub fn report_file_name(date: NaiveDate, format: ReportFormat) -> String {
    format!("Sales_Report_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

pub fn summary_paragraph(metrics: &MetricsResult, source_name: &str) -> String {
    format!(
        "This report provides an analysis of the sales data in {source_name}. \
         The total sales figure across all regions and categories is ${}.",
        format_currency(metrics.total_sales)
    )
}

/// Table body rows as `(label, formatted amount)`.
pub fn table_rows(groups: &[GroupTotal]) -> Vec<(String, String)> {
    groups
        .iter()
        .map(|g| (g.key.clone(), format_currency(g.total)))
        .collect()
}

/// Plain-text summary for the terminal/log.
pub fn format_run_summary(metrics: &MetricsResult, source_name: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Sales summary: {source_name} ===\n"));
    out.push_str(&format!("Records: {}\n", metrics.record_count));
    out.push_str(&format!("Total sales: ${}\n", format_currency(metrics.total_sales)));

    out.push_str("\nBy region:\n");
    out.push_str(&format_group_table(&metrics.sales_by_region, REGION_HEADER));

    out.push_str("\nBy category:\n");
    out.push_str(&format_group_table(&metrics.sales_by_category, CATEGORY_HEADER));

    out.push_str("\nBy month:\n");
    for (month, total) in &metrics.sales_by_month {
        out.push_str(&format!("{:<24} {:>16}\n", month.to_string(), format_currency(*total)));
    }

    out
}

fn format_group_table(groups: &[GroupTotal], label: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<24} {:>16}\n", label, AMOUNT_HEADER));
    out.push_str(&format!("{:-<24} {:-<16}\n", "", ""));
    for (key, amount) in table_rows(groups) {
        out.push_str(&format!("{:<24} {:>16}\n", truncate(&key, 24), amount));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
