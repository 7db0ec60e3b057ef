//! Shared domain types.
//!
//! Everything here is created fresh for each incoming file and dropped once
//! the file has been reported on; nothing is persisted across runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar month derived from an order date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One parsed row of a sales file.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub order_date: NaiveDate,
    pub month: YearMonth,
    pub region: String,
    pub category: String,
    pub sales: f64,
}

/// Summed sales for one grouping key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
}

impl GroupTotal {
    pub fn new(key: impl Into<String>, total: f64) -> Self {
        Self {
            key: key.into(),
            total,
        }
    }
}

/// Aggregates computed from one sales file.
///
/// `sales_by_region` and `sales_by_category` are sorted by total, largest
/// first; equal totals keep the order in which the key first appeared.
/// `sales_by_month` is chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub total_sales: f64,
    pub sales_by_region: Vec<GroupTotal>,
    pub sales_by_category: Vec<GroupTotal>,
    pub sales_by_month: Vec<(YearMonth, f64)>,
    pub record_count: usize,
}

/// A rendered chart image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub path: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
}

impl ChartArtifact {
    /// Height / width, used to scale the image inside documents.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width_px == 0 {
            return 0.0;
        }
        self.height_px as f64 / self.width_px as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Docx,
    Pdf,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Docx => "docx",
            ReportFormat::Pdf => "pdf",
        }
    }
}

/// A written report document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub format: ReportFormat,
    pub path: PathBuf,
}

/// Resolved runtime configuration, passed explicitly to each component.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Directory watched (recursively) for new sales files.
    pub input_dir: PathBuf,
    /// Only files whose name starts with this prefix are processed.
    pub file_prefix: String,
    /// Processed source files are moved here.
    pub archive_dir: PathBuf,
    /// Chart and reports are written here.
    pub output_dir: PathBuf,
    /// Optional TrueType font for chart text; system fonts are searched otherwise.
    pub chart_font: Option<PathBuf>,
    /// Pause between a create event and processing, so the writer can finish.
    pub settle_delay: Duration,
}

impl ReportConfig {
    pub const DEFAULT_INPUT_DIR: &'static str = "data/incoming";
    pub const DEFAULT_FILE_PREFIX: &'static str = "sales_";
    pub const DEFAULT_ARCHIVE_DIR: &'static str = "data/archive";
    pub const DEFAULT_OUTPUT_DIR: &'static str = "reports";
    pub const DEFAULT_SETTLE_MS: u64 = 500;

    /// True when `path` names a file this configuration should pick up.
    pub fn matches_prefix(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&self.file_prefix))
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(Self::DEFAULT_INPUT_DIR),
            file_prefix: Self::DEFAULT_FILE_PREFIX.to_string(),
            archive_dir: PathBuf::from(Self::DEFAULT_ARCHIVE_DIR),
            output_dir: PathBuf::from(Self::DEFAULT_OUTPUT_DIR),
            chart_font: None,
            settle_delay: Duration::from_millis(Self::DEFAULT_SETTLE_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matches_file_name_only() {
        let config = ReportConfig::default();
        assert!(config.matches_prefix(Path::new("data/incoming/sales_2024_01.csv")));
        assert!(config.matches_prefix(Path::new("data/incoming/nested/sales_x.csv")));
        assert!(!config.matches_prefix(Path::new("data/sales_dir/returns.csv")));
        assert!(!config.matches_prefix(Path::new("data/incoming/old_sales_x.csv")));
    }

    #[test]
    fn year_month_displays_zero_padded() {
        let ym = YearMonth::from_date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(ym.to_string(), "2024-03");
    }

    #[test]
    fn chart_aspect_ratio() {
        let chart = ChartArtifact {
            path: PathBuf::from("c.png"),
            width_px: 1000,
            height_px: 600,
        };
        assert!((chart.aspect_ratio() - 0.6).abs() < 1e-12);
    }
}
