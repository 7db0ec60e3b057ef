//! Reporting: aggregation, shared formatting, and the two document
//! renderers.

pub mod docx;
pub mod format;
pub mod metrics;
pub mod pdf;

pub use docx::write_word_report;
pub use format::{format_currency, format_run_summary};
pub use metrics::compute_metrics;
pub use pdf::write_pdf_report;
