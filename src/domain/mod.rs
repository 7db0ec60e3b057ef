//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - parsed input rows (`SalesRecord`, `YearMonth`)
//! - aggregates (`MetricsResult`, `GroupTotal`)
//! - produced files (`ChartArtifact`, `ReportArtifact`)
//! - runtime configuration (`ReportConfig`)

pub mod types;

pub use types::*;
