//! `sales-reports` library crate.
//!
//! The binary (`salesrep`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes or real watchers
//! - each stage (ingest, metrics, chart, documents, archive) can be called on its own

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
