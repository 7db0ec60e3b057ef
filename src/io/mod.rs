//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - moving processed files to the archive (`archive`)

pub mod archive;
pub mod ingest;

pub use archive::*;
pub use ingest::*;
