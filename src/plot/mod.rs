//! Chart rendering.
//!
//! - region bar chart to PNG (`chart`)
//! - font lookup for chart text (`fonts`)

pub mod chart;
pub mod fonts;

pub use chart::*;
