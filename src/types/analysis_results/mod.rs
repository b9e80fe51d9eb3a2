//! Analysis result types
//!
//! Structured results returned by the analysis commands, serialisable for
//! JSON output and rendered for the console by `analysis::reports`.

mod dust;

pub use dust::{DustReport, FeeRateRow, KindReport, ReportSettings};
