//! Report formatting and output generation
//!
//! Provides formatting for analysis results via the [`ReportFormatter`] facade.
//! Supports Console and JSON output formats.

pub mod dust;
pub mod utils;

use crate::errors::AppResult;
use crate::types::analysis_results::DustReport;
use crate::types::statistics::ScanSummary;

/// Output format options for analysis reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

impl OutputFormat {
    /// Parse a format name, falling back to console output
    pub fn parse(format_str: &str) -> Self {
        match format_str.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Console,
        }
    }
}

/// Facade for all report formatting operations
pub struct ReportFormatter;

impl ReportFormatter {
    pub fn export_json<T: serde::Serialize>(data: &T) -> AppResult<String> {
        utils::export_json(data)
    }

    // Dust
    pub fn format_dust_report(r: &DustReport, f: &OutputFormat) -> AppResult<String> {
        dust::format_dust_report(r, f)
    }
    pub fn format_scan_summary(s: &ScanSummary) -> String {
        dust::format_scan_summary(s)
    }
}
