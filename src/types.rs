//! UTXO Dust Analyser - Type System
//!
//! - `common`: Records written by the dump commands (UtxoDumpRecord, TransactionSummary)
//! - `analysis_results`: Structured analysis reports
//! - `statistics`: Statistics framework with common traits

mod common;
pub mod analysis_results;
pub mod statistics;

pub use common::*;
