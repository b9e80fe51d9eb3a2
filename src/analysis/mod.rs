//! Dust and non-profitability analysis of decoded UTXOs
//!
//! ## Overview
//!
//! - **Script patterns** - bare multisig and native segwit recognition
//! - **Input size** - minimum and estimated size of the input spending an output
//! - **Classifier** - dust, non-profitable and estimated non-profitable fee rates
//! - **Histogram** - cumulative per-fee-rate statistics
//! - **Pipeline** - parallel scan of a whole chainstate
//! - **Transactions** - per-transaction aggregation
//! - **Reports** - console and JSON output
//!
//! ## Usage
//!
//! ```rust
//! use utxo_dust_analyser::analysis::{
//!     run_dust_analysis, AnalysisOptions, ClassifierSettings, CoinProfile, DustPolicy,
//!     FeeRateRange,
//! };
//! use utxo_dust_analyser::chainstate::{ChainstateFormat, MemorySource};
//! use utxo_dust_analyser::errors::AppResult;
//!
//! fn example() -> AppResult<()> {
//!     let mut source = MemorySource::new();
//!     let options = AnalysisOptions {
//!         format: ChainstateFormat::Modern,
//!         range: FeeRateRange::new(10, 0, 350)?,
//!         classifier: ClassifierSettings {
//!             fee_step: 10,
//!             dust_policy: DustPolicy::Legacy,
//!             count_p2sh: false,
//!             coin: CoinProfile::Bitcoin,
//!         },
//!         non_std_only: false,
//!         strict: false,
//!         workers: 4,
//!         batch_size: 10_000,
//!         progress_interval_ms: 500,
//!         show_progress: false,
//!     };
//!     let analysis = run_dust_analysis(&mut source, &options, None)?;
//!     assert_eq!(analysis.histogram.totals().utxo_count, 0);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod classifier;
pub mod estimation;
pub mod histogram;
pub mod input_size;
pub mod pipeline;
pub mod reports;
pub mod script_patterns;
pub mod transactions;

// Re-export main types and interfaces
pub use classifier::{Classification, Classifier, ClassifierSettings, DustPolicy, Rate};
pub use estimation::EstimationProfile;
pub use histogram::{
    BucketStats, ClassificationKind, CumulativeHistogram, FeeRateHistogram, FeeRateRange,
};
pub use input_size::{CoinProfile, InputSize};
pub use pipeline::{for_each_entry, run_dust_analysis, AnalysisOptions, DustAnalysis};
pub use reports::{OutputFormat, ReportFormatter};
pub use script_patterns::{MultisigInfo, ScriptClass};
pub use transactions::{
    collect_transactions, stream_transactions, summarize_records, TransactionAggregator,
};
