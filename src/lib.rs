//! Bitcoin UTXO Set Dust Analyser
//!
//! Reads the unspent output set straight from a Bitcoin Core `chainstate/`
//! LevelDB (both the per-output layout of 0.15+ and the older
//! per-transaction layout), decodes every coin, and classifies each output
//! by the fee rate at which it becomes dust or costs more to spend than
//! it is worth.

pub mod analysis;
pub mod chainstate;
pub mod cli;
pub mod config;
pub mod errors;
pub mod processor;
pub mod types;
pub mod utils;
