//! Integration Tests Module
//!
//! End-to-end runs of the scan pipeline over in-memory and LevelDB
//! chainstates in both layouts.

pub mod dust_pipeline;
pub mod leveldb_store;
pub mod transactions;
