//! Unit tests against the public library API

pub mod chainstate_decoding;
pub mod classification;
