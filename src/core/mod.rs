//! Metric collection, snapshot types, and unit formatting.

pub mod collector;
pub mod errors;
pub mod format;
pub mod types;
