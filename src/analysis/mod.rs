//! Ranking analysis.
//!
//! Name normalization and the weighted multi-source aggregator. Everything
//! here is pure: callers load the documents and write the results.

pub mod aggregator;
pub mod normalize;

pub use aggregator::*;
