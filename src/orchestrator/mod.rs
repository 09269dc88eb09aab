//! Batch orchestration.
//!
//! Turns a batch of URLs into per-URL results: cache lookup, then fetch and
//! caption on a miss, with every outcome written back to the cache.

mod batch;

pub use batch::{BatchSummary, RequestOrchestrator};
