//! # captiond
//!
//! Batch image captioning service.
//!
//! Given a batch of image URLs, captiond fetches each image, runs it through
//! an image-to-text model and returns captions with timing and cache-hit
//! metadata. Outcomes, failures included, are memoized in a process-local
//! LRU cache keyed by URL.
//!
//! ## Modules
//!
//! - [`cache`] - LRU cache of caption outcomes
//! - [`fetch`] - HTTP image fetcher
//! - [`inference`] - Captioning models and the caption engine
//! - [`orchestrator`] - Concurrent per-URL pipelines for a batch
//! - [`lifecycle`] - Shared resources, readiness and shutdown
//! - [`server`] - HTTP API
//! - [`cli`] - Command line interface
//! - [`types`] - Shared types

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod fetch;
pub mod inference;
pub mod lifecycle;
pub mod orchestrator;
pub mod server;
pub mod types;

pub use types::config::Config;
pub use types::errors::{CaptionError, CaptionResult};
