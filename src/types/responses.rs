//! Response types for captiond.

use serde::{Deserialize, Serialize};

/// Memoized result of processing one URL, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionOutcome {
    /// Generated caption, absent on failure.
    pub caption: Option<String>,

    /// Whether a caption was produced.
    pub success: bool,

    /// Time spent producing this outcome (in seconds).
    pub elapsed_seconds: f64,
}

impl CaptionOutcome {
    /// Outcome for a caption attempt; `success` follows caption presence.
    pub fn new(caption: Option<String>, elapsed_seconds: f64) -> Self {
        Self {
            success: caption.is_some(),
            caption,
            elapsed_seconds,
        }
    }

    /// Failed outcome.
    pub fn failure(elapsed_seconds: f64) -> Self {
        Self::new(None, elapsed_seconds)
    }
}

/// Per-URL entry of a captioning response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Normalized URL.
    pub url: String,

    /// Caption, `null` on failure.
    pub caption: Option<String>,

    /// Processing time in seconds. For cache hits this is the time recorded
    /// when the outcome was first computed.
    pub processing_time: f64,

    /// Whether a caption was produced.
    pub success: bool,

    /// Whether the outcome was served from the cache.
    #[serde(default)]
    pub cached: bool,
}

impl ImageResult {
    /// Builds a result from an outcome.
    pub fn from_outcome(url: impl Into<String>, outcome: &CaptionOutcome, cached: bool) -> Self {
        Self {
            url: url.into(),
            caption: outcome.caption.clone(),
            processing_time: outcome.elapsed_seconds,
            success: outcome.success,
            cached,
        }
    }
}

/// Response for `POST /caption`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionResponse {
    /// One result per requested URL, in request order.
    pub results: Vec<ImageResult>,

    /// Wall-clock time of the whole batch, rounded to milliseconds.
    pub elapsed_time: f64,
}

impl CaptionResponse {
    /// Number of successful results.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of results served from the cache.
    pub fn cache_hits(&self) -> usize {
        self.results.iter().filter(|r| r.cached).count()
    }
}

/// Response for `GET /cache/clear`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheClearResponse {
    pub message: String,
    pub items_removed: usize,
}

/// Response for `GET /cache/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Entries currently cached.
    pub current_items: usize,

    /// Cache capacity.
    pub max_items: usize,

    /// Lookups that found an entry.
    pub hits: u64,

    /// Lookups that found nothing.
    pub misses: u64,

    /// `hits / (hits + misses)`, 0 when no lookups happened.
    pub hit_rate: f64,
}

/// Readiness of the shared resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Whether the caption engine is loaded.
    pub pipeline_loaded: bool,

    /// Whether the fetch client is open.
    pub http_client_ready: bool,

    /// Semicolon-separated failure reasons; absent when healthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HealthReport {
    /// Both resources are usable.
    pub fn is_ready(&self) -> bool {
        self.pipeline_loaded && self.http_client_ready
    }
}
