//! Request orchestrator.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use reqwest::Url;
use tracing::Instrument;

use crate::cache::ResultCache;
use crate::fetch::ImageFetcher;
use crate::inference::CaptionEngine;
use crate::types::responses::{CaptionOutcome, CaptionResponse, ImageResult};

/// Runs per-URL fetch and caption pipelines for a batch.
///
/// Holds shared handles only; one orchestrator is built per batch from the
/// resources the lifecycle hands out.
pub struct RequestOrchestrator {
    cache: Arc<ResultCache>,
    fetcher: Arc<ImageFetcher>,
    engine: Arc<CaptionEngine>,
}

impl RequestOrchestrator {
    /// Creates an orchestrator over the shared resources.
    pub fn new(
        cache: Arc<ResultCache>,
        fetcher: Arc<ImageFetcher>,
        engine: Arc<CaptionEngine>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            engine,
        }
    }

    /// Processes a batch and assembles the HTTP response.
    ///
    /// Runs inside a span carrying a fresh `request_id` and logs a summary
    /// once every URL has finished.
    pub async fn process_batch(&self, urls: &[Url]) -> CaptionResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("batch", request_id = %request_id, urls = urls.len());

        async {
            tracing::info!("Processing caption batch");
            let start = Instant::now();

            let results = self.process(urls).await;
            let elapsed_time = round_millis(start.elapsed().as_secs_f64());

            let summary = BatchSummary::from_results(&results);
            summary.log(elapsed_time);

            CaptionResponse {
                results,
                elapsed_time,
            }
        }
        .instrument(span)
        .await
    }

    /// Processes every URL concurrently.
    ///
    /// All pipelines are started before any is awaited; results come back in
    /// input order, one per URL, duplicates included.
    pub async fn process(&self, urls: &[Url]) -> Vec<ImageResult> {
        join_all(urls.iter().map(|url| self.process_url(url))).await
    }

    /// Runs the pipeline for a single URL.
    pub async fn process_url(&self, url: &Url) -> ImageResult {
        let start = Instant::now();
        let key = ResultCache::cache_key(url);

        if let Some(outcome) = self.cache.get(&key).await {
            tracing::debug!(url = %key, success = outcome.success, "Cache hit");
            return ImageResult::from_outcome(key, &outcome, true);
        }

        let outcome = match self.fetcher.fetch(&key).await {
            None => {
                tracing::warn!(url = %key, "Could not fetch image");
                CaptionOutcome::failure(start.elapsed().as_secs_f64())
            }
            Some(bytes) => {
                let caption = self.engine.caption(bytes).await;
                let outcome = CaptionOutcome::new(caption, start.elapsed().as_secs_f64());
                if outcome.success {
                    tracing::info!(url = %key, elapsed = outcome.elapsed_seconds, "Captioned");
                } else {
                    tracing::warn!(url = %key, "Caption generation failed");
                }
                outcome
            }
        };

        self.cache.put(key.clone(), outcome.clone()).await;
        ImageResult::from_outcome(key, &outcome, false)
    }
}

/// Per-batch counters for the summary log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub cache_hits: usize,
    pub cache_hits_succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Counts a finished batch.
    pub fn from_results(results: &[ImageResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };

        for result in results {
            if result.success {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            if result.cached {
                summary.cache_hits += 1;
                if result.success {
                    summary.cache_hits_succeeded += 1;
                }
            }
        }

        summary
    }

    fn log(&self, elapsed_time: f64) {
        tracing::info!(
            total = self.total,
            succeeded = self.succeeded,
            cache_hits = self.cache_hits,
            cache_hits_succeeded = self.cache_hits_succeeded,
            failed = self.failed,
            elapsed = elapsed_time,
            "Batch complete"
        );
    }
}

fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
