//! Caption engine.
//!
//! Wraps one loaded [`CaptionModel`] and turns raw image bytes into a
//! caption: decode, convert to RGB, run the model on the blocking pool and
//! normalize its output.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::{Rgb, RgbImage};
use tokio::sync::Semaphore;

use super::base::{normalize_output, CaptionModel};
use crate::types::config::ModelConfig;
use crate::{CaptionError, CaptionResult};

/// Side length of the synthetic warm-up image.
const WARMUP_IMAGE_SIZE: u32 = 10;

/// Shared, concurrency-safe front for a captioning model.
///
/// Decoding runs on the blocking pool without any limit. Model calls are
/// fenced by a semaphore sized from `model.max_concurrent_inferences`; a
/// permit is held until the blocking call really returns, even when the
/// caller already gave up on it after the timeout.
pub struct CaptionEngine {
    model: Arc<dyn CaptionModel>,
    permits: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl CaptionEngine {
    /// Creates an engine using the limits from configuration.
    pub fn new(model: Arc<dyn CaptionModel>, config: &ModelConfig) -> Self {
        Self::with_limits(
            model,
            config.max_concurrent_inferences,
            config.inference_timeout(),
        )
    }

    /// Creates an engine with explicit limits.
    pub fn with_limits(
        model: Arc<dyn CaptionModel>,
        max_concurrent: usize,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            model,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    /// Name of the wrapped model.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Captions an encoded image, logging and swallowing any failure.
    pub async fn caption(&self, bytes: Bytes) -> Option<String> {
        match self.try_caption(bytes).await {
            Ok(caption) => {
                tracing::debug!(caption = %caption, "Generated caption");
                Some(caption)
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), error = %e, "Caption generation failed");
                None
            }
        }
    }

    /// Captions an encoded image.
    pub async fn try_caption(&self, bytes: Bytes) -> CaptionResult<String> {
        let image = tokio::task::spawn_blocking(move || decode_rgb(&bytes))
            .await
            .map_err(|e| CaptionError::inference(format!("decode task failed: {}", e)))??;

        self.caption_image(image).await
    }

    /// Runs the model on an already decoded image.
    ///
    /// The timeout covers waiting for a permit as well as the model call.
    pub async fn caption_image(&self, image: RgbImage) -> CaptionResult<String> {
        let permits = Arc::clone(&self.permits);
        let model = Arc::clone(&self.model);

        let run = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| CaptionError::inference("inference permits closed"))?;

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                model.generate(&image)
            })
            .await
            .map_err(|e| CaptionError::inference(format!("model panicked: {}", e)))?
        };

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| CaptionError::InferenceTimeout(limit))??,
            None => run.await?,
        };

        normalize_output(&output)
    }

    /// Runs one throwaway inference on a small white image.
    pub async fn warm_up(&self) -> CaptionResult<String> {
        let image = RgbImage::from_pixel(WARMUP_IMAGE_SIZE, WARMUP_IMAGE_SIZE, Rgb([255, 255, 255]));
        self.caption_image(image).await
    }
}

/// Decodes any supported encoding into 8-bit RGB.
pub fn decode_rgb(bytes: &[u8]) -> CaptionResult<RgbImage> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.to_rgb8())
}
