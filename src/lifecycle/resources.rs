//! Resource lifecycle.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::fetch::ImageFetcher;
use crate::inference::{load_model, CaptionEngine, CaptionModel};
use crate::types::config::{Config, ModelConfig};
use crate::types::responses::HealthReport;
use crate::{CaptionError, CaptionResult};

const MODEL_NOT_LOADED: &str = "Model not loaded.";
const CLIENT_CLOSED: &str = "HTTP client session closed.";

/// Load state of the caption pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Loading,
    Ready,
    /// Model construction failed; holds the reason.
    LoadFailed(String),
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Uninitialized => write!(f, "uninitialized"),
            PipelineState::Loading => write!(f, "loading"),
            PipelineState::Ready => write!(f, "ready"),
            PipelineState::LoadFailed(reason) => write!(f, "load failed: {}", reason),
        }
    }
}

/// Handles borrowed by one request.
#[derive(Clone)]
pub struct SharedResources {
    pub engine: Arc<CaptionEngine>,
    pub fetcher: Arc<ImageFetcher>,
}

/// Owner of the caption engine and the fetch client.
///
/// The fetch client is created with the lifecycle and closed once by
/// [`ResourceLifecycle::shutdown`]. The engine is absent until
/// [`ResourceLifecycle::load_pipeline`] succeeds; a failed load leaves the
/// process running in a degraded state that `/health` reports.
pub struct ResourceLifecycle {
    model_config: ModelConfig,
    state: RwLock<PipelineState>,
    engine: RwLock<Option<Arc<CaptionEngine>>>,
    fetcher: Arc<ImageFetcher>,
    started_at: DateTime<Utc>,
}

impl ResourceLifecycle {
    /// Creates the lifecycle and opens the fetch client.
    pub fn new(config: &Config) -> CaptionResult<Self> {
        let fetcher = ImageFetcher::new(&config.fetch)?;

        Ok(Self {
            model_config: config.model.clone(),
            state: RwLock::new(PipelineState::Uninitialized),
            engine: RwLock::new(None),
            fetcher: Arc::new(fetcher),
            started_at: Utc::now(),
        })
    }

    /// When the lifecycle was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current pipeline state.
    pub async fn state(&self) -> PipelineState {
        self.state.read().await.clone()
    }

    /// Loads the configured model.
    pub async fn load_pipeline(&self) -> PipelineState {
        self.load_pipeline_with(load_model).await
    }

    /// Loads the pipeline through `loader`, run on the blocking pool.
    ///
    /// A loaded or loading pipeline is left untouched. Warm-up failures are
    /// only logged.
    pub async fn load_pipeline_with<F>(&self, loader: F) -> PipelineState
    where
        F: FnOnce(&ModelConfig) -> CaptionResult<Arc<dyn CaptionModel>> + Send + 'static,
    {
        {
            let mut state = self.state.write().await;
            if matches!(*state, PipelineState::Ready | PipelineState::Loading) {
                let current = state.clone();
                tracing::debug!(state = %current, "Pipeline load skipped");
                return current;
            }
            *state = PipelineState::Loading;
        }

        tracing::info!(model = %self.model_config.name, "Loading caption pipeline");
        let config = self.model_config.clone();
        let loaded = tokio::task::spawn_blocking(move || loader(&config))
            .await
            .unwrap_or_else(|e| {
                Err(CaptionError::ModelLoad(
                    self.model_config.name.clone(),
                    format!("loader panicked: {}", e),
                ))
            });

        let next = match loaded {
            Ok(model) => {
                let engine = Arc::new(CaptionEngine::new(model, &self.model_config));
                if self.model_config.warmup {
                    self.warm_up(&engine).await;
                }
                *self.engine.write().await = Some(engine);
                tracing::info!(model = %self.model_config.name, "Caption pipeline ready");
                PipelineState::Ready
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load caption pipeline");
                PipelineState::LoadFailed(e.to_string())
            }
        };

        *self.state.write().await = next.clone();
        next
    }

    async fn warm_up(&self, engine: &CaptionEngine) {
        tracing::info!("Warming up caption pipeline");
        match engine.warm_up().await {
            Ok(caption) => tracing::info!(caption = %caption, "Warm-up complete"),
            Err(e) => tracing::warn!(error = %e, "Warm-up failed, continuing"),
        }
    }

    /// Returns the shared resources, or why they cannot be used.
    pub async fn resources(&self) -> CaptionResult<SharedResources> {
        let engine = self
            .engine
            .read()
            .await
            .clone()
            .ok_or_else(|| CaptionError::Unavailable(MODEL_NOT_LOADED.to_string()))?;

        if !self.fetcher.is_open().await {
            return Err(CaptionError::Unavailable(CLIENT_CLOSED.to_string()));
        }

        Ok(SharedResources {
            engine,
            fetcher: Arc::clone(&self.fetcher),
        })
    }

    /// Readiness of each resource, reported independently.
    pub async fn health(&self) -> HealthReport {
        let pipeline_loaded = self.engine.read().await.is_some();
        let http_client_ready = self.fetcher.is_open().await;

        let mut reasons = Vec::new();
        if !http_client_ready {
            reasons.push("HTTP client is closed".to_string());
        }
        if !pipeline_loaded {
            match self.state().await {
                PipelineState::LoadFailed(reason) => {
                    reasons.push(format!("Image pipeline not loaded ({})", reason))
                }
                _ => reasons.push("Image pipeline not loaded".to_string()),
            }
        }

        HealthReport {
            pipeline_loaded,
            http_client_ready,
            reason: (!reasons.is_empty()).then(|| reasons.join("; ")),
        }
    }

    /// Closes the fetch client. Safe to call more than once.
    pub async fn shutdown(&self) {
        let uptime = Utc::now().signed_duration_since(self.started_at);
        tracing::info!(uptime_secs = uptime.num_seconds(), "Shutting down resources");
        self.fetcher.close().await;
    }
}
