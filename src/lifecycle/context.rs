//! Service context shared by the HTTP handlers and the CLI.

use std::sync::Arc;

use crate::cache::ResultCache;
use crate::orchestrator::RequestOrchestrator;
use crate::types::config::Config;
use crate::CaptionResult;

use super::ResourceLifecycle;

/// Everything a request needs, built once at startup.
#[derive(Clone)]
pub struct ServiceContext {
    pub config: Arc<Config>,
    pub cache: Arc<ResultCache>,
    pub lifecycle: Arc<ResourceLifecycle>,
}

impl ServiceContext {
    /// Builds the context. The pipeline is not loaded yet.
    pub fn new(config: Config) -> CaptionResult<Self> {
        let lifecycle = ResourceLifecycle::new(&config)?;
        let cache = ResultCache::new(config.cache.capacity);

        Ok(Self {
            config: Arc::new(config),
            cache: Arc::new(cache),
            lifecycle: Arc::new(lifecycle),
        })
    }

    /// Orchestrator over the current resources.
    ///
    /// Fails with [`crate::CaptionError::Unavailable`] when the engine is not
    /// loaded or the fetch client is closed.
    pub async fn orchestrator(&self) -> CaptionResult<RequestOrchestrator> {
        let resources = self.lifecycle.resources().await?;
        Ok(RequestOrchestrator::new(
            Arc::clone(&self.cache),
            resources.fetcher,
            resources.engine,
        ))
    }
}
