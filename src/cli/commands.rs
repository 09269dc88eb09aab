//! CLI command implementations.

use std::path::{Path, PathBuf};

use crate::lifecycle::{PipelineState, ServiceContext};
use crate::types::config::Config;
use crate::types::requests::CaptionRequest;
use crate::{CaptionError, CaptionResult};

/// Writes a default configuration file into `path`.
pub async fn init(path: Option<PathBuf>) -> CaptionResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("captiond.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        println!("Use 'captiond config' to inspect it.");
        return Ok(());
    }

    Config::default_config().save(&config_path)?;

    println!("captiond initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set the inference token: export HF_TOKEN=...");
    println!("  2. Start the server: captiond serve");

    Ok(())
}

/// Starts the HTTP server.
pub async fn serve(host: Option<String>, port: Option<u16>, mut config: Config) -> CaptionResult<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::debug!(
        model = %config.model.name,
        cache_capacity = config.cache.capacity,
        fetch_timeout_secs = config.fetch.timeout_secs,
        "Configuration loaded"
    );

    let ctx = ServiceContext::new(config)?;
    crate::server::serve(ctx).await
}

/// Captions one batch through the same pipeline the server uses.
pub async fn caption(urls: Vec<String>, config: Config) -> CaptionResult<()> {
    let urls = CaptionRequest::new(urls).validate()?;

    let ctx = ServiceContext::new(config)?;
    if let PipelineState::LoadFailed(reason) = ctx.lifecycle.load_pipeline().await {
        return Err(CaptionError::Unavailable(reason));
    }

    let response = ctx.orchestrator().await?.process_batch(&urls).await;
    ctx.lifecycle.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Prints the effective configuration.
pub async fn config_cmd(config_path: &Path, config: &Config) -> CaptionResult<()> {
    if config_path.exists() {
        println!("# Loaded from {}", config_path.display());
    } else {
        println!("# {} not found, showing defaults", config_path.display());
    }
    println!("{}", toml::to_string_pretty(config)?);

    Ok(())
}

/// Shows version.
pub fn version() {
    println!("captiond {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Batch image captioning service with an LRU result cache");
}
