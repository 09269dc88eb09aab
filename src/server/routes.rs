//! Router and handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use crate::lifecycle::ServiceContext;
use crate::types::requests::CaptionRequest;
use crate::types::responses::{CacheClearResponse, CacheInfo, CaptionResponse};

/// Builds the application router.
pub fn router(ctx: ServiceContext) -> Router {
    Router::new()
        .route("/caption", post(caption))
        .route("/cache/clear", get(cache_clear))
        .route("/cache/info", get(cache_info))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn caption(
    State(ctx): State<ServiceContext>,
    payload: Result<Json<CaptionRequest>, JsonRejection>,
) -> Result<Json<CaptionResponse>, ApiError> {
    let Json(request) = payload?;
    let urls = request.validate()?;

    let orchestrator = ctx.orchestrator().await.map_err(|e| {
        tracing::error!(error = %e, "Rejecting caption request");
        ApiError::from(e)
    })?;

    Ok(Json(orchestrator.process_batch(&urls).await))
}

async fn cache_clear(State(ctx): State<ServiceContext>) -> Json<CacheClearResponse> {
    let items_removed = ctx.cache.clear().await;
    tracing::info!(items_removed, "Cache cleared via API");

    Json(CacheClearResponse {
        message: "Cache cleared.".to_string(),
        items_removed,
    })
}

async fn cache_info(State(ctx): State<ServiceContext>) -> Json<CacheInfo> {
    Json(ctx.cache.stats().await.into())
}

async fn health(State(ctx): State<ServiceContext>) -> Result<Json<Value>, ApiError> {
    let report = ctx.lifecycle.health().await;

    if report.is_ready() {
        Ok(Json(json!({
            "status": "ok",
            "pipeline_loaded": true,
            "http_client_ready": true,
        })))
    } else {
        tracing::warn!(
            pipeline_loaded = report.pipeline_loaded,
            http_client_ready = report.http_client_ready,
            reason = report.reason.as_deref().unwrap_or("Unknown"),
            "Health check failed"
        );
        Err(ApiError::Unhealthy(report))
    }
}
