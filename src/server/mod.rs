//! HTTP server.
//!
//! Routes:
//! - `POST /caption` captions a batch of image URLs
//! - `GET /cache/clear` empties the result cache
//! - `GET /cache/info` reports cache size and hit counters
//! - `GET /health` reports readiness of the engine and the fetch client

mod error;
mod routes;

pub use error::ApiError;
pub use routes::router;

use crate::lifecycle::ServiceContext;
use crate::CaptionResult;

/// Loads the pipeline, serves until a shutdown signal, then releases
/// resources.
///
/// A failed model load does not stop the server; `/health` reports it.
pub async fn serve(ctx: ServiceContext) -> CaptionResult<()> {
    let state = ctx.lifecycle.load_pipeline().await;
    tracing::info!(state = %state, "Startup complete");

    let addr = ctx.config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, router(ctx.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ctx.lifecycle.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
