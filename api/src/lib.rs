//! HTTP host of the legal question-answering backend.
//!
//! Routes:
//! - `POST /answer`: answer one question
//! - `GET /health`: collaborator diagnostics
//! - `GET /sources`: statutes present in the index
//! - `GET /quality`: answer-quality report
//! - `POST /ingest`: load passages into the index
//!
//! Anything else is served from the static frontend directory.

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

#[cfg(test)]
mod test_fakes;

use std::{path::Path, sync::Arc};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub use crate::core::app_state::{AppState, Ingestion, ServerConfig};
pub use crate::error_handler::{AppError, AppResult};

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        answer::answer_route::answer, health::health_route::health, ingest::ingest_route::ingest,
        quality::quality_route::quality, sources::sources_route::sources,
    },
};

/// Builds the application router over `state`, with the frontend in `frontend_dir`.
pub fn router(state: Arc<AppState>, frontend_dir: &Path) -> Router {
    let frontend = ServeDir::new(frontend_dir)
        .fallback(ServeFile::new(frontend_dir.join("index.html")));

    Router::new()
        .route("/answer", post(answer))
        .route("/health", get(health))
        .route("/sources", get(sources))
        .route("/quality", get(quality))
        .route("/ingest", post(ingest))
        .route_layer(middleware::from_fn(json_error_mapper))
        .fallback_service(frontend)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wires the state from the environment and serves until SIGINT/SIGTERM.
pub async fn start() -> Result<(), AppError> {
    let server = ServerConfig::from_env();
    let state = Arc::new(AppState::from_env()?);
    let app = router(state, &server.frontend_dir);

    let listener = tokio::net::TcpListener::bind(&server.address)
        .await
        .map_err(|source| AppError::Bind {
            addr: server.address.clone(),
            source,
        })?;
    info!(address = %server.address, frontend = %server.frontend_dir.display(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
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
    info!("shutdown signal received");
}
