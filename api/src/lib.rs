//! HTTP surface of the RAG backend.
//!
//! - `POST /openai`              plain chat
//! - `POST /ragcv`               retrieval-augmented answer
//! - `POST /ragcv/upsert`        store one document
//! - `POST /ragcv/upsert_batch`  store many documents
//! - `GET  /health`              liveness

mod app;
mod error_handler;
mod middleware_layer;
mod routes;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

pub use crate::app::app_state::AppState;
pub use crate::error_handler::AppError;
pub use crate::middleware_layer::request_id::REQUEST_ID_HEADER;

use crate::middleware_layer::request_id::request_id;
use crate::routes::{
    health_route::health,
    openai::openai_route::openai_route,
    ragcv::{
        ragcv_route::ragcv_route, upsert_batch_route::upsert_batch_route,
        upsert_route::upsert_route,
    },
};

/// Builds the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/openai", post(openai_route))
        .route("/ragcv", post(ragcv_route))
        .route("/ragcv/upsert", post(upsert_route))
        .route("/ragcv/upsert_batch", post(upsert_batch_route))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl+C.
///
/// # Errors
/// [`AppError::Bind`] if the address cannot be bound, [`AppError::Server`]
/// if serving fails.
pub async fn start(state: Arc<AppState>, addr: &str) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(%addr, "api listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("api stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server keeps running until killed.
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
