//! POST /ragcv/upsert_batch — stores many documents, reporting each outcome.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rag_engine::BatchReport;
use tracing::debug;

use crate::{
    app::{app_state::AppState, request_scope::RequestScope},
    error_handler::{AppError, AppResult},
    routes::ragcv::ragcv_request::UpsertBatchRequest,
};

/// Partial failures still answer 200; the report lists them per position.
pub async fn upsert_batch_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpsertBatchRequest>, JsonRejection>,
) -> AppResult<Json<BatchReport>> {
    let Json(body) = payload?;
    if body.documents.is_empty() {
        return Err(AppError::BadRequest("`documents` must not be empty".into()));
    }
    debug!(documents = body.documents.len(), "upsert_batch_route: start");

    let scope = RequestScope::new(state.request_timeout);
    let report = state
        .pipeline
        .ingestor
        .ingest_batch(scope.ctx(), &body.documents)
        .await;

    Ok(Json(report))
}
