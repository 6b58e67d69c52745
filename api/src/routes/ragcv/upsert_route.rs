//! POST /ragcv/upsert — stores one document.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::debug;

use crate::{
    app::{app_state::AppState, request_scope::RequestScope},
    error_handler::AppResult,
    routes::ragcv::ragcv_request::{UpsertRequest, UpsertResponse},
};

pub async fn upsert_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpsertRequest>, JsonRejection>,
) -> AppResult<Json<UpsertResponse>> {
    let Json(body) = payload?;
    debug!(source = %body.source, text_chars = body.text.len(), "upsert_route: start");

    let scope = RequestScope::new(state.request_timeout);
    let id = state
        .pipeline
        .ingestor
        .ingest(scope.ctx(), &body.text, &body.source)
        .await?;

    Ok(Json(UpsertResponse {
        status: "success",
        id,
    }))
}
