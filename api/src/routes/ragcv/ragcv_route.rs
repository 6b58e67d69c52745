//! POST /ragcv — answers a question from the indexed documents.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rag_engine::{RagAnswer, RagQuery};
use tracing::debug;

use crate::{
    app::{app_state::AppState, request_scope::RequestScope},
    error_handler::AppResult,
};

/// Handler: POST /ragcv
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8090/ragcv \
///   -H 'content-type: application/json' \
///   -d '{"query":"Where did you work last?"}'
/// ```
pub async fn ragcv_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RagQuery>, JsonRejection>,
) -> AppResult<Json<RagAnswer>> {
    let Json(query) = payload?;
    debug!(query_chars = query.query.len(), "ragcv_route: start");

    let scope = RequestScope::new(state.request_timeout);
    let answer = state.pipeline.engine.answer(scope.ctx(), &query).await?;

    Ok(Json(answer))
}
