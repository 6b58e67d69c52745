//! POST /openai — plain chat completion, no retrieval.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::debug;

use crate::{
    app::{app_state::AppState, request_scope::RequestScope},
    error_handler::AppResult,
    routes::openai::openai_request::{OpenAiRequest, OpenAiResponse},
};

/// Handler: POST /openai
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8090/openai \
///   -H 'content-type: application/json' \
///   -d '{"prompt":"Say hi","history":[{"role":"user","content":"Hello"}]}'
/// ```
pub async fn openai_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OpenAiRequest>, JsonRejection>,
) -> AppResult<Json<OpenAiResponse>> {
    let Json(body) = payload?;
    debug!(history = body.history.len(), "openai_route: start");

    let scope = RequestScope::new(state.request_timeout);
    let response = state
        .pipeline
        .responder
        .respond(scope.ctx(), &body.history, &body.prompt)
        .await?;

    Ok(Json(OpenAiResponse { response }))
}
