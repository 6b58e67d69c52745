use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rag_engine::RagEngineError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- IO / server ---
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Pipeline failure; status and code follow the failing stage.
    #[error(transparent)]
    Engine(#[from] RagEngineError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Bind { .. } | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Engine(e) => match e {
                RagEngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                RagEngineError::Cancelled { .. } => StatusCode::GATEWAY_TIMEOUT,
                RagEngineError::EmbeddingFailed(_)
                | RagEngineError::IndexResolutionFailed { .. }
                | RagEngineError::SearchFailed(_)
                | RagEngineError::StoreWriteFailed(_)
                | RagEngineError::CompletionFailed(_)
                | RagEngineError::EmptyCompletionResult => StatusCode::BAD_GATEWAY,
                RagEngineError::StoreInconsistent { .. }
                | RagEngineError::DimensionMismatch { .. }
                | RagEngineError::ConfigurationInvalid(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Engine(e) => e.code(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, code = self.error_code(), error = %self, "request failed");
        } else {
            warn!(%status, code = self.error_code(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_engine::Stage;

    #[test]
    fn engine_errors_map_to_status() {
        let cases = [
            (
                RagEngineError::InvalidInput("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RagEngineError::Cancelled {
                    stage: Stage::Search,
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                RagEngineError::EmptyCompletionResult,
                StatusCode::BAD_GATEWAY,
            ),
            (
                RagEngineError::StoreInconsistent {
                    expected: 1,
                    written: 0,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RagEngineError::DimensionMismatch {
                    expected: 3,
                    got: 2,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, want) in cases {
            let app = AppError::from(err);
            assert_eq!(app.status_code(), want, "{app}");
        }
    }

    #[test]
    fn codes_come_from_the_engine() {
        let app = AppError::from(RagEngineError::EmptyCompletionResult);
        assert_eq!(app.error_code(), "EMPTY_COMPLETION_RESULT");
        assert_eq!(
            AppError::BadRequest("nope".into()).error_code(),
            "BAD_REQUEST"
        );
    }
}
