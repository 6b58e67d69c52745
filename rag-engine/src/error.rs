//! Typed error for the rag-engine crate.
//!
//! One variant per pipeline stage. Variants that wrap a lower-level failure
//! keep it as `source` so the provider message survives into logs and API
//! bodies.

use std::fmt;

use ai_llm_service::AiLlmError;
use rag_store::{IndexDescriptor, RagError};
use thiserror::Error;

/// Remote step that was running when a call was cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Embedding,
    IndexResolution,
    Search,
    StoreWrite,
    Completion,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Embedding => "embedding",
            Stage::IndexResolution => "index resolution",
            Stage::Search => "search",
            Stage::StoreWrite => "store write",
            Stage::Completion => "completion",
        })
    }
}

#[derive(Debug, Error)]
pub enum RagEngineError {
    /// Rejected before any remote call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(#[source] RagError),

    #[error("index `{index}` could not be resolved: {source}")]
    IndexResolutionFailed {
        index: String,
        #[source]
        source: RagError,
    },

    #[error("vector dimension mismatch: index expects {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("search failed: {0}")]
    SearchFailed(#[source] RagError),

    #[error("store write failed: {0}")]
    StoreWriteFailed(#[source] RagError),

    /// The store accepted the upsert but reported a different record count.
    #[error("store reported {written} record(s) written, expected {expected}")]
    StoreInconsistent { expected: u64, written: u64 },

    #[error("completion failed: {0}")]
    CompletionFailed(#[source] AiLlmError),

    #[error("completion returned no choices")]
    EmptyCompletionResult,

    #[error("cancelled during {stage}")]
    Cancelled { stage: Stage },

    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

impl RagEngineError {
    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            RagEngineError::InvalidInput(_) => "INVALID_INPUT",
            RagEngineError::EmbeddingFailed(_) => "EMBEDDING_FAILED",
            RagEngineError::IndexResolutionFailed { .. } => "INDEX_RESOLUTION_FAILED",
            RagEngineError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            RagEngineError::SearchFailed(_) => "SEARCH_FAILED",
            RagEngineError::StoreWriteFailed(_) => "STORE_WRITE_FAILED",
            RagEngineError::StoreInconsistent { .. } => "STORE_INCONSISTENT",
            RagEngineError::CompletionFailed(_) => "COMPLETION_FAILED",
            RagEngineError::EmptyCompletionResult => "EMPTY_COMPLETION_RESULT",
            RagEngineError::Cancelled { .. } => "CANCELLED",
            RagEngineError::ConfigurationInvalid(_) => "CONFIGURATION_INVALID",
        }
    }

    /// Maps an embedding-stage failure. A vector of the wrong size is a
    /// dimension problem, not a transport one.
    pub(crate) fn from_embedding(err: RagError) -> Self {
        match err {
            RagError::VectorSizeMismatch { got, want } => {
                RagEngineError::DimensionMismatch { expected: want, got }
            }
            other => RagEngineError::EmbeddingFailed(other),
        }
    }

    pub(crate) fn from_completion(err: AiLlmError) -> Self {
        match err.provider_kind() {
            Some(ai_llm_service::ProviderErrorKind::EmptyChoices) => {
                RagEngineError::EmptyCompletionResult
            }
            _ => RagEngineError::CompletionFailed(err),
        }
    }
}

/// Fails with `DimensionMismatch` when the index reports a different size.
pub(crate) fn ensure_dimension(index: &IndexDescriptor, got: usize) -> Result<(), RagEngineError> {
    index
        .check_dimension(got)
        .map_err(RagEngineError::from_embedding)
}
