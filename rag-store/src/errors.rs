//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Transport errors talking to the store over HTTP.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned HTTP {status} from {url}: {snippet}")]
    Status {
        status: u16,
        url: String,
        snippet: String,
    },

    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The named index (or collection) does not exist.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// Mismatch between a vector and the expected dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Embedding backend failed to produce a vector.
    #[error("embedding error: {0}")]
    Embedding(String),
}
