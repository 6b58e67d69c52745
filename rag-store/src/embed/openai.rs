//! OpenAI embedding provider backed by the shared `OpenAiService`.

use std::sync::Arc;

use ai_llm_service::OpenAiService;
use futures::future::BoxFuture;

use crate::{EmbeddingsProvider, RagError};

/// OpenAI embedder (async).
#[derive(Clone)]
pub struct OpenAiEmbedder {
    svc: Arc<OpenAiService>,
    /// Expected embedding dimension size, if pinned by configuration.
    dim: Option<usize>,
}

impl OpenAiEmbedder {
    pub fn new(svc: Arc<OpenAiService>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for OpenAiEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move {
            let resp = self
                .svc
                .embeddings(text)
                .await
                .map_err(|e| RagError::Embedding(e.to_string()))?;

            if let Some(want) = self.dim {
                if resp.len() != want {
                    return Err(RagError::VectorSizeMismatch {
                        got: resp.len(),
                        want,
                    });
                }
            }

            Ok(resp)
        })
    }
}
