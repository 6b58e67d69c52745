//! Vector store and embedding capabilities for the RAG backend.
//!
//! This crate provides:
//! - [`VectorStore`]: resolve an index, upsert records, top-K search
//! - [`EmbeddingsProvider`]: text → vector
//! - Backends: [`PineconeStore`] (REST) and [`QdrantStore`] (gRPC)
//!
//! [`connect`] picks the backend from a [`VectorStoreConfig`].

mod config;
mod errors;
mod pinecone;
mod qdrant_facade;
mod record;
mod store;

pub mod embed;

pub use config::{BackendConfig, PineconeConfig, QdrantConfig, VectorStoreConfig};
pub use embed::EmbeddingsProvider;
pub use embed::openai::OpenAiEmbedder;
pub use errors::RagError;
pub use pinecone::PineconeStore;
pub use qdrant_facade::QdrantStore;
pub use record::{DocumentMetadata, DocumentRecord, IndexDescriptor, MatchMetadata, SearchMatch};
pub use store::VectorStore;

use std::sync::Arc;

use tracing::trace;

/// Builds the configured backend.
///
/// # Errors
/// Returns `RagError::Config`/`RagError::Qdrant` if the client cannot be built.
pub fn connect(cfg: &VectorStoreConfig) -> Result<Arc<dyn VectorStore>, RagError> {
    cfg.validate()?;
    trace!("rag_store::connect index={}", cfg.index_name);
    Ok(match &cfg.backend {
        BackendConfig::Pinecone(p) => Arc::new(PineconeStore::new(p)?),
        BackendConfig::Qdrant(q) => Arc::new(QdrantStore::new(q)?),
    })
}
