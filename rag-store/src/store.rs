//! Vector store capability.

use futures::future::BoxFuture;

use crate::errors::RagError;
use crate::record::{DocumentRecord, IndexDescriptor, SearchMatch};

/// Storage backend for document vectors.
///
/// Implement this trait to plug in a different store. Every session starts
/// with [`VectorStore::resolve_index`]; callers must not cache the returned
/// descriptor across operations.
pub trait VectorStore: Send + Sync {
    /// Looks up the live address (and dimensionality) of `index_name`.
    fn resolve_index<'a>(
        &'a self,
        index_name: &'a str,
    ) -> BoxFuture<'a, Result<IndexDescriptor, RagError>>;

    /// Inserts or fully replaces `records`. Returns how many records the
    /// store reports as written.
    fn upsert<'a>(
        &'a self,
        index: &'a IndexDescriptor,
        records: Vec<DocumentRecord>,
    ) -> BoxFuture<'a, Result<u64, RagError>>;

    /// Top-K similarity search with metadata. Matches come back in the
    /// store's ranking (descending score).
    fn search<'a>(
        &'a self,
        index: &'a IndexDescriptor,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'a, Result<Vec<SearchMatch>, RagError>>;
}
