use crate::errors::RagError;
use futures::future::BoxFuture;

/// Asynchronous embedding provider.
///
/// Implement this trait to plug in your own embedding backend. Each call
/// embeds exactly one input string.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>>;
}

pub mod openai;
