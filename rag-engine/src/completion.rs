//! Completion capability: role-tagged messages in, assistant text out.

use ai_llm_service::{AiLlmError, ChatMessage, OpenAiService};
use futures::future::BoxFuture;

/// Chat-completion backend.
///
/// `max_tokens` is a request, not a guarantee: implementations drop it for
/// models that reject an output-token limit. Zero choices must surface as an
/// error, never as an empty string.
pub trait CompletionProvider: Send + Sync {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        model: &'a str,
        max_tokens: Option<u32>,
    ) -> BoxFuture<'a, Result<String, AiLlmError>>;
}

impl CompletionProvider for OpenAiService {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        model: &'a str,
        max_tokens: Option<u32>,
    ) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(self.chat(messages, model, max_tokens))
    }
}

/// Model and output limit used for every completion call.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl CompletionSettings {
    pub fn new(model: impl Into<String>, max_tokens: Option<u32>) -> Self {
        Self {
            model: model.into(),
            max_tokens,
        }
    }
}
