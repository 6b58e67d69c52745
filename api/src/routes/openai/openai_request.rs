use ai_llm_service::ChatMessage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct OpenAiRequest {
    pub prompt: String,
    /// Prior user/assistant turns, oldest first.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct OpenAiResponse {
    pub response: String,
}
