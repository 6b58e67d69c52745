/// Configuration for one OpenAI model role (chat or embedding).
///
/// # Fields
///
/// - `model`: The model identifier (e.g., `"gpt-4o-mini"`, `"text-embedding-3-small"`).
/// - `endpoint`: API base URL without the `/v1/...` suffix.
/// - `api_key`: Bearer token; required by [`crate::OpenAiService::new`].
/// - `max_tokens`: Maximum number of tokens to generate (chat only). Dropped
///   from the request for reasoning models, see [`crate::omits_max_tokens`].
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmModelConfig;
///
/// let cfg = LlmModelConfig {
///     model: "gpt-4o-mini".to_string(),
///     endpoint: "https://api.openai.com".to_string(),
///     api_key: Some("sk-...".to_string()),
///     max_tokens: Some(512),
///     temperature: None,
///     top_p: None,
///     timeout_secs: Some(30),
/// };
/// assert_eq!(cfg.model, "gpt-4o-mini");
/// ```
#[derive(Clone, PartialEq)]
pub struct LlmModelConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}

// Hand-written so the API key never reaches logs.
impl std::fmt::Debug for LlmModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmModelConfig")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
