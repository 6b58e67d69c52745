//! OpenAI service for chat completions and embeddings.
//!
//! Minimal, non-streaming client around the OpenAI REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions — chat completion
//! - POST {endpoint}/v1/embeddings       — embeddings retrieval
//!
//! Constructor validation:
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, info};

use crate::{
    chat::ChatMessage,
    config::llm_model_config::LlmModelConfig,
    error_handler::{AiLlmError, HttpError, ProviderError, ProviderErrorKind, make_snippet},
};

/// Model families that reject `max_tokens` (reasoning-tuned models).
const REASONING_MODEL_FAMILIES: &[&str] = &["o1", "o3", "o4", "gpt-5"];

/// Returns `true` when `model` belongs to a reasoning family that rejects the
/// `max_tokens` parameter.
///
/// Matches the bare family (`o1`) and any variant (`o1-mini`, `o3-2025-04-16`),
/// case-insensitively, with an optional `openai/` vendor prefix.
pub fn omits_max_tokens(model: &str) -> bool {
    let id = model.trim().to_ascii_lowercase();
    let id = id.strip_prefix("openai/").unwrap_or(&id);
    REASONING_MODEL_FAMILIES.iter().any(|family| {
        id == *family
            || id
                .strip_prefix(family)
                .is_some_and(|rest| rest.starts_with('-'))
    })
}

/// Thin client for the OpenAI API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
///
/// High-level operations:
/// - [`OpenAiService::chat`]       — single, non-streaming chat completion
/// - [`OpenAiService::embeddings`] — single embeddings vector retrieval
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`AiLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        // 1) API key must be present.
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::MissingApiKey))?;

        // 2) Endpoint must use http/https.
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(ProviderErrorKind::InvalidEndpoint(
                cfg.endpoint.clone(),
            ))
            .into());
        }

        // 3) HTTP client: timeout + default headers.
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                ProviderError::new(ProviderErrorKind::Decode(format!(
                    "invalid API key header: {e}"
                )))
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/v1/chat/completions", base);
        let url_embeddings = format!("{}/v1/embeddings", base);

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embeddings,
        })
    }

    /// Model configured for this client.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** chat completion request.
    ///
    /// `max_tokens` is sent only when set and the model is not a reasoning
    /// model. `temperature`/`top_p` come from the client config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`AiLlmError::Provider`] with `EmptyChoices` if no choice carries content
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: Option<u32>,
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::new(&self.cfg, messages, model, max_tokens);
        debug!(
            %model,
            messages = messages.len(),
            max_tokens = ?body.max_tokens,
            "POST {}", self.url_chat
        );

        let out: ChatCompletionResponse = self
            .post_json(&self.url_chat, &body, model, "choices[0].message.content")
            .await?;

        let choices = out.choices.len();
        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::EmptyChoices))?;

        info!(
            %model,
            choices,
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );
        Ok(content)
    }

    /// Retrieves a single embeddings vector via `/v1/embeddings` using the
    /// configured model.
    ///
    /// # Errors
    /// Same as [`OpenAiService::chat`], with `EmptyEmbedding` when the
    /// response carries no vector.
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let model = self.cfg.model.as_str();
        debug!(%model, input_len = input.len(), "POST {}", self.url_embeddings);

        let out: EmbeddingsResponse = self
            .post_json(
                &self.url_embeddings,
                &EmbeddingsRequest { model, input },
                model,
                "data[0].embedding",
            )
            .await?;

        let vector = out
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::EmptyEmbedding))?;

        info!(
            %model,
            dim = vector.len(),
            latency_ms = started.elapsed().as_millis(),
            "embeddings completed"
        );
        Ok(vector)
    }

    /// POSTs `body` and decodes a 2xx JSON answer into `R`.
    ///
    /// Non-2xx answers become `HttpStatus` with a short body snippet;
    /// `expect` names the field the caller needs, for decode errors.
    async fn post_json<B, R>(
        &self,
        url: &str,
        body: &B,
        model: &str,
        expect: &'static str,
    ) -> Result<R, AiLlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        let resp = self.client.post(url).json(body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            error!(
                %status,
                %url,
                %snippet,
                %model,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI returned non-success status"
            );
            return Err(ProviderError::new(ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            }))
            .into());
        }

        resp.json::<R>().await.map_err(|e| {
            error!(error = %e, %url, %model, "failed to decode OpenAI response");
            ProviderError::new(ProviderErrorKind::Decode(format!(
                "serde error: {e}; expected `{expect}`"
            )))
            .into()
        })
    }
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn new(
        cfg: &'a LlmModelConfig,
        messages: &'a [ChatMessage],
        model: &'a str,
        max_tokens: Option<u32>,
    ) -> Self {
        let max_tokens = if omits_max_tokens(model) {
            None
        } else {
            max_tokens
        };

        Self {
            model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens,
        }
    }
}

/// Minimal response for `/v1/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

/// Request body for `/v1/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body for `/v1/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}
