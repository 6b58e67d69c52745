//! Default OpenAI configs loaded strictly from environment variables.
//!
//! Two roles are used by the backend:
//!
//! - **Chat**      → completion model used to answer questions
//! - **Embedding** → embedding generator for ingestion and retrieval
//!
//! # Environment variables
//!
//! - `OPENAI_API_KEY`          = API key (mandatory)
//! - `OPENAI_ENDPOINT`         = API base URL (default `https://api.openai.com`)
//! - `OPENAI_MODEL`            = chat model (default `gpt-4o-mini`)
//! - `OPENAI_EMBEDDING_MODEL`  = embedding model (default `text-embedding-3-small`)
//! - `LLM_MAX_TOKENS`          = optional max output tokens (u32)
//! - `LLM_TEMPERATURE`         = optional temperature (0.0..=2.0)
//! - `LLM_TIMEOUT_SECS`        = optional HTTP timeout (default 60)

use crate::{
    config::{env::EnvReader, llm_model_config::LlmModelConfig},
    error_handler::{AiLlmError, ConfigError, validate_http_endpoint, validate_range_f32},
};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn endpoint(env: &EnvReader) -> Result<String, AiLlmError> {
    let endpoint = env.or("OPENAI_ENDPOINT", DEFAULT_ENDPOINT);
    validate_http_endpoint("OPENAI_ENDPOINT", &endpoint)?;
    Ok(endpoint)
}

/// Constructs the config for the **chat** model.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `OPENAI_MODEL`, `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`, `LLM_TIMEOUT_SECS` (optional)
pub fn config_openai_chat(env: &EnvReader) -> Result<LlmModelConfig, AiLlmError> {
    let api_key = env.must("OPENAI_API_KEY")?;
    let model = env.or("OPENAI_MODEL", DEFAULT_CHAT_MODEL);
    if model.is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    let temperature = env.opt_f32("LLM_TEMPERATURE")?;
    if let Some(t) = temperature {
        validate_range_f32("temperature", t, 0.0, 2.0)?;
    }

    Ok(LlmModelConfig {
        model,
        endpoint: endpoint(env)?,
        api_key: Some(api_key),
        max_tokens: env.opt_u32("LLM_MAX_TOKENS")?,
        temperature,
        top_p: None,
        timeout_secs: Some(
            env.opt_u64("LLM_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        ),
    })
}

/// Constructs the config for the **embedding** model.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `OPENAI_EMBEDDING_MODEL`, `LLM_TIMEOUT_SECS` (optional)
///
/// # Defaults
/// - `max_tokens = None`, `temperature = None` (not applicable to embeddings)
pub fn config_openai_embedding(env: &EnvReader) -> Result<LlmModelConfig, AiLlmError> {
    let api_key = env.must("OPENAI_API_KEY")?;
    let model = env.or("OPENAI_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL);

    Ok(LlmModelConfig {
        model,
        endpoint: endpoint(env)?,
        api_key: Some(api_key),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(
            env.opt_u64("LLM_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_config_uses_defaults() {
        let env = EnvReader::from_pairs(&[("OPENAI_API_KEY", "sk-test")]);
        let cfg = config_openai_chat(&env).unwrap();
        assert_eq!(cfg.model, DEFAULT_CHAT_MODEL);
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.max_tokens, None);
        assert_eq!(cfg.timeout_secs, Some(60));
    }

    #[test]
    fn api_key_is_required() {
        let env = EnvReader::from_pairs(&[("OPENAI_MODEL", "gpt-4o")]);
        let err = config_openai_chat(&env).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn embedding_config_ignores_token_limit() {
        let env = EnvReader::from_pairs(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_MAX_TOKENS", "256"),
            ("OPENAI_EMBEDDING_MODEL", "text-embedding-3-large"),
        ]);
        let cfg = config_openai_embedding(&env).unwrap();
        assert_eq!(cfg.model, "text-embedding-3-large");
        assert_eq!(cfg.max_tokens, None);
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        let env = EnvReader::from_pairs(&[("OPENAI_API_KEY", "k"), ("LLM_TEMPERATURE", "3.5")]);
        assert!(config_openai_chat(&env).is_err());
    }
}
