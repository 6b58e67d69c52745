//! Runtime configuration loaded once at startup, plus pipeline wiring.

use std::sync::Arc;
use std::time::Duration;

use ai_llm_service::config::{EnvReader, config_openai_chat, config_openai_embedding};
use ai_llm_service::{LlmModelConfig, OpenAiService};
use rag_store::{EmbeddingsProvider, OpenAiEmbedder, VectorStore, VectorStoreConfig};
use tracing::info;

use crate::completion::{CompletionProvider, CompletionSettings};
use crate::error::RagEngineError;
use crate::ids::{IdStrategy, RecordIdGenerator};
use crate::ingest::DocumentIngestor;
use crate::query::{ConversationResponder, RetrievalQueryEngine};

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8090";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Everything the backend needs, validated and immutable after startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub chat: LlmModelConfig,
    pub embedding: LlmModelConfig,
    /// Expected embedding size; checked on every embedding when set.
    pub embedding_dim: Option<usize>,
    pub store: VectorStoreConfig,
    pub id_strategy: IdStrategy,
    pub api_address: String,
    pub request_timeout: Duration,
    /// System message prepended to `/openai` conversations.
    pub chat_system_prompt: Option<String>,
}

impl AppConfig {
    /// Reads and validates the whole configuration.
    ///
    /// # Errors
    /// [`RagEngineError::ConfigurationInvalid`] naming the offending variable.
    pub fn from_env(env: &EnvReader) -> Result<Self, RagEngineError> {
        let chat = config_openai_chat(env).map_err(invalid)?;
        let embedding = config_openai_embedding(env).map_err(invalid)?;
        let store = VectorStoreConfig::from_env(env).map_err(invalid)?;

        let embedding_dim = env.opt_usize("EMBEDDING_DIM").map_err(invalid)?;
        if embedding_dim == Some(0) {
            return Err(RagEngineError::ConfigurationInvalid(
                "EMBEDDING_DIM must be positive".into(),
            ));
        }

        let id_strategy = match env.get("RECORD_ID_STRATEGY") {
            Some(s) => s
                .parse::<IdStrategy>()
                .map_err(|e| RagEngineError::ConfigurationInvalid(format!("RECORD_ID_STRATEGY: {e}")))?,
            None => IdStrategy::default(),
        };

        let request_timeout = Duration::from_secs(
            env.opt_u64("REQUEST_TIMEOUT_SECS")
                .map_err(invalid)?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        Ok(Self {
            chat,
            embedding,
            embedding_dim,
            store,
            id_strategy,
            api_address: env.or("API_ADDRESS", DEFAULT_API_ADDRESS),
            request_timeout,
            chat_system_prompt: env.get("CHAT_SYSTEM_PROMPT"),
        })
    }

    pub fn completion_settings(&self) -> CompletionSettings {
        CompletionSettings::new(self.chat.model.clone(), self.chat.max_tokens)
    }
}

fn invalid(e: impl std::fmt::Display) -> RagEngineError {
    RagEngineError::ConfigurationInvalid(e.to_string())
}

/// The three operations exposed to callers, sharing one set of capabilities.
#[derive(Clone)]
pub struct Pipeline {
    pub ingestor: Arc<DocumentIngestor>,
    pub engine: Arc<RetrievalQueryEngine>,
    pub responder: Arc<ConversationResponder>,
}

impl Pipeline {
    /// Wires the network-backed providers from configuration.
    ///
    /// # Errors
    /// `ConfigurationInvalid` if a client cannot be built.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, RagEngineError> {
        let chat = Arc::new(OpenAiService::new(cfg.chat.clone()).map_err(invalid)?);
        let embed_svc = Arc::new(OpenAiService::new(cfg.embedding.clone()).map_err(invalid)?);
        let embedder = Arc::new(OpenAiEmbedder::new(embed_svc, cfg.embedding_dim));
        let store = rag_store::connect(&cfg.store).map_err(invalid)?;

        info!(
            chat_model = %cfg.chat.model,
            embedding_model = %cfg.embedding.model,
            index = %cfg.store.index_name,
            id_strategy = ?cfg.id_strategy,
            "pipeline wired"
        );

        let pipeline = Self::with_capabilities(
            embedder,
            store,
            chat,
            &cfg.store.index_name,
            cfg.completion_settings(),
            cfg.id_strategy,
        );
        Ok(match &cfg.chat_system_prompt {
            Some(system) => pipeline.with_chat_system_prompt(system.as_str()),
            None => pipeline,
        })
    }

    /// Prepends `system` to every plain-chat conversation.
    pub fn with_chat_system_prompt(mut self, system: impl Into<String>) -> Self {
        let responder = (*self.responder).clone().with_system_prompt(system);
        self.responder = Arc::new(responder);
        self
    }

    /// Wires arbitrary capability implementations.
    pub fn with_capabilities(
        embedder: Arc<dyn EmbeddingsProvider>,
        store: Arc<dyn VectorStore>,
        completion: Arc<dyn CompletionProvider>,
        index_name: &str,
        settings: CompletionSettings,
        id_strategy: IdStrategy,
    ) -> Self {
        Self {
            ingestor: Arc::new(DocumentIngestor::new(
                embedder.clone(),
                store.clone(),
                index_name,
                RecordIdGenerator::new(id_strategy),
            )),
            engine: Arc::new(RetrievalQueryEngine::new(
                embedder,
                store,
                completion.clone(),
                index_name,
                settings.clone(),
            )),
            responder: Arc::new(ConversationResponder::new(completion, settings)),
        }
    }
}
