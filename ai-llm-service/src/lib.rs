//! OpenAI client used by the RAG backend.
//!
//! - [`services::open_ai_service::OpenAiService`]: chat completions and embeddings
//! - [`config`]: env-driven model configs (chat / embedding roles)
//! - [`chat`]: role-tagged chat messages shared with upstream crates
//! - [`telemetry`]: tracing subscriber helpers for the binaries

pub mod chat;
pub mod config;
pub mod error_handler;
pub mod services;
pub mod telemetry;

pub use chat::{ChatMessage, ChatRole};
pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, ProviderErrorKind};
pub use services::open_ai_service::{OpenAiService, omits_max_tokens};
