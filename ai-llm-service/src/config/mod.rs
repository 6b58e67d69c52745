pub mod default_config;
pub mod env;
pub mod llm_model_config;

pub use default_config::{config_openai_chat, config_openai_embedding};
pub use env::EnvReader;
pub use llm_model_config::LlmModelConfig;
