//! Vector store backend configuration.

use ai_llm_service::config::EnvReader;

use crate::errors::RagError;

pub const DEFAULT_PINECONE_CONTROLLER: &str = "https://api.pinecone.io";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Pinecone connection settings.
#[derive(Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    /// Control-plane base URL used to describe indexes.
    pub controller_url: String,
    /// Optional namespace inside the index.
    pub namespace: Option<String>,
}

/// Qdrant connection settings. The collection plays the role of the index.
#[derive(Clone)]
pub struct QdrantConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub url: String,
    /// Optional API key for Qdrant Cloud.
    pub api_key: Option<String>,
}

#[derive(Clone, Debug)]
pub enum BackendConfig {
    Pinecone(PineconeConfig),
    Qdrant(QdrantConfig),
}

/// Selected backend plus the name of the index every operation targets.
#[derive(Clone, Debug)]
pub struct VectorStoreConfig {
    pub index_name: String,
    pub backend: BackendConfig,
}

impl VectorStoreConfig {
    /// Reads the backend selection from the environment.
    ///
    /// - `VECTOR_STORE` = `pinecone` (default) or `qdrant`
    /// - Pinecone: `PINECONE_API_KEY`, `PINECONE_INDEX` (required),
    ///   `PINECONE_CONTROLLER_URL`, `PINECONE_NAMESPACE` (optional)
    /// - Qdrant: `QDRANT_COLLECTION` (required), `QDRANT_URL`, `QDRANT_API_KEY` (optional)
    ///
    /// # Errors
    /// Returns `RagError::Config` on missing or malformed values.
    pub fn from_env(env: &EnvReader) -> Result<Self, RagError> {
        let kind = env.or("VECTOR_STORE", "pinecone").to_ascii_lowercase();
        let cfg = match kind.as_str() {
            "pinecone" => Self {
                index_name: env.must("PINECONE_INDEX").map_err(config_err)?,
                backend: BackendConfig::Pinecone(PineconeConfig {
                    api_key: env.must("PINECONE_API_KEY").map_err(config_err)?,
                    controller_url: env.or("PINECONE_CONTROLLER_URL", DEFAULT_PINECONE_CONTROLLER),
                    namespace: env.get("PINECONE_NAMESPACE"),
                }),
            },
            "qdrant" => Self {
                index_name: env.must("QDRANT_COLLECTION").map_err(config_err)?,
                backend: BackendConfig::Qdrant(QdrantConfig {
                    url: env.or("QDRANT_URL", DEFAULT_QDRANT_URL),
                    api_key: env.get("QDRANT_API_KEY"),
                }),
            },
            other => {
                return Err(RagError::Config(format!(
                    "unsupported VECTOR_STORE `{other}` (expected pinecone or qdrant)"
                )));
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.index_name.trim().is_empty() {
            return Err(RagError::Config("index name is empty".into()));
        }
        let url = match &self.backend {
            BackendConfig::Pinecone(p) => &p.controller_url,
            BackendConfig::Qdrant(q) => &q.url,
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RagError::Config(format!(
                "store url `{url}` must start with http:// or https://"
            )));
        }
        Ok(())
    }
}

fn config_err(e: ai_llm_service::AiLlmError) -> RagError {
    RagError::Config(e.to_string())
}

impl std::fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &"***")
            .field("controller_url", &self.controller_url)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl std::fmt::Debug for QdrantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinecone_is_the_default_backend() {
        let env = EnvReader::from_pairs(&[("PINECONE_API_KEY", "pc"), ("PINECONE_INDEX", "cv")]);
        let cfg = VectorStoreConfig::from_env(&env).unwrap();
        assert_eq!(cfg.index_name, "cv");
        match cfg.backend {
            BackendConfig::Pinecone(p) => {
                assert_eq!(p.controller_url, DEFAULT_PINECONE_CONTROLLER);
                assert_eq!(p.namespace, None);
            }
            other => panic!("unexpected backend {other:?}"),
        }
    }

    #[test]
    fn qdrant_needs_a_collection() {
        let env = EnvReader::from_pairs(&[("VECTOR_STORE", "qdrant")]);
        let err = VectorStoreConfig::from_env(&env).unwrap_err();
        assert!(err.to_string().contains("QDRANT_COLLECTION"));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let env = EnvReader::from_pairs(&[("VECTOR_STORE", "faiss")]);
        assert!(matches!(
            VectorStoreConfig::from_env(&env),
            Err(RagError::Config(_))
        ));
    }

    #[test]
    fn debug_hides_keys() {
        let p = PineconeConfig {
            api_key: "secret".into(),
            controller_url: DEFAULT_PINECONE_CONTROLLER.into(),
            namespace: None,
        };
        assert!(!format!("{p:?}").contains("secret"));
    }
}
