//! Ingestion and retrieval-augmented answering.
//!
//! - [`DocumentIngestor`]: text → embedding → one record in the vector store
//! - [`RetrievalQueryEngine`]: query → top-K matches → prompt → completion
//! - [`ConversationResponder`]: plain chat through the same completion backend
//! - [`prompt`]: message assembly shared by both
//!
//! Capabilities (embedding, vector store, completion) are trait objects, so
//! tests and alternative backends plug in without touching the pipeline.
//! Every remote call runs under a [`CallContext`] and stops with
//! [`RagEngineError::Cancelled`] when its token or deadline fires.
//!
//! # Example
//! ```no_run
//! # use rag_engine::{AppConfig, CallContext, Pipeline, RagQuery};
//! # use ai_llm_service::config::EnvReader;
//! # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = AppConfig::from_env(&EnvReader::process())?;
//! let pipeline = Pipeline::from_config(&cfg)?;
//! let ctx = CallContext::background();
//! pipeline.ingestor.ingest(&ctx, "The sky is blue.", "doc1").await?;
//! let out = pipeline
//!     .engine
//!     .answer(&ctx, &RagQuery { query: "What color is the sky?".into() })
//!     .await?;
//! println!("{} {:?}", out.answer, out.sources);
//! # Ok(()) }
//! ```

mod cancel;
mod cfg;
mod completion;
mod error;
mod ids;
mod ingest;
mod progress;
mod query;

pub mod prompt;

#[cfg(any(test, feature = "fakes"))]
pub mod fakes;

pub use cancel::CallContext;
pub use cfg::{AppConfig, DEFAULT_API_ADDRESS, DEFAULT_REQUEST_TIMEOUT_SECS, Pipeline};
pub use completion::{CompletionProvider, CompletionSettings};
pub use error::{RagEngineError, Stage};
pub use ids::{IdStrategy, RecordIdGenerator};
pub use ingest::{BatchItem, BatchReport, DocumentIngestor, FailedItem, IngestedItem};
pub use progress::{NoopProgress, Progress};
pub use query::{ConversationResponder, RagAnswer, RagQuery, RetrievalQueryEngine, TOP_K, assemble_context};
