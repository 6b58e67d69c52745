//! Document ingestion: text → embedding → one record in the vector store.

use std::sync::Arc;
use std::time::Instant;

use rag_store::{DocumentMetadata, DocumentRecord, EmbeddingsProvider, VectorStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cancel::CallContext;
use crate::error::{RagEngineError, Stage, ensure_dimension};
use crate::ids::RecordIdGenerator;
use crate::progress::{NoopProgress, Progress};

/// One document of a batch.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BatchItem {
    pub text: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngestedItem {
    pub position: usize,
    pub label: String,
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedItem {
    pub position: usize,
    pub label: String,
    /// Stable error code, see [`RagEngineError::code`].
    pub code: &'static str,
    pub error: String,
}

/// Outcome of a batch: every input position lands in exactly one list.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub ingested: Vec<IngestedItem>,
    pub failed: Vec<FailedItem>,
}

impl BatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.ingested.len() == self.total
    }

    fn fail(&mut self, position: usize, label: &str, err: &RagEngineError) {
        self.failed.push(FailedItem {
            position,
            label: label.to_string(),
            code: err.code(),
            error: err.to_string(),
        });
    }
}

pub struct DocumentIngestor {
    embedder: Arc<dyn EmbeddingsProvider>,
    store: Arc<dyn VectorStore>,
    index_name: String,
    ids: RecordIdGenerator,
}

impl DocumentIngestor {
    pub fn new(
        embedder: Arc<dyn EmbeddingsProvider>,
        store: Arc<dyn VectorStore>,
        index_name: impl Into<String>,
        ids: RecordIdGenerator,
    ) -> Self {
        Self {
            embedder,
            store,
            index_name: index_name.into(),
            ids,
        }
    }

    /// Stores one document and returns its new record id.
    ///
    /// Order: validate, embed, resolve the index, check the dimension,
    /// generate the id, upsert one record, verify exactly one was written.
    /// Nothing is retried.
    ///
    /// # Errors
    /// - `InvalidInput` for blank text (before any remote call)
    /// - `EmbeddingFailed`, `IndexResolutionFailed`, `DimensionMismatch`,
    ///   `StoreWriteFailed`, `StoreInconsistent` for the respective stage
    /// - `Cancelled` if `ctx` fires first
    pub async fn ingest(
        &self,
        ctx: &CallContext,
        text: &str,
        source: &str,
    ) -> Result<String, RagEngineError> {
        self.ingest_document(ctx, DocumentMetadata::new(text, source))
            .await
    }

    /// Like [`Self::ingest`], with extra metadata fields carried through.
    pub async fn ingest_document(
        &self,
        ctx: &CallContext,
        metadata: DocumentMetadata,
    ) -> Result<String, RagEngineError> {
        if metadata.text.trim().is_empty() {
            return Err(RagEngineError::InvalidInput("text is empty".into()));
        }
        let started = Instant::now();

        let vector = ctx
            .run(Stage::Embedding, self.embedder.embed(&metadata.text))
            .await?
            .map_err(RagEngineError::from_embedding)?;

        let index = ctx
            .run(
                Stage::IndexResolution,
                self.store.resolve_index(&self.index_name),
            )
            .await?
            .map_err(|source| RagEngineError::IndexResolutionFailed {
                index: self.index_name.clone(),
                source,
            })?;
        ensure_dimension(&index, vector.len())?;

        let id = self.ids.next_id();
        debug!(%id, index = %index.name, dim = vector.len(), "upserting record");

        let record = DocumentRecord {
            id: id.clone(),
            vector,
            metadata,
        };
        let written = ctx
            .run(Stage::StoreWrite, self.store.upsert(&index, vec![record]))
            .await?
            .map_err(RagEngineError::StoreWriteFailed)?;

        if written != 1 {
            warn!(%id, written, "store reported unexpected write count");
            return Err(RagEngineError::StoreInconsistent {
                expected: 1,
                written,
            });
        }

        info!(
            %id,
            index = %index.name,
            latency_ms = started.elapsed().as_millis(),
            "document ingested"
        );
        Ok(id)
    }

    /// Ingests items one after another, continuing past failures.
    ///
    /// Once `ctx` is cancelled the remaining items are reported as
    /// `Cancelled` without being attempted.
    pub async fn ingest_batch(&self, ctx: &CallContext, items: &[BatchItem]) -> BatchReport {
        self.ingest_batch_with(ctx, items, &NoopProgress).await
    }

    pub async fn ingest_batch_with(
        &self,
        ctx: &CallContext,
        items: &[BatchItem],
        progress: &dyn Progress,
    ) -> BatchReport {
        let mut report = BatchReport {
            total: items.len(),
            ..BatchReport::default()
        };
        progress.set_total(items.len() as u64);

        for (position, item) in items.iter().enumerate() {
            let outcome = if ctx.is_cancelled() {
                Err(RagEngineError::Cancelled {
                    stage: Stage::Embedding,
                })
            } else {
                self.ingest(ctx, &item.text, &item.source).await
            };

            match outcome {
                Ok(id) => {
                    progress.step(&item.source, true);
                    report.ingested.push(IngestedItem {
                        position,
                        label: item.source.clone(),
                        id,
                    });
                }
                Err(err) => {
                    warn!(position, label = %item.source, error = %err, "batch item failed");
                    progress.step(&item.source, false);
                    report.fail(position, &item.source, &err);
                }
            }
        }

        info!(
            total = report.total,
            ingested = report.ingested.len(),
            failed = report.failed.len(),
            "batch finished"
        );
        progress.finish(&format!(
            "{} ingested, {} failed",
            report.ingested.len(),
            report.failed.len()
        ));
        report
    }
}
