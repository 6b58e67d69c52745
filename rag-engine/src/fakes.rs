//! Deterministic in-memory capabilities for tests.
//!
//! Compiled for this crate's own tests and, with the `fakes` feature, for
//! downstream test suites.

use std::future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ai_llm_service::error_handler::ProviderError;
use ai_llm_service::{AiLlmError, ChatMessage, ProviderErrorKind};
use futures::future::BoxFuture;
use rag_store::{
    DocumentRecord, EmbeddingsProvider, IndexDescriptor, MatchMetadata, RagError, SearchMatch,
    VectorStore,
};
use serde_json::{Map, Value};

use crate::completion::CompletionProvider;

/// Hashes text into a fixed-size, L2-normalised vector. Same text, same vector.
pub struct FakeEmbedder {
    dim: usize,
    fail: bool,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(1)
        }
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let dim = self.dim.max(1);
        let mut v = vec![0.0f32; dim];
        v[text.len() % dim] += 1.0;
        for (i, b) in text.bytes().enumerate() {
            v[(i + b as usize) % dim] += f32::from(b) / 255.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter_mut().for_each(|x| *x /= norm);
        v
    }
}

impl EmbeddingsProvider for FakeEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RagError::Embedding("fake embedder unavailable".into()));
            }
            Ok(self.vector_for(text))
        })
    }
}

/// Vector store kept in a `Vec`, ranked by cosine similarity.
pub struct InMemoryStore {
    index_name: Option<String>,
    dimension: Option<usize>,
    records: Mutex<Vec<DocumentRecord>>,
    written_override: Option<u64>,
    fail_upserts: bool,
    fail_searches: bool,
    pub resolve_calls: AtomicUsize,
    pub upsert_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl InMemoryStore {
    /// Any index name resolves to this store.
    pub fn new(dimension: Option<usize>) -> Self {
        Self {
            index_name: None,
            dimension,
            records: Mutex::new(Vec::new()),
            written_override: None,
            fail_upserts: false,
            fail_searches: false,
            resolve_calls: AtomicUsize::new(0),
            upsert_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
        }
    }

    /// Only `name` resolves; anything else is `IndexNotFound`.
    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    /// Reports `n` written records regardless of the request.
    pub fn reporting_written(mut self, n: u64) -> Self {
        self.written_override = Some(n);
        self
    }

    pub fn failing_upserts(mut self) -> Self {
        self.fail_upserts = true;
        self
    }

    pub fn failing_searches(mut self) -> Self {
        self.fail_searches = true;
        self
    }

    /// Inserts or replaces by id.
    pub fn insert(&self, record: DocumentRecord) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unavailable(what: &str) -> RagError {
        RagError::Status {
            status: 503,
            url: format!("memory://{what}"),
            snippet: "unavailable".into(),
        }
    }
}

impl VectorStore for InMemoryStore {
    fn resolve_index<'a>(
        &'a self,
        index_name: &'a str,
    ) -> BoxFuture<'a, Result<IndexDescriptor, RagError>> {
        Box::pin(async move {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            if self.index_name.as_deref().is_some_and(|n| n != index_name) {
                return Err(RagError::IndexNotFound(index_name.to_string()));
            }
            Ok(IndexDescriptor {
                name: index_name.to_string(),
                host: "memory".into(),
                dimension: self.dimension,
            })
        })
    }

    fn upsert<'a>(
        &'a self,
        _index: &'a IndexDescriptor,
        records: Vec<DocumentRecord>,
    ) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(async move {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_upserts {
                return Err(Self::unavailable("upsert"));
            }
            let n = records.len() as u64;
            for r in records {
                self.insert(r);
            }
            Ok(self.written_override.unwrap_or(n))
        })
    }

    fn search<'a>(
        &'a self,
        _index: &'a IndexDescriptor,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'a, Result<Vec<SearchMatch>, RagError>> {
        Box::pin(async move {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_searches {
                return Err(Self::unavailable("query"));
            }
            let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            let mut scored: Vec<SearchMatch> = records
                .iter()
                .map(|r| SearchMatch {
                    id: r.id.clone(),
                    score: cosine(&vector, &r.vector),
                    metadata: Some(MatchMetadata::from_json(match r.metadata.to_json() {
                        Value::Object(m) => m,
                        _ => Map::new(),
                    })),
                })
                .collect();
            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
            scored.truncate(usize::try_from(top_k).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

enum Behavior {
    Reply(String),
    EmptyChoices,
    Fail,
    Hang,
}

/// Scripted completion backend that records every request.
pub struct FakeCompletion {
    behavior: Behavior,
    seen: Mutex<Vec<(Vec<ChatMessage>, Option<u32>)>>,
    pub calls: AtomicUsize,
}

impl FakeCompletion {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::with(Behavior::Reply(text.into()))
    }

    pub fn empty_choices() -> Self {
        Self::with(Behavior::EmptyChoices)
    }

    /// Fails like an upstream HTTP 500.
    pub fn failing() -> Self {
        Self::with(Behavior::Fail)
    }

    /// Never resolves; for cancellation tests.
    pub fn hanging() -> Self {
        Self::with(Behavior::Hang)
    }

    pub fn last_messages(&self) -> Option<Vec<ChatMessage>> {
        let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.last().map(|(m, _)| m.clone())
    }

    pub fn last_max_tokens(&self) -> Option<u32> {
        let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.last().and_then(|(_, t)| *t)
    }
}

impl CompletionProvider for FakeCompletion {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        _model: &'a str,
        max_tokens: Option<u32>,
    ) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((messages.to_vec(), max_tokens));

            match &self.behavior {
                Behavior::Reply(text) => Ok(text.clone()),
                Behavior::EmptyChoices => Err(ProviderError::new(ProviderErrorKind::EmptyChoices).into()),
                Behavior::Fail => Err(ProviderError::new(ProviderErrorKind::Decode(
                    "fake upstream error".into(),
                ))
                .into()),
                Behavior::Hang => future::pending().await,
            }
        })
    }
}
