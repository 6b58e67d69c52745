//! Thin adapter around `qdrant-client` implementing [`VectorStore`].
//!
//! The collection plays the role of the index. Qdrant point ids must be
//! UUIDs or integers, so string record ids are mapped to a stable UUIDv5 and
//! the original id travels in the payload under [`DOC_ID_KEY`].

use std::collections::HashMap;

use futures::future::BoxFuture;
use qdrant_client::qdrant::{
    PointStruct, ScoredPoint, SearchPointsBuilder, UpdateStatus, UpsertPointsBuilder,
    Value as QValue, point_id::PointIdOptions, vectors_config,
};
use qdrant_client::{Qdrant, QdrantError};
use serde_json::{Map, Value};
use services::uuid::stable_uuid;
use tracing::{debug, info, warn};

use crate::config::QdrantConfig;
use crate::errors::RagError;
use crate::record::{DocumentRecord, IndexDescriptor, MatchMetadata, SearchMatch};
use crate::store::VectorStore;

/// Payload key holding the caller's record id.
pub const DOC_ID_KEY: &str = "doc_id";

/// gRPC `NOT_FOUND`, returned for a missing collection.
const GRPC_NOT_FOUND: i32 = 5;

pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl QdrantStore {
    /// Creates a new facade from the given configuration.
    ///
    /// Supports optional API key authentication.
    pub fn new(cfg: &QdrantConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        info!(url = %cfg.url, "QdrantStore initialized");

        Ok(Self {
            client,
            url: cfg.url.clone(),
        })
    }

    async fn describe(&self, collection: &str) -> Result<IndexDescriptor, RagError> {
        let info = match self.client.collection_info(collection).await {
            Ok(info) => info,
            Err(err) => {
                warn!(%collection, error = %err, "collection lookup failed");
                return Err(lookup_error(collection, grpc_code(&err), &err));
            }
        };

        let dimension = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                vectors_config::Config::Params(p) => Some(p.size as usize),
                // Named vectors are not used by this backend.
                _ => None,
            });

        debug!(%collection, ?dimension, "collection resolved");

        Ok(IndexDescriptor {
            name: collection.to_string(),
            host: self.url.clone(),
            dimension,
        })
    }

    /// Upserts (inserts or replaces) points and waits for the write to apply.
    ///
    /// Returns the number of points written, or 0 if Qdrant did not report
    /// the update as completed.
    async fn upsert_points(
        &self,
        index: &IndexDescriptor,
        records: Vec<DocumentRecord>,
    ) -> Result<u64, RagError> {
        if records.is_empty() {
            debug!("No points provided for upsert");
            return Ok(0);
        }

        let points = records
            .into_iter()
            .map(to_point)
            .collect::<Result<Vec<_>, _>>()?;
        let sent = points.len() as u64;

        let res = self
            .client
            .upsert_points(UpsertPointsBuilder::new(&index.name, points).wait(true))
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        let written = written_count(res.result.map(|r| r.status), sent);
        info!(collection = %index.name, sent, written, "qdrant upsert finished");
        Ok(written)
    }

    async fn search_points(
        &self,
        index: &IndexDescriptor,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<SearchMatch>, RagError> {
        let builder = SearchPointsBuilder::new(&index.name, vector, top_k).with_payload(true);

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        let out: Vec<SearchMatch> = res.result.into_iter().map(to_match).collect();

        debug!(collection = %index.name, hits = out.len(), "search completed");
        Ok(out)
    }
}

impl VectorStore for QdrantStore {
    fn resolve_index<'a>(
        &'a self,
        index_name: &'a str,
    ) -> BoxFuture<'a, Result<IndexDescriptor, RagError>> {
        Box::pin(self.describe(index_name))
    }

    fn upsert<'a>(
        &'a self,
        index: &'a IndexDescriptor,
        records: Vec<DocumentRecord>,
    ) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(self.upsert_points(index, records))
    }

    fn search<'a>(
        &'a self,
        index: &'a IndexDescriptor,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'a, Result<Vec<SearchMatch>, RagError>> {
        Box::pin(self.search_points(index, vector, top_k))
    }
}

/// Builds the Qdrant point for `record`: UUIDv5 id, metadata plus
/// [`DOC_ID_KEY`] as payload.
fn to_point(record: DocumentRecord) -> Result<PointStruct, RagError> {
    let mut payload = record.metadata.to_json();
    if let Value::Object(m) = &mut payload {
        m.insert(DOC_ID_KEY.into(), Value::String(record.id.clone()));
    }
    let payload: qdrant_client::Payload = payload
        .try_into()
        .map_err(|e| RagError::Qdrant(format!("payload convert: {e}")))?;
    Ok(PointStruct::new(
        stable_uuid(&record.id).to_string(),
        record.vector,
        payload,
    ))
}

/// Maps a hit back to the caller's id; falls back to the point id when the
/// payload carries no [`DOC_ID_KEY`].
fn to_match(point: ScoredPoint) -> SearchMatch {
    let point_id = match point.id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(s)) => s,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    };
    let mut payload = qpayload_to_json(point.payload);
    let id = match payload.remove(DOC_ID_KEY) {
        Some(Value::String(s)) => s,
        _ => point_id,
    };
    SearchMatch {
        id,
        score: point.score,
        metadata: (!payload.is_empty()).then(|| MatchMetadata::from_json(payload)),
    }
}

/// All `sent` points count as written only once Qdrant reports `Completed`.
fn written_count(status: Option<i32>, sent: u64) -> u64 {
    if status == Some(UpdateStatus::Completed as i32) {
        sent
    } else {
        0
    }
}

fn grpc_code(err: &QdrantError) -> Option<i32> {
    match err {
        QdrantError::ResponseError { status } => Some(status.code().into()),
        _ => None,
    }
}

/// Only a gRPC `NOT_FOUND` means the collection is missing; anything else is
/// an outage or auth problem.
fn lookup_error(collection: &str, code: Option<i32>, err: &dyn std::fmt::Display) -> RagError {
    if code == Some(GRPC_NOT_FOUND) {
        RagError::IndexNotFound(format!("{collection}: {err}"))
    } else {
        RagError::Qdrant(format!("collection {collection}: {err}"))
    }
}

/// Converts a Qdrant payload into a JSON object.
fn qpayload_to_json(payload: HashMap<String, QValue>) -> Map<String, Value> {
    payload
        .into_iter()
        .map(|(k, v)| (k, v.into_json()))
        .collect()
}
