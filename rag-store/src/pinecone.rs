//! Pinecone backend over the public REST API.
//!
//! - `GET  {controller}/indexes/{name}` → index host + dimension
//! - `POST https://{host}/vectors/upsert` → `upsertedCount`
//! - `POST https://{host}/query` → ranked matches with metadata
//!
//! The index host is resolved on every session: Pinecone may move an index
//! between hosts, so the descriptor is never kept beyond one operation.

use std::time::Instant;

use futures::future::BoxFuture;
use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::config::PineconeConfig;
use crate::errors::RagError;
use crate::record::{DocumentRecord, IndexDescriptor, MatchMetadata, SearchMatch};
use crate::store::VectorStore;

const API_VERSION: &str = "2024-07";

pub struct PineconeStore {
    client: reqwest::Client,
    controller_url: String,
    namespace: Option<String>,
}

impl PineconeStore {
    /// Builds the HTTP client with the `Api-Key` header preset.
    ///
    /// # Errors
    /// `RagError::Config` if the key is not a valid header value,
    /// `RagError::Http` if the client cannot be built.
    pub fn new(cfg: &PineconeConfig) -> Result<Self, RagError> {
        let mut headers = header::HeaderMap::new();
        let mut key = header::HeaderValue::from_str(&cfg.api_key)
            .map_err(|e| RagError::Config(format!("invalid Pinecone API key header: {e}")))?;
        key.set_sensitive(true);
        headers.insert("api-key", key);
        headers.insert(
            "x-pinecone-api-version",
            header::HeaderValue::from_static(API_VERSION),
        );

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        info!(controller = %cfg.controller_url, "PineconeStore initialized");

        Ok(Self {
            client,
            controller_url: cfg.controller_url.trim_end_matches('/').to_string(),
            namespace: cfg.namespace.clone(),
        })
    }

    async fn describe(&self, index_name: &str) -> Result<IndexDescriptor, RagError> {
        let url = format!("{}/indexes/{}", self.controller_url, index_name);
        debug!(index = %index_name, "GET {url}");

        let resp = self.client.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(RagError::IndexNotFound(index_name.to_string()));
        }
        let out: DescribeIndexResponse = read_json(resp, &url).await?;

        if out.host.trim().is_empty() {
            return Err(RagError::Decode(format!(
                "index `{index_name}` has no host yet"
            )));
        }

        Ok(IndexDescriptor {
            name: index_name.to_string(),
            host: out.host,
            dimension: out.dimension,
        })
    }

    async fn upsert_records(
        &self,
        index: &IndexDescriptor,
        records: Vec<DocumentRecord>,
    ) -> Result<u64, RagError> {
        let started = Instant::now();
        let url = format!("{}/vectors/upsert", data_plane_base(&index.host));
        let body = UpsertRequest {
            vectors: records
                .into_iter()
                .map(|r| WireVector {
                    metadata: r.metadata.to_json(),
                    id: r.id,
                    values: r.vector,
                })
                .collect(),
            namespace: self.namespace.as_deref(),
        };
        let sent = body.vectors.len();

        let resp = self.client.post(&url).json(&body).send().await?;
        let out: UpsertResponse = read_json(resp, &url).await?;

        info!(
            index = %index.name,
            sent,
            upserted = out.upserted_count,
            latency_ms = started.elapsed().as_millis(),
            "pinecone upsert completed"
        );
        Ok(out.upserted_count)
    }

    async fn query(
        &self,
        index: &IndexDescriptor,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<SearchMatch>, RagError> {
        let started = Instant::now();
        let url = format!("{}/query", data_plane_base(&index.host));
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let resp = self.client.post(&url).json(&body).send().await?;
        let out: QueryResponse = read_json(resp, &url).await?;

        let matches: Vec<SearchMatch> = out
            .matches
            .into_iter()
            .map(|m| SearchMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.map(MatchMetadata::from_json),
            })
            .collect();

        info!(
            index = %index.name,
            top_k,
            matches = matches.len(),
            latency_ms = started.elapsed().as_millis(),
            "pinecone query completed"
        );
        Ok(matches)
    }
}

impl VectorStore for PineconeStore {
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
        Box::pin(self.upsert_records(index, records))
    }

    fn search<'a>(
        &'a self,
        index: &'a IndexDescriptor,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'a, Result<Vec<SearchMatch>, RagError>> {
        Box::pin(self.query(index, vector, top_k))
    }
}

/// Pinecone reports bare hostnames; full URLs are passed through.
fn data_plane_base(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    resp: reqwest::Response,
    url: &str,
) -> Result<T, RagError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let snippet: String = text.chars().take(300).collect();
        error!(%status, %url, %snippet, "pinecone returned non-success status");
        return Err(RagError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            snippet,
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| RagError::Decode(format!("{url}: {e}")))
}

/* ===========================================================================
REST payloads
======================================================================== */

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    #[serde(default)]
    host: String,
    #[serde(default)]
    dimension: Option<usize>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<WireVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireVector {
    id: String,
    values: Vec<f32>,
    metadata: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: Vec<f32>,
    top_k: u64,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hosts_get_https() {
        assert_eq!(
            data_plane_base("cv-abc.svc.pinecone.io"),
            "https://cv-abc.svc.pinecone.io"
        );
        assert_eq!(data_plane_base("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
    }
}
