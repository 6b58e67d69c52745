use rag_engine::BatchItem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct UpsertRequest {
    pub text: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    pub status: &'static str,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpsertBatchRequest {
    pub documents: Vec<BatchItem>,
}
