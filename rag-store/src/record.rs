//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metadata written alongside every vector.
///
/// `text` and `source` are always present; `extra` holds additional
/// primitive values (string, number, bool) and is flattened into the same
/// metadata object on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub text: String,
    pub source: String,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, Value>,
}

impl DocumentMetadata {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Metadata as a flat JSON object.
    pub fn to_json(&self) -> Value {
        let mut m = Map::new();
        for (k, v) in &self.extra {
            m.insert(k.clone(), v.clone());
        }
        m.insert("text".into(), Value::String(self.text.clone()));
        m.insert("source".into(), Value::String(self.source.clone()));
        Value::Object(m)
    }
}

/// Canonical record upserted into the store. A second upsert with the same
/// `id` replaces the record entirely.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: DocumentMetadata,
}

/// Metadata as read back from a match. Fields are optional because the store
/// may hold records written by other tools.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchMetadata {
    pub text: Option<String>,
    pub source: Option<String>,
    pub extra: BTreeMap<String, Value>,
}

impl MatchMetadata {
    /// Reads `text`/`source` as strings; anything else lands in `extra`.
    pub fn from_json(map: Map<String, Value>) -> Self {
        let mut out = MatchMetadata::default();
        for (k, v) in map {
            match (k.as_str(), v) {
                ("text", Value::String(s)) => out.text = Some(s),
                ("source", Value::String(s)) => out.source = Some(s),
                (_, v) => {
                    out.extra.insert(k, v);
                }
            }
        }
        out
    }
}

/// A single similarity hit, in the order the store ranked it.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<MatchMetadata>,
}

/// Result of resolving an index by name. Valid for one operation only; the
/// host may move between calls.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexDescriptor {
    pub name: String,
    pub host: String,
    /// Vector size configured on the index, when the backend reports it.
    pub dimension: Option<usize>,
}

impl IndexDescriptor {
    /// Checks that `got` matches the index dimensionality (when known).
    pub fn check_dimension(&self, got: usize) -> Result<(), crate::RagError> {
        match self.dimension {
            Some(want) if want != got => Err(crate::RagError::VectorSizeMismatch { got, want }),
            _ => Ok(()),
        }
    }
}
