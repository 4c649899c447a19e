//! Record and result types shared by collection implementations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar metadata value attached to a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(v) => write!(f, "{v}"),
            MetadataValue::Int(v) => write!(f, "{v}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Key/value metadata of one document.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// One stored document with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub document: String,
    pub metadata: Option<Metadata>,
    pub embedding: Vec<f32>,
}

/// Nearest-neighbour results, one inner list per query text.
///
/// Inner lists are parallel and ordered by ascending distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub metadatas: Vec<Vec<Option<Metadata>>>,
    pub distances: Vec<Vec<f32>>,
}

impl QueryResult {
    /// Result with one empty list per query.
    pub fn empty(queries: usize) -> Self {
        Self {
            ids: vec![Vec::new(); queries],
            documents: vec![Vec::new(); queries],
            metadatas: vec![Vec::new(); queries],
            distances: vec![Vec::new(); queries],
        }
    }

    /// Hits of the first query, in rank order.
    pub fn first_hits(&self) -> Vec<QueryHit<'_>> {
        self.hits(0)
    }

    /// Hits of query `index`, in rank order.
    pub fn hits(&self, index: usize) -> Vec<QueryHit<'_>> {
        let (Some(ids), Some(documents), Some(metadatas), Some(distances)) = (
            self.ids.get(index),
            self.documents.get(index),
            self.metadatas.get(index),
            self.distances.get(index),
        ) else {
            return Vec::new();
        };

        ids.iter()
            .zip(documents)
            .zip(metadatas)
            .zip(distances)
            .map(|(((id, document), metadata), distance)| QueryHit {
                id,
                document,
                metadata: metadata.as_ref(),
                distance: *distance,
            })
            .collect()
    }

    /// Documents of the first query.
    pub fn first_documents(&self) -> &[String] {
        self.documents.first().map(Vec::as_slice).unwrap_or_default()
    }
}

/// Borrowed view of one ranked hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryHit<'a> {
    pub id: &'a str,
    pub document: &'a str,
    pub metadata: Option<&'a Metadata>,
    pub distance: f32,
}
