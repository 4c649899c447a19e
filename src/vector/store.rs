//! Vector collections.
//!
//! A collection embeds documents on insert and answers nearest-neighbour
//! queries by cosine distance. Two lifecycles share [`CollectionIndex`]:
//! [`EphemeralCollection`] lives in memory, [`PersistentCollection`] is
//! backed by a tantivy index on disk.
//!
//! [`PersistentCollection`]: super::persistent::PersistentCollection

use std::collections::HashSet;

use super::embedding::{EmbeddingGenerator, cosine_similarity};
use super::persistent::PersistentCollection;
use super::types::{Metadata, MetadataValue, QueryResult, StoredRecord};
use crate::config::{StoreConfig, StoreKind};
use crate::error::{StorageError, StorageResult};

/// A named collection of embedded documents.
pub trait VectorStore: Send {
    /// Embed and insert documents. All-or-nothing.
    ///
    /// `ids`, `documents` and `metadatas` (when given) must have the same
    /// length; ids must be new to the collection.
    fn add(
        &mut self,
        ids: &[String],
        documents: &[String],
        metadatas: Option<&[Metadata]>,
    ) -> StorageResult<()>;

    /// The `n_results` nearest documents for each query text.
    fn query(&self, query_texts: &[&str], n_results: usize) -> StorageResult<QueryResult>;

    /// Number of stored documents.
    fn count(&self) -> usize;

    /// Whether any stored document has `key` set to `value` in its metadata.
    fn contains_metadata(&self, key: &str, value: &MetadataValue) -> bool;

    fn name(&self) -> &str;
}

/// Open the collection variant selected by configuration.
pub fn open_store(
    config: &StoreConfig,
    embedder: Box<dyn EmbeddingGenerator>,
) -> StorageResult<Box<dyn VectorStore>> {
    match config.kind {
        StoreKind::Ephemeral => {
            tracing::debug!(target: "store", "using ephemeral collection '{}'", config.collection);
            Ok(Box::new(EphemeralCollection::new(&config.collection, embedder)))
        }
        StoreKind::Persistent => {
            let collection = PersistentCollection::open(&config.path, &config.collection, embedder)?;
            Ok(Box::new(collection))
        }
    }
}

/// In-memory records with brute-force cosine search.
#[derive(Debug, Default, Clone)]
pub struct CollectionIndex {
    records: Vec<StoredRecord>,
    ids: HashSet<String>,
}

impl CollectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records in insertion order.
    pub fn from_records(records: Vec<StoredRecord>) -> Self {
        let ids = records.iter().map(|r| r.id.clone()).collect();
        Self { records, ids }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn records(&self) -> &[StoredRecord] {
        &self.records
    }

    pub fn contains_metadata(&self, key: &str, value: &MetadataValue) -> bool {
        self.records
            .iter()
            .filter_map(|r| r.metadata.as_ref())
            .any(|m| m.get(key) == Some(value))
    }

    /// Check cardinality and id uniqueness of a batch before any work.
    pub fn validate_batch(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: Option<&[Metadata]>,
    ) -> StorageResult<()> {
        let metadata_count = metadatas.map_or(ids.len(), <[Metadata]>::len);
        if ids.len() != documents.len() || ids.len() != metadata_count {
            return Err(StorageError::CardinalityMismatch {
                ids: ids.len(),
                documents: documents.len(),
                metadatas: metadata_count,
            });
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if self.contains(id) || !seen.insert(id.as_str()) {
                return Err(StorageError::DuplicateId(id.clone()));
            }
        }

        Ok(())
    }

    /// Append records. Callers validate first.
    pub fn extend(&mut self, records: impl IntoIterator<Item = StoredRecord>) {
        for record in records {
            self.ids.insert(record.id.clone());
            self.records.push(record);
        }
    }

    /// Rank all records against each query embedding.
    pub fn nearest(&self, query_embeddings: &[Vec<f32>], n_results: usize) -> QueryResult {
        let mut result = QueryResult::default();

        for query in query_embeddings {
            let mut scored: Vec<(usize, f32)> = self
                .records
                .iter()
                .enumerate()
                .map(|(i, record)| (i, 1.0 - cosine_similarity(query, &record.embedding)))
                .collect();

            // Stable sort keeps insertion order among equal distances
            scored.sort_by(|a, b| a.1.total_cmp(&b.1));
            scored.truncate(n_results);

            let mut ids = Vec::with_capacity(scored.len());
            let mut documents = Vec::with_capacity(scored.len());
            let mut metadatas = Vec::with_capacity(scored.len());
            let mut distances = Vec::with_capacity(scored.len());
            for (i, distance) in scored {
                let record = &self.records[i];
                ids.push(record.id.clone());
                documents.push(record.document.clone());
                metadatas.push(record.metadata.clone());
                distances.push(distance);
            }

            result.ids.push(ids);
            result.documents.push(documents);
            result.metadatas.push(metadatas);
            result.distances.push(distances);
        }

        result
    }
}

/// Embed a batch and zip it into records.
pub(crate) fn embed_records(
    embedder: &dyn EmbeddingGenerator,
    ids: &[String],
    documents: &[String],
    metadatas: Option<&[Metadata]>,
) -> StorageResult<Vec<StoredRecord>> {
    let texts: Vec<&str> = documents.iter().map(String::as_str).collect();
    let embeddings = embedder.generate_embeddings(&texts)?;

    if embeddings.len() != documents.len() {
        return Err(StorageError::Serialization(format!(
            "embedder returned {} vectors for {} documents",
            embeddings.len(),
            documents.len()
        )));
    }

    Ok(ids
        .iter()
        .zip(documents)
        .zip(embeddings)
        .enumerate()
        .map(|(i, ((id, document), embedding))| StoredRecord {
            id: id.clone(),
            document: document.clone(),
            metadata: metadatas.map(|m| m[i].clone()),
            embedding,
        })
        .collect())
}

/// Embed queries and rank, short-circuiting on an empty collection.
pub(crate) fn query_index(
    index: &CollectionIndex,
    embedder: &dyn EmbeddingGenerator,
    query_texts: &[&str],
    n_results: usize,
) -> StorageResult<QueryResult> {
    if index.is_empty() || n_results == 0 {
        return Ok(QueryResult::empty(query_texts.len()));
    }

    let query_embeddings = embedder.generate_embeddings(query_texts)?;
    Ok(index.nearest(&query_embeddings, n_results))
}

/// Log a failed collection operation before returning it.
pub(crate) fn log_failure<T>(collection: &str, result: StorageResult<T>) -> StorageResult<T> {
    if let Err(ref e) = result {
        tracing::error!(target: "store", "collection '{collection}': {e}");
    }
    result
}

/// In-process collection, dropped with the value.
pub struct EphemeralCollection {
    name: String,
    embedder: Box<dyn EmbeddingGenerator>,
    index: CollectionIndex,
}

impl std::fmt::Debug for EphemeralCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralCollection")
            .field("name", &self.name)
            .field("model", &self.embedder.model_name())
            .field("count", &self.index.len())
            .finish()
    }
}

impl EphemeralCollection {
    pub fn new(name: impl Into<String>, embedder: Box<dyn EmbeddingGenerator>) -> Self {
        Self {
            name: name.into(),
            embedder,
            index: CollectionIndex::new(),
        }
    }
}

impl VectorStore for EphemeralCollection {
    fn add(
        &mut self,
        ids: &[String],
        documents: &[String],
        metadatas: Option<&[Metadata]>,
    ) -> StorageResult<()> {
        let result = self
            .index
            .validate_batch(ids, documents, metadatas)
            .and_then(|()| embed_records(self.embedder.as_ref(), ids, documents, metadatas));
        let records = log_failure(&self.name, result)?;

        self.index.extend(records);
        tracing::debug!(target: "store", "added {} document(s) to '{}'", ids.len(), self.name);
        Ok(())
    }

    fn query(&self, query_texts: &[&str], n_results: usize) -> StorageResult<QueryResult> {
        log_failure(
            &self.name,
            query_index(&self.index, self.embedder.as_ref(), query_texts, n_results),
        )
    }

    fn count(&self) -> usize {
        self.index.len()
    }

    fn contains_metadata(&self, key: &str, value: &MetadataValue) -> bool {
        self.index.contains_metadata(key, value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
