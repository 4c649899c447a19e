//! Disk-backed collections.
//!
//! Layout under `<root>/<name>/`:
//!
//! ```text
//! collection.json   manifest: name, embedding model, dimension
//! index/            tantivy index, one document per record
//! ```
//!
//! Records are loaded into a [`CollectionIndex`] on open, so queries never
//! touch the index. Inserts embed first, then write and commit, so a failed
//! batch leaves the collection unchanged.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::AllQuery;
use tantivy::schema::Value;
use tantivy::{
    Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, TantivyDocument as Document,
};

use super::embedding::EmbeddingGenerator;
use super::schema::CollectionSchema;
use super::store::{CollectionIndex, VectorStore, embed_records, log_failure, query_index};
use super::types::{Metadata, MetadataValue, QueryResult, StoredRecord};
use crate::error::{StorageError, StorageResult};

const MANIFEST_FILE: &str = "collection.json";
const INDEX_DIR: &str = "index";

/// Identity of a collection, checked on every reopen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionManifest {
    pub name: String,
    pub embedding_model: String,
    pub dimension: usize,
}

/// Collection persisted under a root directory.
pub struct PersistentCollection {
    name: String,
    path: PathBuf,
    index: Index,
    reader: IndexReader,
    schema: CollectionSchema,
    writer: Option<IndexWriter<Document>>,
    embedder: Box<dyn EmbeddingGenerator>,
    records: CollectionIndex,
    heap_size: usize,
}

impl std::fmt::Debug for PersistentCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCollection")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("model", &self.embedder.model_name())
            .field("count", &self.records.len())
            .field("has_writer", &self.writer.is_some())
            .finish()
    }
}

impl PersistentCollection {
    /// Open `<root>/<name>/`, creating it on first use.
    ///
    /// Fails with [`StorageError::IncompatibleCollection`] when the stored
    /// embedding model or dimension differs from `embedder`.
    pub fn open(
        root: impl AsRef<Path>,
        name: &str,
        embedder: Box<dyn EmbeddingGenerator>,
    ) -> StorageResult<Self> {
        let result = Self::open_inner(root.as_ref(), name, embedder);
        log_failure(name, result)
    }

    fn open_inner(
        root: &Path,
        name: &str,
        embedder: Box<dyn EmbeddingGenerator>,
    ) -> StorageResult<Self> {
        validate_name(name)?;

        let path = root.join(name);
        std::fs::create_dir_all(&path)?;

        let manifest = CollectionManifest {
            name: name.to_string(),
            embedding_model: embedder.model_name().to_string(),
            dimension: embedder.dimension(),
        };
        reconcile_manifest(&path.join(MANIFEST_FILE), &manifest)?;

        let index_path = path.join(INDEX_DIR);
        std::fs::create_dir_all(&index_path)?;

        let (tantivy_schema, schema) = CollectionSchema::build();
        let existing = index_path.join("meta.json").exists();
        let index = if existing {
            Index::open_in_dir(&index_path)?
        } else {
            let dir = MmapDirectory::open(&index_path)?;
            Index::create(dir, tantivy_schema, IndexSettings::default())?
        };

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        if existing {
            reader.reload()?;
        }

        let records = load_records(name, &reader, &schema)?;
        tracing::info!(
            target: "store",
            "opened collection '{name}' at {} ({} records)",
            path.display(),
            records.len()
        );

        Ok(Self {
            name: name.to_string(),
            path,
            index,
            reader,
            schema,
            writer: None,
            embedder,
            records: CollectionIndex::from_records(records),
            heap_size: 50_000_000,
        })
    }

    /// Directory holding this collection.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_writer(&mut self) -> StorageResult<&mut IndexWriter<Document>> {
        if self.writer.is_none() {
            self.writer = Some(self.index.writer(self.heap_size)?);
        }
        self.writer
            .as_mut()
            .ok_or_else(|| StorageError::Serialization("index writer unavailable".to_string()))
    }

    fn write_records(&mut self, records: &[StoredRecord]) -> StorageResult<()> {
        let start_seq = self.records.len() as u64;

        let mut documents = Vec::with_capacity(records.len());
        for (offset, record) in records.iter().enumerate() {
            documents.push(to_document(&self.schema, record, start_seq + offset as u64)?);
        }

        let writer = self.ensure_writer()?;
        let written = documents
            .into_iter()
            .try_for_each(|doc| writer.add_document(doc).map(|_| ()))
            .and_then(|()| writer.commit().map(|_| ()));

        if let Err(e) = written {
            writer.rollback()?;
            return Err(e.into());
        }

        self.reader.reload()?;
        Ok(())
    }
}

impl VectorStore for PersistentCollection {
    fn add(
        &mut self,
        ids: &[String],
        documents: &[String],
        metadatas: Option<&[Metadata]>,
    ) -> StorageResult<()> {
        let result = self
            .records
            .validate_batch(ids, documents, metadatas)
            .and_then(|()| embed_records(self.embedder.as_ref(), ids, documents, metadatas));
        let records = log_failure(&self.name, result)?;

        let written = self.write_records(&records);
        log_failure(&self.name, written)?;

        self.records.extend(records);
        tracing::debug!(target: "store", "added {} document(s) to '{}'", ids.len(), self.name);
        Ok(())
    }

    fn query(&self, query_texts: &[&str], n_results: usize) -> StorageResult<QueryResult> {
        log_failure(
            &self.name,
            query_index(&self.records, self.embedder.as_ref(), query_texts, n_results),
        )
    }

    fn count(&self) -> usize {
        self.records.len()
    }

    fn contains_metadata(&self, key: &str, value: &MetadataValue) -> bool {
        self.records.contains_metadata(key, value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn validate_name(name: &str) -> StorageResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control);
    if valid {
        Ok(())
    } else {
        Err(StorageError::IncompatibleCollection {
            name: name.to_string(),
            reason: "collection names must be a single path component".to_string(),
        })
    }
}

/// Write the manifest on first open, compare it afterwards.
fn reconcile_manifest(path: &Path, expected: &CollectionManifest) -> StorageResult<()> {
    if !path.exists() {
        let json = serde_json::to_string_pretty(expected)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        return Ok(());
    }

    let content = std::fs::read_to_string(path)?;
    let stored: CollectionManifest = serde_json::from_str(&content).map_err(|e| {
        StorageError::CorruptRecord {
            collection: expected.name.clone(),
            reason: format!("{MANIFEST_FILE}: {e}"),
        }
    })?;

    if stored.embedding_model != expected.embedding_model {
        return Err(StorageError::IncompatibleCollection {
            name: expected.name.clone(),
            reason: format!(
                "created with embedding model {}, opened with {}",
                stored.embedding_model, expected.embedding_model
            ),
        });
    }
    if stored.dimension != expected.dimension {
        return Err(StorageError::IncompatibleCollection {
            name: expected.name.clone(),
            reason: format!(
                "stored dimension {}, embedder produces {}",
                stored.dimension, expected.dimension
            ),
        });
    }

    Ok(())
}

fn to_document(
    schema: &CollectionSchema,
    record: &StoredRecord,
    seq: u64,
) -> StorageResult<Document> {
    let metadata_json = serde_json::to_string(&record.metadata)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let embedding_json = serde_json::to_string(&record.embedding)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let mut doc = Document::default();
    doc.add_text(schema.chunk_id, &record.id);
    doc.add_text(schema.document, &record.document);
    doc.add_text(schema.metadata_json, &metadata_json);
    doc.add_text(schema.embedding_json, &embedding_json);
    doc.add_u64(schema.seq, seq);
    Ok(doc)
}

fn load_records(
    collection: &str,
    reader: &IndexReader,
    schema: &CollectionSchema,
) -> StorageResult<Vec<StoredRecord>> {
    let searcher = reader.searcher();
    let total = searcher.num_docs() as usize;
    if total == 0 {
        return Ok(Vec::new());
    }

    let corrupt = |reason: String| StorageError::CorruptRecord {
        collection: collection.to_string(),
        reason,
    };

    let top_docs = searcher.search(&AllQuery, &TopDocs::with_limit(total))?;
    let mut records = Vec::with_capacity(top_docs.len());

    for (_score, doc_address) in top_docs {
        let doc: Document = searcher.doc(doc_address)?;

        let text = |field, label: &str| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| corrupt(format!("missing {label}")))
        };

        let id = text(schema.chunk_id, "chunk_id")?;
        let document = text(schema.document, "document")?;
        let metadata: Option<Metadata> = serde_json::from_str(&text(schema.metadata_json, "metadata")?)
            .map_err(|e| corrupt(format!("{id}: metadata: {e}")))?;
        let embedding: Vec<f32> = serde_json::from_str(&text(schema.embedding_json, "embedding")?)
            .map_err(|e| corrupt(format!("{id}: embedding: {e}")))?;
        let seq = doc
            .get_first(schema.seq)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| corrupt(format!("{id}: missing seq")))?;

        records.push((seq, StoredRecord {
            id,
            document,
            metadata,
            embedding,
        }));
    }

    records.sort_by_key(|(seq, _)| *seq);
    Ok(records.into_iter().map(|(_, record)| record).collect())
}
