//! Loading, chunking and storing documents.

use std::num::NonZeroUsize;
use std::path::Path;

use super::state::IndexProgress;
use crate::documents::{Page, PdfLoader, Sentencizer, chunk_sentences, source_name};
use crate::error::PipelineResult;
use crate::types::{ChunkId, Language};
use crate::vector::{Metadata, MetadataValue, QueryResult, VectorStore};

/// Metadata key holding the file name a chunk was loaded from.
pub const SOURCE_KEY: &str = "source";

/// Metadata key holding the page number of a chunk.
pub const PAGE_KEY: &str = "page_nr";

/// Chunks embedded and written per store call.
pub const EMBEDDING_BATCH_SIZE: usize = 64;

/// The retrieval half of the pipeline. Needs no language model.
pub struct Indexer {
    loader: PdfLoader,
    sentencizer: Sentencizer,
    store: Box<dyn VectorStore>,
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("store", &self.store.name())
            .field("count", &self.store.count())
            .finish()
    }
}

impl Indexer {
    pub fn new(store: Box<dyn VectorStore>, language: Language) -> Self {
        Self {
            loader: PdfLoader::new(),
            sentencizer: Sentencizer::new(language),
            store,
        }
    }

    pub fn with_loader(mut self, loader: PdfLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    /// Load a PDF into pages. Each page carries the file name as its source.
    pub fn load_file(&self, path: impl AsRef<Path>) -> PipelineResult<Vec<Page>> {
        let path = path.as_ref();
        let pages = self.loader.load(path)?;
        tracing::info!(target: "pipeline", "loaded {} page(s) from {}", pages.len(), path.display());
        Ok(pages)
    }

    /// Chunk pages and write them to the store. Returns the chunk count.
    pub fn insert_data_to_db(
        &mut self,
        pages: &[Page],
        sentences_per_chunk: NonZeroUsize,
    ) -> PipelineResult<usize> {
        self.insert_data_to_db_with_progress(pages, sentences_per_chunk, |_| {})
    }

    /// Like [`insert_data_to_db`](Self::insert_data_to_db), reporting progress.
    ///
    /// Chunk ids continue from the store's current count, so indexing into a
    /// reopened collection never reuses an id. Chunks never span pages.
    pub fn insert_data_to_db_with_progress<F>(
        &mut self,
        pages: &[Page],
        sentences_per_chunk: NonZeroUsize,
        mut on_progress: F,
    ) -> PipelineResult<usize>
    where
        F: FnMut(IndexProgress),
    {
        let mut next_id = ChunkId::new(self.store.count() as u64);
        let mut ids = Vec::new();
        let mut documents = Vec::new();
        let mut metadatas = Vec::new();

        for (i, page) in pages.iter().enumerate() {
            let sentences = self.sentencizer.split(&page.text);
            for chunk in chunk_sentences(&sentences, sentences_per_chunk) {
                ids.push(next_id.to_string());
                documents.push(chunk);
                metadatas.push(chunk_metadata(page));
                next_id = next_id.next();
            }
            on_progress(IndexProgress::ChunkingPage {
                current: i + 1,
                total: pages.len(),
            });
        }

        let total = ids.len();
        tracing::debug!(
            target: "pipeline",
            "{total} chunk(s) from {} page(s), {sentences_per_chunk} sentence(s) each",
            pages.len()
        );

        let mut stored = 0;
        for start in (0..total).step_by(EMBEDDING_BATCH_SIZE) {
            let end = (start + EMBEDDING_BATCH_SIZE).min(total);
            self.store
                .add(&ids[start..end], &documents[start..end], Some(&metadatas[start..end]))?;
            stored = end;
            on_progress(IndexProgress::StoringChunks {
                current: stored,
                total,
            });
        }

        tracing::info!(
            target: "pipeline",
            "indexed {stored} chunk(s) into '{}' ({} total)",
            self.store.name(),
            self.store.count()
        );
        Ok(stored)
    }

    /// Whether chunks of a file with this name are already stored.
    pub fn is_indexed(&self, path: impl AsRef<Path>) -> bool {
        source_name(path.as_ref()).is_some_and(|source| {
            self.store
                .contains_metadata(SOURCE_KEY, &MetadataValue::Str(source))
        })
    }

    /// Load and index one file. A file already in the collection is skipped
    /// and adds no chunks.
    pub fn index_file(
        &mut self,
        path: impl AsRef<Path>,
        sentences_per_chunk: NonZeroUsize,
    ) -> PipelineResult<usize> {
        let path = path.as_ref();
        if self.is_indexed(path) {
            tracing::info!(target: "pipeline", "{} is already indexed, skipping", path.display());
            return Ok(0);
        }
        let pages = self.load_file(path)?;
        self.insert_data_to_db(&pages, sentences_per_chunk)
    }

    /// Nearest chunks for `query`.
    pub fn query_db(&self, query: &str, n_results: usize) -> PipelineResult<QueryResult> {
        let result = self.store.query(&[query], n_results)?;
        tracing::debug!(
            target: "pipeline",
            "retrieved {} chunk(s) for query",
            result.first_documents().len()
        );
        Ok(result)
    }
}

fn chunk_metadata(page: &Page) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(PAGE_KEY.to_string(), page.page_number.into());
    if let Some(ref source) = page.source {
        metadata.insert(SOURCE_KEY.to_string(), source.as_str().into());
    }
    metadata
}
