//! Retrieval-augmented answering.

use std::num::NonZeroUsize;
use std::path::Path;

use super::indexer::Indexer;
use super::state::{IndexProgress, PipelineState};
use crate::documents::{Page, PdfLoader};
use crate::error::PipelineResult;
use crate::model::LanguageModel;
use crate::prompts::{PromptRegistry, build_context};
use crate::types::Language;
use crate::vector::{QueryResult, VectorStore};

/// Chunks retrieved per question unless configured.
pub const DEFAULT_N_RESULTS: usize = 3;

/// An answer with the passages it was grounded on.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    pub context: QueryResult,
}

/// Sequences loading, indexing, retrieval and generation.
///
/// The pipeline owns its store and model and borrows the prompt registry.
pub struct RagPipeline<'p> {
    indexer: Indexer,
    model: LanguageModel,
    prompts: &'p PromptRegistry,
    language: Language,
    n_results: usize,
    state: PipelineState,
}

impl std::fmt::Debug for RagPipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("indexer", &self.indexer)
            .field("model", &self.model.model_id())
            .field("language", &self.language)
            .field("n_results", &self.n_results)
            .field("state", &self.state)
            .finish()
    }
}

impl<'p> RagPipeline<'p> {
    pub fn new(
        store: Box<dyn VectorStore>,
        model: LanguageModel,
        prompts: &'p PromptRegistry,
        language: Language,
    ) -> Self {
        Self {
            indexer: Indexer::new(store, language),
            model,
            prompts,
            language,
            n_results: DEFAULT_N_RESULTS,
            state: PipelineState::Idle,
        }
    }

    pub fn with_loader(mut self, loader: PdfLoader) -> Self {
        self.indexer = self.indexer.with_loader(loader);
        self
    }

    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn n_results(&self) -> usize {
        self.n_results
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.indexer.store()
    }

    /// Load a PDF into pages.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> PipelineResult<Vec<Page>> {
        let pages = self.indexer.load_file(path)?;
        self.state = PipelineState::Loaded;
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

    pub fn insert_data_to_db_with_progress<F>(
        &mut self,
        pages: &[Page],
        sentences_per_chunk: NonZeroUsize,
        on_progress: F,
    ) -> PipelineResult<usize>
    where
        F: FnMut(IndexProgress),
    {
        let stored =
            self.indexer
                .insert_data_to_db_with_progress(pages, sentences_per_chunk, on_progress)?;
        self.state = PipelineState::Indexed;
        Ok(stored)
    }

    /// Whether chunks of a file with this name are already stored.
    pub fn is_indexed(&self, path: impl AsRef<Path>) -> bool {
        self.indexer.is_indexed(path)
    }

    /// Load and index one file, skipping a file already in the collection.
    pub fn index_file(
        &mut self,
        path: impl AsRef<Path>,
        sentences_per_chunk: NonZeroUsize,
    ) -> PipelineResult<usize> {
        let stored = self.indexer.index_file(path, sentences_per_chunk)?;
        self.state = PipelineState::Indexed;
        Ok(stored)
    }

    /// Nearest chunks for `query`.
    pub fn query_db(&mut self, query: &str, n_results: usize) -> PipelineResult<QueryResult> {
        let result = self.indexer.query_db(query, n_results)?;
        self.state = PipelineState::Queried;
        Ok(result)
    }

    /// Render the template of the configured model and language.
    pub fn prepare_prompt<S: AsRef<str>>(
        &self,
        query: &str,
        context_items: &[S],
    ) -> PipelineResult<String> {
        let template = self.prompts.get(self.model.model_id(), self.language)?;
        Ok(template.render(&build_context(context_items), query))
    }

    /// Retrieve, prompt and generate. Returns the answer only.
    pub fn prompt_with_rag(&mut self, query: &str) -> PipelineResult<String> {
        Ok(self.answer(query)?.answer)
    }

    /// Retrieve, prompt and generate, keeping the retrieved context.
    pub fn answer(&mut self, query: &str) -> PipelineResult<RagAnswer> {
        let context = self.query_db(query, self.n_results)?;
        let prompt = self.prepare_prompt(query, context.first_documents())?;
        tracing::trace!(target: "pipeline", "prompt:\n{prompt}");

        let answer = self.model.generate(&prompt)?;
        self.state = PipelineState::Answered;
        Ok(RagAnswer { answer, context })
    }
}
