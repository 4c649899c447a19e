//! Pipeline orchestration and construction from settings.

mod indexer;
mod rag;
mod state;

pub use indexer::{EMBEDDING_BATCH_SIZE, Indexer, PAGE_KEY, SOURCE_KEY};
pub use rag::{DEFAULT_N_RESULTS, RagAnswer, RagPipeline};
pub use state::{IndexProgress, PipelineState};

use std::time::Duration;

use crate::config::Settings;
use crate::documents::PdfLoader;
use crate::error::{EmbeddingError, PipelineResult, StorageResult};
use crate::model::{GenerationParams, HfTokenizer, HubClient, LanguageModel, TgiGenerator};
use crate::prompts::PromptRegistry;
use crate::vector::{EmbeddingGenerator, FastEmbedGenerator, VectorStore, open_store};

/// Prompt registry with built-ins and `[[prompts]]` entries.
pub fn build_prompt_registry(settings: &Settings) -> PipelineResult<PromptRegistry> {
    let mut registry = PromptRegistry::with_builtin();
    registry.register_entries(&settings.prompts, &settings.base_dir())?;
    Ok(registry)
}

/// The configured embedding model.
pub fn build_embedder(settings: &Settings) -> Result<Box<dyn EmbeddingGenerator>, EmbeddingError> {
    let generator = FastEmbedGenerator::from_settings(
        &settings.embedding.model,
        &settings.resolve_path(&settings.models_dir),
        settings.embedding.show_download_progress,
    )?;
    Ok(Box::new(generator))
}

/// The configured collection, with paths resolved against the workspace.
pub fn build_store(
    settings: &Settings,
    embedder: Box<dyn EmbeddingGenerator>,
) -> StorageResult<Box<dyn VectorStore>> {
    let mut store_config = settings.store.clone();
    store_config.path = settings.resolve_path(&settings.store.path);
    open_store(&store_config, embedder)
}

/// Tokenizer from the hub plus the configured generation server.
pub fn build_language_model(settings: &Settings) -> PipelineResult<LanguageModel> {
    let llm = &settings.llm;
    let hub = HubClient::new(
        &settings.resolve_path(&settings.models_dir),
        llm.hub_token.as_deref(),
    )?;
    let tokenizer = HfTokenizer::from_hub(&hub, &llm.model)?;

    let token = llm
        .hub_token
        .clone()
        .or_else(|| std::env::var(crate::model::hub::HF_TOKEN_ENV).ok());
    let generator = TgiGenerator::new(
        llm.endpoint.clone(),
        token,
        Duration::from_secs(llm.request_timeout_secs),
    )?;

    Ok(
        LanguageModel::new(llm.model.clone(), Box::new(tokenizer), Box::new(generator))
            .with_params(GenerationParams {
                do_sample: true,
                temperature: llm.temperature,
                max_new_tokens: llm.max_new_tokens,
            })
            .with_chat_template(llm.use_chat_template)
            .with_max_input_tokens(llm.max_input_tokens),
    )
}

/// An indexer wired from settings. Loads no language model.
pub fn build_indexer(settings: &Settings) -> PipelineResult<Indexer> {
    settings.validate()?;
    let language = settings.language()?;
    let store = build_store(settings, build_embedder(settings)?)?;
    Ok(Indexer::new(store, language).with_loader(build_loader(settings)))
}

fn build_loader(settings: &Settings) -> PdfLoader {
    PdfLoader::new().with_page_offset(settings.chunking.page_offset)
}

/// A pipeline wired from settings.
///
/// Settings are validated and the prompt looked up before any model is
/// loaded, so configuration mistakes fail fast.
pub fn build_pipeline<'p>(
    settings: &Settings,
    prompts: &'p PromptRegistry,
) -> PipelineResult<RagPipeline<'p>> {
    settings.validate()?;
    let language = settings.language()?;
    prompts.get(&settings.llm.model, language)?;

    let store = build_store(settings, build_embedder(settings)?)?;
    let model = build_language_model(settings)?;

    Ok(RagPipeline::new(store, model, prompts, language)
        .with_loader(build_loader(settings))
        .with_n_results(settings.retrieval.n_results))
}
