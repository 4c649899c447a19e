//! Text embedding generation.
//!
//! The store only needs "text in, vectors out", so the model sits behind
//! [`EmbeddingGenerator`]. [`FastEmbedGenerator`] is the production
//! implementation backed by fastembed's ONNX models.

use std::path::Path;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{ConfigError, EmbeddingError};

/// Multilingual model used when none is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "ParaphraseMLMiniLML12V2";

/// Produces fixed-dimension vectors for text.
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed each text; output order matches input order.
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Length of every produced vector.
    fn dimension(&self) -> usize;

    /// Stable model identifier, recorded with persistent collections.
    fn model_name(&self) -> &str;
}

/// fastembed-backed generator.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_name: String,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Load a model by name, caching weights under `cache_dir`.
    pub fn from_settings(
        model_name: &str,
        cache_dir: &Path,
        show_download_progress: bool,
    ) -> Result<Self, EmbeddingError> {
        let model = parse_embedding_model(model_name)
            .map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;
        Self::with_model(model, cache_dir, show_download_progress)
    }

    pub fn with_model(
        model: EmbeddingModel,
        cache_dir: &Path,
        show_download_progress: bool,
    ) -> Result<Self, EmbeddingError> {
        let model_name = model_to_string(&model);
        tracing::info!(target: "embedding", "loading embedding model {model_name}");

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir.to_path_buf())
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;

        // Embed one text to learn the dimension
        let sample = text_model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?;
        let dimension = sample
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::ModelInit("model returned no embedding".to_string()))?;

        tracing::debug!(target: "embedding", "{model_name} ready, {dimension} dimensions");

        Ok(Self {
            model: Mutex::new(text_model),
            dimension,
            model_name,
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::LockPoisoned)?
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?;

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Resolve a configured model name.
///
/// Accepts the fastembed variant name or the Hugging Face repository id.
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, ConfigError> {
    let model = match name.trim() {
        "AllMiniLML6V2" | "sentence-transformers/all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
        "AllMiniLML12V2" | "sentence-transformers/all-MiniLM-L12-v2" => {
            EmbeddingModel::AllMiniLML12V2
        }
        "BGESmallENV15" | "BAAI/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "BGEBaseENV15" | "BAAI/bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "MultilingualE5Small" | "intfloat/multilingual-e5-small" => {
            EmbeddingModel::MultilingualE5Small
        }
        "MultilingualE5Base" | "intfloat/multilingual-e5-base" => {
            EmbeddingModel::MultilingualE5Base
        }
        "MultilingualE5Large" | "intfloat/multilingual-e5-large" => {
            EmbeddingModel::MultilingualE5Large
        }
        "ParaphraseMLMiniLML12V2"
        | "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2" => {
            EmbeddingModel::ParaphraseMLMiniLML12V2
        }
        other => return Err(ConfigError::UnknownEmbeddingModel(other.to_string())),
    };
    Ok(model)
}

/// Canonical name for a model, the inverse of [`parse_embedding_model`].
pub fn model_to_string(model: &EmbeddingModel) -> String {
    match model {
        EmbeddingModel::AllMiniLML6V2 => "AllMiniLML6V2",
        EmbeddingModel::AllMiniLML12V2 => "AllMiniLML12V2",
        EmbeddingModel::BGESmallENV15 => "BGESmallENV15",
        EmbeddingModel::BGEBaseENV15 => "BGEBaseENV15",
        EmbeddingModel::MultilingualE5Small => "MultilingualE5Small",
        EmbeddingModel::MultilingualE5Base => "MultilingualE5Base",
        EmbeddingModel::MultilingualE5Large => "MultilingualE5Large",
        EmbeddingModel::ParaphraseMLMiniLML12V2 => "ParaphraseMLMiniLML12V2",
        other => return format!("{other:?}"),
    }
    .to_string()
}

/// Cosine similarity in `[-1, 1]`; zero for a zero-length vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
