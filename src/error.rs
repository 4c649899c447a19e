//! Error kinds for the retrieval pipeline.
//!
//! Each stage owns one error enum. `PipelineError` aggregates them for the
//! orchestrator and the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading a source document. Terminal for that input.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse PDF {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Invalid or incomplete configuration. Surfaced immediately, never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Given language: {0} is not supported")]
    UnsupportedLanguage(String),

    #[error("No prompt registered for model '{model}' and language '{language}'")]
    MissingPrompt { model: String, language: String },

    #[error("Unknown embedding model: {0}")]
    UnknownEmbeddingModel(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cannot read prompt template {path}: {source}")]
    PromptFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures from the embedding model.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    ModelInit(String),

    #[error("Failed to generate embedding: {0}")]
    Generation(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Failures from a vector collection.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cardinality mismatch: {ids} ids, {documents} documents, {metadatas} metadatas")]
    CardinalityMismatch {
        ids: usize,
        documents: usize,
        metadatas: usize,
    },

    #[error("Duplicate chunk id: {0}")]
    DuplicateId(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Collection '{name}' is incompatible: {reason}")]
    IncompatibleCollection { name: String, reason: String },

    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("Directory error: {0}")]
    Directory(#[from] tantivy::directory::error::OpenDirectoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record in collection '{collection}': {reason}")]
    CorruptRecord { collection: String, reason: String },
}

/// Failures from the tokenizer or the generation backend.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model hub error for {repo}/{file}: {reason}")]
    Hub {
        repo: String,
        file: String,
        reason: String,
    },

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Chat template error: {0}")]
    ChatTemplate(String),

    #[error("Prompt has {tokens} tokens, the model accepts at most {limit}")]
    PromptTooLong { tokens: usize, limit: usize },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation server error: {status} - {body}")]
    Server { status: u16, body: String },

    #[error("Generation returned no sequences")]
    EmptyGeneration,
}

/// Any failure surfaced by the orchestrator.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
pub type StorageResult<T> = Result<T, StorageError>;
