pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod types;
pub mod vector;

pub use config::Settings;
pub use documents::{Page, PdfLoader, Sentencizer, chunk_sentences};
pub use error::{ConfigError, EmbeddingError, LoadError, ModelError, PipelineError, StorageError};
pub use model::{LanguageModel, PromptTokenizer, TextGenerator};
pub use pipeline::{Indexer, RagAnswer, RagPipeline, build_indexer, build_pipeline};
pub use prompts::{PromptRegistry, PromptTemplate};
pub use types::{ChunkId, Language};
pub use vector::{EmbeddingGenerator, Metadata, QueryResult, VectorStore};
