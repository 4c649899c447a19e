//! Embedding generation and vector collections.

pub mod embedding;
pub mod persistent;
pub mod schema;
pub mod store;
pub mod types;

pub use embedding::{
    DEFAULT_EMBEDDING_MODEL, EmbeddingGenerator, FastEmbedGenerator, cosine_similarity,
    model_to_string, parse_embedding_model,
};
pub use persistent::{CollectionManifest, PersistentCollection};
pub use schema::CollectionSchema;
pub use store::{CollectionIndex, EphemeralCollection, VectorStore, open_store};
pub use types::{Metadata, MetadataValue, QueryHit, QueryResult, StoredRecord};
