//! Tantivy schema for persistent collections.

use tantivy::schema::{FAST, Field, STORED, STRING, Schema, SchemaBuilder, TEXT};

/// Fields of one stored collection record.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    /// Chunk identifier (`id_<n>`), exact match.
    pub chunk_id: Field,

    /// Document text.
    pub document: Field,

    /// Metadata map as JSON, `null` when absent.
    pub metadata_json: Field,

    /// Embedding vector as a JSON array.
    pub embedding_json: Field,

    /// Insertion sequence; restores order on reopen.
    pub seq: Field,
}

impl CollectionSchema {
    pub fn build() -> (Schema, Self) {
        let mut builder = SchemaBuilder::default();

        let chunk_id = builder.add_text_field("chunk_id", STRING | STORED);
        let document = builder.add_text_field("document", TEXT | STORED);
        let metadata_json = builder.add_text_field("metadata_json", STORED);
        let embedding_json = builder.add_text_field("embedding_json", STORED);
        let seq = builder.add_u64_field("seq", STORED | FAST);

        let schema = builder.build();
        (
            schema,
            Self {
                chunk_id,
                document,
                metadata_json,
                embedding_json,
                seq,
            },
        )
    }
}
