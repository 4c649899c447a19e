//! Document loading and chunking.
//!
//! This module provides:
//! - PDF loading into numbered pages with text statistics
//! - Language-aware sentence segmentation
//! - Fixed-size sentence chunking

pub mod chunker;
pub mod loader;
pub mod sentences;
pub mod types;

pub use chunker::{DEFAULT_SENTENCES_PER_CHUNK, SentenceChunks, chunk_sentences};
pub use loader::{PdfLoader, format_text, source_name};
pub use sentences::Sentencizer;
pub use types::Page;
