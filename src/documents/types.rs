//! Core types for loaded documents.

use serde::{Deserialize, Serialize};

/// One page of a loaded document with its text statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number relative to the printed numbering.
    pub page_number: i64,

    /// Normalized page text.
    pub text: String,

    /// Number of characters in the text.
    pub char_count: usize,

    /// Number of space-separated words.
    pub word_count: usize,

    /// Rough sentence count (split on ". ").
    pub sentence_count_raw: usize,

    /// Approximate token count (1 token ~ 4 characters).
    pub token_count: usize,

    /// File name of the document the page came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Page {
    /// Create a page and derive its statistics from the text.
    pub fn new(page_number: i64, text: impl Into<String>) -> Self {
        let text = text.into();
        let char_count = text.chars().count();
        Self {
            page_number,
            char_count,
            word_count: text.split(' ').count(),
            sentence_count_raw: text.split(". ").count(),
            token_count: char_count / 4,
            text,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    /// Whether the page carries any text.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}
