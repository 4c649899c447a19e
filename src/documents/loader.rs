//! PDF loading.
//!
//! Extracts text per physical page and normalizes it for sentence splitting.

use std::path::Path;

use super::types::Page;
use crate::error::LoadError;

/// Loads PDF files into pages.
#[derive(Debug, Clone, Default)]
pub struct PdfLoader {
    /// Added to the zero-based physical page index.
    page_offset: i64,
}

impl PdfLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renumber pages relative to the printed numbering.
    ///
    /// Scanned rulings often carry front matter, so physical page 41 may be
    /// printed page 0. Use `-41` for that case.
    pub fn with_page_offset(mut self, page_offset: i64) -> Self {
        self.page_offset = page_offset;
        self
    }

    pub fn page_offset(&self) -> i64 {
        self.page_offset
    }

    /// Read and parse a PDF into one page per physical page.
    ///
    /// Either every page is returned or an error. Pages carry the file name
    /// as their source.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<Page>, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let texts = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
            LoadError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        let source = source_name(path);
        let pages: Vec<Page> = self
            .pages_from_texts(&texts)
            .into_iter()
            .map(|page| page.with_source(source.clone()))
            .collect();
        tracing::debug!(target: "loader", "loaded {} page(s) from {}", pages.len(), path.display());
        Ok(pages)
    }

    /// Number and normalize already extracted page texts, in page order.
    pub fn pages_from_texts<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Page> {
        texts
            .iter()
            .enumerate()
            .map(|(index, raw)| Page::new(index as i64 + self.page_offset, format_text(raw.as_ref())))
            .collect()
    }
}

/// File name recorded as the `source` of a document's chunks.
pub fn source_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

/// Collapse newlines to spaces and trim.
pub fn format_text(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ").trim().to_string()
}
