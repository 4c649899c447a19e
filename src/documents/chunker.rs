//! Sentence chunking.
//!
//! Groups consecutive sentences into fixed-size paragraphs that become the
//! retrievable units of a collection.

use std::num::NonZeroUsize;
use std::slice::Chunks;

/// Sentences per chunk when not configured.
pub const DEFAULT_SENTENCES_PER_CHUNK: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(size) => size,
    None => unreachable!(),
};

/// Lazy iterator over joined sentence groups.
///
/// Produces `ceil(N / chunk_size)` items for `N` sentences; the last one may
/// hold fewer sentences. Cloning restarts from the current position.
#[derive(Debug, Clone)]
pub struct SentenceChunks<'a, S> {
    groups: Chunks<'a, S>,
}

impl<S: AsRef<str>> Iterator for SentenceChunks<'_, S> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.groups.next().map(join_sentences)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.groups.size_hint()
    }
}

impl<S: AsRef<str>> ExactSizeIterator for SentenceChunks<'_, S> {}

/// Chunk sentences into groups of `chunk_size`.
pub fn chunk_sentences<S: AsRef<str>>(
    sentences: &[S],
    chunk_size: NonZeroUsize,
) -> SentenceChunks<'_, S> {
    SentenceChunks {
        groups: sentences.chunks(chunk_size.get()),
    }
}

/// Join sentences with single spaces, collapse double spaces and trim.
fn join_sentences<S: AsRef<str>>(group: &[S]) -> String {
    let joined = group
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" ");
    joined.replace("  ", " ").trim().to_string()
}
