//! Language-aware sentence segmentation.
//!
//! Boundaries come from Unicode sentence segmentation (UAX #29). Each
//! language then contributes a list of abbreviations after which a period
//! never closes a sentence, which matters for legal citations such as
//! `art. 17 § 1 pkt 3` or `ul. Marszałkowska`.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::ConfigError;
use crate::types::Language;

const POLISH_ABBREVIATIONS: &[&str] = &[
    "al", "art", "asp", "dn", "dr", "dz", "godz", "im", "kom", "kpt", "lit", "m.in", "mgr", "np",
    "nr", "ob", "ok", "par", "pkt", "płk", "por", "poz", "ppłk", "ppor", "prof", "prok", "sędz",
    "sierż", "sygn", "tj", "tzn", "tzw", "ul", "ust", "wg", "ww", "zw",
];

const ENGLISH_ABBREVIATIONS: &[&str] = &[
    "approx", "art", "cf", "dr", "e.g", "fig", "i.e", "jr", "mr", "mrs", "ms", "no", "nos",
    "para", "prof", "sec", "sr", "st", "u.s", "v", "vs",
];

/// Splits text into sentences for one language.
#[derive(Debug, Clone)]
pub struct Sentencizer {
    language: Language,
    abbreviations: HashSet<&'static str>,
}

impl Sentencizer {
    /// Build the segmenter for a language.
    pub fn new(language: Language) -> Self {
        let list = match language {
            Language::Polish => POLISH_ABBREVIATIONS,
            Language::English => ENGLISH_ABBREVIATIONS,
        };

        Self {
            language,
            abbreviations: list.iter().copied().collect(),
        }
    }

    /// Build the segmenter from a language name.
    pub fn for_language_name(name: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(name.parse()?))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Split text into ordered, trimmed, non-empty sentences.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut current = String::new();

        for bound in text.split_sentence_bounds() {
            current.push_str(bound);
            if self.ends_with_abbreviation(current.trim_end()) {
                continue;
            }
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
        push_trimmed(&mut sentences, &current);

        sentences
    }

    fn ends_with_abbreviation(&self, text: &str) -> bool {
        let Some(word) = text.split_whitespace().last() else {
            return false;
        };
        let Some(stem) = word.strip_suffix('.') else {
            return false;
        };
        let stem = stem.trim_start_matches(['(', '[', '"', '„']);

        // Initials: "J. Kowalski"
        let mut chars = stem.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return c.is_uppercase();
        }

        self.abbreviations.contains(stem.to_lowercase().as_str())
    }
}

fn push_trimmed(sentences: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
