//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use lai::error::{EmbeddingError, ModelError};
use lai::model::{GeneratedSequence, GenerationRequest, PromptTokenizer, TextGenerator};
use lai::vector::EmbeddingGenerator;

/// Counts topic words, so related texts land close together.
pub struct TopicEmbedder;

const TOPICS: &[&[&str]] = &[
    &["rower", "roweru", "bicycle"],
    &["samochód", "samochodu", "car"],
    &["kradzież", "kradzieży", "theft"],
    &["alkohol", "nietrzeźwy", "drunk"],
];

impl EmbeddingGenerator for TopicEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let text = text.to_lowercase();
                TOPICS
                    .iter()
                    .map(|words| {
                        words.iter().map(|w| text.matches(w).count()).sum::<usize>() as f32 + 0.01
                    })
                    .collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        TOPICS.len()
    }

    fn model_name(&self) -> &str {
        "topic-counter"
    }
}

/// Whitespace tokenizer over a growing vocabulary.
#[derive(Default)]
pub struct WordTokenizer {
    vocab: Mutex<Vec<String>>,
}

impl PromptTokenizer for WordTokenizer {
    fn apply_chat_template(&self, message: &str) -> Result<String, ModelError> {
        Ok(format!("<user> {message} <model>"))
    }

    fn has_chat_template(&self) -> bool {
        true
    }

    fn encode(&self, text: &str, _add_special_tokens: bool) -> Result<Vec<u32>, ModelError> {
        let mut vocab = self.vocab.lock().unwrap();
        Ok(text
            .split_whitespace()
            .map(|word| match vocab.iter().position(|w| w == word) {
                Some(i) => i as u32,
                None => {
                    vocab.push(word.to_string());
                    (vocab.len() - 1) as u32
                }
            })
            .collect())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, ModelError> {
        let vocab = self.vocab.lock().unwrap();
        Ok(ids
            .iter()
            .map(|&id| vocab[id as usize].as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }
}

/// Answers with fixed text and records every prompt it receives.
pub struct CannedGenerator {
    pub answer: String,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl CannedGenerator {
    pub fn new(answer: &str) -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = Self {
            answer: answer.to_string(),
            prompts: Arc::clone(&prompts),
        };
        (generator, prompts)
    }
}

impl TextGenerator for CannedGenerator {
    fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<Vec<GeneratedSequence>, ModelError> {
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        Ok(vec![GeneratedSequence {
            tokens: Vec::new(),
            text: format!("  {}\n", self.answer),
        }])
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Write a PDF with one text line per page.
pub fn write_pdf(path: &std::path::Path, pages: &[&str]) {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
