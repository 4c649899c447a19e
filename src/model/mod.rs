//! Language model access: hub files, tokenizer, generation backend.

pub mod generation;
pub mod hub;
pub mod llm;
pub mod tokenizer;

pub use generation::{
    GeneratedSequence, GenerationParams, GenerationRequest, TextGenerator, TgiGenerator,
};
pub use hub::HubClient;
pub use llm::LanguageModel;
pub use tokenizer::{ChatTemplate, HfTokenizer, PromptTokenizer};
