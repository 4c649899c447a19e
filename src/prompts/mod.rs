//! Prompt templates keyed by model and language.

pub mod builtin;
pub mod registry;

pub use builtin::{BIELIK_11B_INSTRUCT, BIELIK_11B_INSTRUCT_GPTQ, GEMMA_2B_IT};
pub use registry::{PromptRegistry, PromptTemplate, build_context};
