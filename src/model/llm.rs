//! Prompt in, answer out.

use super::generation::{GenerationParams, GenerationRequest, TextGenerator};
use super::tokenizer::PromptTokenizer;
use crate::error::ModelError;

/// A tokenizer and a generation backend for one model.
pub struct LanguageModel {
    model_id: String,
    tokenizer: Box<dyn PromptTokenizer>,
    generator: Box<dyn TextGenerator>,
    params: GenerationParams,
    use_chat_template: bool,
    max_input_tokens: usize,
}

impl std::fmt::Debug for LanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageModel")
            .field("model_id", &self.model_id)
            .field("params", &self.params)
            .field("use_chat_template", &self.use_chat_template)
            .field("max_input_tokens", &self.max_input_tokens)
            .finish()
    }
}

impl LanguageModel {
    pub fn new(
        model_id: impl Into<String>,
        tokenizer: Box<dyn PromptTokenizer>,
        generator: Box<dyn TextGenerator>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            tokenizer,
            generator,
            params: GenerationParams::default(),
            use_chat_template: true,
            max_input_tokens: 4096,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Wrap prompts in the model's chat format when it has one.
    pub fn with_chat_template(mut self, enabled: bool) -> Self {
        self.use_chat_template = enabled;
        self
    }

    pub fn with_max_input_tokens(mut self, limit: usize) -> Self {
        self.max_input_tokens = limit;
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Format the prompt the way it is sent to the backend.
    pub fn pack_prompt(&self, prompt: &str) -> Result<String, ModelError> {
        if self.use_chat_template && self.tokenizer.has_chat_template() {
            self.tokenizer.apply_chat_template(prompt)
        } else {
            Ok(prompt.to_string())
        }
    }

    /// Generate an answer to `prompt`.
    ///
    /// Only the continuation is returned, never the echoed prompt.
    pub fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let packed = self.pack_prompt(prompt)?;
        let templated = self.use_chat_template && self.tokenizer.has_chat_template();

        // The template already carries the special tokens
        let input_ids = self.tokenizer.encode(&packed, !templated)?;
        if input_ids.len() > self.max_input_tokens {
            return Err(ModelError::PromptTooLong {
                tokens: input_ids.len(),
                limit: self.max_input_tokens,
            });
        }

        tracing::info!(
            target: "model",
            "generating with {} ({} prompt tokens)",
            self.model_id,
            input_ids.len()
        );

        let sequences = self.generator.generate(&GenerationRequest {
            prompt: &packed,
            input_ids: &input_ids,
            params: &self.params,
        })?;
        let first = sequences
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyGeneration)?;

        let answer = if first.tokens.is_empty() {
            first.text
        } else {
            self.tokenizer.decode(&first.tokens)?
        };
        Ok(answer.trim().to_string())
    }
}
