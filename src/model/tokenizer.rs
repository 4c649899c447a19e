//! Tokenization and chat templates.
//!
//! Instruction-tuned models expect the prompt wrapped in their chat format.
//! The Jinja template shipped in `tokenizer_config.json` is rendered with
//! minijinja, then the result is encoded without adding special tokens again.

use std::path::Path;

use minijinja::{Environment, ErrorKind, context};
use serde_json::Value;
use tokenizers::Tokenizer;

use super::hub::HubClient;
use crate::error::ModelError;

/// Text to token ids and back, plus the model's chat format.
pub trait PromptTokenizer: Send + Sync {
    /// Wrap `message` as a single user turn and open the assistant turn.
    fn apply_chat_template(&self, message: &str) -> Result<String, ModelError>;

    /// Whether [`apply_chat_template`](Self::apply_chat_template) can succeed.
    fn has_chat_template(&self) -> bool;

    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>, ModelError>;

    /// Decode ids, dropping special tokens.
    fn decode(&self, ids: &[u32]) -> Result<String, ModelError>;
}

/// A model's Jinja chat template with its special tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTemplate {
    source: String,
    bos_token: String,
    eos_token: String,
}

impl ChatTemplate {
    pub fn new(
        source: impl Into<String>,
        bos_token: impl Into<String>,
        eos_token: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            bos_token: bos_token.into(),
            eos_token: eos_token.into(),
        }
    }

    /// Read the template from a `tokenizer_config.json` document.
    ///
    /// Returns `None` when the model ships no template.
    pub fn from_tokenizer_config(config: &Value) -> Option<Self> {
        let source = match config.get("chat_template")? {
            Value::String(s) => s.clone(),
            // Named templates: prefer "default"
            Value::Array(entries) => {
                let named = |name: &str| {
                    entries.iter().find_map(|e| {
                        (e.get("name")?.as_str()? == name)
                            .then(|| e.get("template")?.as_str().map(str::to_string))
                            .flatten()
                    })
                };
                named("default").or_else(|| {
                    entries
                        .first()?
                        .get("template")?
                        .as_str()
                        .map(str::to_string)
                })?
            }
            _ => return None,
        };

        Some(Self::new(
            source,
            special_token(config, "bos_token"),
            special_token(config, "eos_token"),
        ))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render one user message with the generation prompt appended.
    pub fn render(&self, message: &str) -> Result<String, ModelError> {
        let mut env = Environment::new();
        env.add_function("raise_exception", raise_exception);

        env.render_str(
            &self.source,
            context! {
                messages => vec![context! { role => "user", content => message }],
                bos_token => &self.bos_token,
                eos_token => &self.eos_token,
                add_generation_prompt => true,
            },
        )
        .map_err(|e| ModelError::ChatTemplate(e.to_string()))
    }
}

fn raise_exception(message: String) -> Result<String, minijinja::Error> {
    Err(minijinja::Error::new(ErrorKind::InvalidOperation, message))
}

/// Special tokens are a plain string or an `AddedToken` object.
fn special_token(config: &Value, key: &str) -> String {
    match config.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(token)) => token
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// `tokenizers`-backed implementation.
pub struct HfTokenizer {
    tokenizer: Tokenizer,
    chat_template: Option<ChatTemplate>,
}

impl std::fmt::Debug for HfTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfTokenizer")
            .field("has_chat_template", &self.chat_template.is_some())
            .finish()
    }
}

impl HfTokenizer {
    /// Fetch `tokenizer.json` and `tokenizer_config.json` of `repo`.
    pub fn from_hub(hub: &HubClient, repo: &str) -> Result<Self, ModelError> {
        let tokenizer_path = hub.get(repo, "tokenizer.json")?;
        let config_path = hub.get_optional(repo, "tokenizer_config.json");
        if config_path.is_none() {
            tracing::warn!(target: "model", "{repo} has no tokenizer_config.json, chat template disabled");
        }
        Self::from_files(&tokenizer_path, config_path.as_deref())
    }

    pub fn from_files(tokenizer_path: &Path, config_path: Option<&Path>) -> Result<Self, ModelError> {
        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            ModelError::Tokenizer(format!("{}: {e}", tokenizer_path.display()))
        })?;

        let chat_template = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| ModelError::Tokenizer(format!("{}: {e}", path.display())))?;
                let config: Value = serde_json::from_str(&content)
                    .map_err(|e| ModelError::Tokenizer(format!("{}: {e}", path.display())))?;
                ChatTemplate::from_tokenizer_config(&config)
            }
            None => None,
        };

        Ok(Self {
            tokenizer,
            chat_template,
        })
    }
}

impl PromptTokenizer for HfTokenizer {
    fn apply_chat_template(&self, message: &str) -> Result<String, ModelError> {
        self.chat_template
            .as_ref()
            .ok_or_else(|| ModelError::ChatTemplate("model has no chat template".to_string()))?
            .render(message)
    }

    fn has_chat_template(&self) -> bool {
        self.chat_template.is_some()
    }

    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>, ModelError> {
        let encoding = self
            .tokenizer
            .encode(text, add_special_tokens)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, ModelError> {
        self.tokenizer
            .decode(ids, true)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Trimmed-down Gemma template
    const GEMMA_TEMPLATE: &str = "{{ bos_token }}{% if messages[0]['role'] == 'system' %}{{ raise_exception('System role not supported') }}{% endif %}{% for message in messages %}{{ '<start_of_turn>' + message['role'] + '\n' + message['content'] | trim + '<end_of_turn>\n' }}{% endfor %}{% if add_generation_prompt %}{{ '<start_of_turn>model\n' }}{% endif %}";

    #[test]
    fn test_render_single_user_turn() {
        let template = ChatTemplate::new(GEMMA_TEMPLATE, "<bos>", "<eos>");
        let rendered = template.render("  Co orzekł sąd?  ").unwrap();
        assert_eq!(
            rendered,
            "<bos><start_of_turn>user\nCo orzekł sąd?<end_of_turn>\n<start_of_turn>model\n"
        );
    }

    #[test]
    fn test_raise_exception_surfaces_as_error() {
        let template = ChatTemplate::new("{{ raise_exception('nope') }}", "", "");
        let err = template.render("hi").unwrap_err();
        assert!(matches!(err, ModelError::ChatTemplate(ref m) if m.contains("nope")));
    }

    #[test]
    fn test_from_tokenizer_config_string() {
        let config = json!({
            "chat_template": "{{ bos_token }}{{ messages[0]['content'] }}",
            "bos_token": "<s>",
            "eos_token": { "content": "</s>", "lstrip": false }
        });
        let template = ChatTemplate::from_tokenizer_config(&config).unwrap();
        assert_eq!(template.render("hej").unwrap(), "<s>hej");
        assert_eq!(template.eos_token, "</s>");
    }

    #[test]
    fn test_from_tokenizer_config_named_list() {
        let config = json!({
            "chat_template": [
                { "name": "tool_use", "template": "tool" },
                { "name": "default", "template": "default" }
            ]
        });
        let template = ChatTemplate::from_tokenizer_config(&config).unwrap();
        assert_eq!(template.source(), "default");
    }

    #[test]
    fn test_missing_template() {
        assert!(ChatTemplate::from_tokenizer_config(&json!({ "bos_token": "<s>" })).is_none());
    }
}
