use std::collections::BTreeMap;
use std::path::Path;

use super::builtin;
use crate::config::PromptEntry;
use crate::error::ConfigError;
use crate::types::Language;

const CONTEXT_SLOT: &str = "{context}";
const QUERY_SLOT: &str = "{query}";

/// A prompt with `{context}` and `{query}` interpolation points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fill both slots in one pass.
    ///
    /// Braces inside `context` or `query` are copied verbatim, so a query
    /// mentioning `{context}` is never expanded.
    pub fn render(&self, context: &str, query: &str) -> String {
        self.text
            .split(CONTEXT_SLOT)
            .map(|part| part.replace(QUERY_SLOT, query))
            .collect::<Vec<_>>()
            .join(context)
    }

    fn validate(&self, model: &str, language: Language) -> Result<(), ConfigError> {
        for slot in [CONTEXT_SLOT, QUERY_SLOT] {
            if !self.text.contains(slot) {
                return Err(ConfigError::InvalidValue {
                    field: format!("prompts[{model}/{language}]"),
                    reason: format!("template has no {slot} placeholder"),
                });
            }
        }
        Ok(())
    }
}

/// Templates keyed by (model id, language).
///
/// Built once at startup and passed by reference to whoever renders.
#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    prompts: BTreeMap<(String, Language), PromptTemplate>,
}

impl PromptRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the shipped templates.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        builtin::register_builtin(&mut registry);
        registry
    }

    /// Add or replace the template for a pair.
    pub fn register(
        &mut self,
        model: impl Into<String>,
        language: Language,
        template: impl Into<String>,
    ) {
        self.prompts
            .insert((model.into(), language), PromptTemplate::new(template));
    }

    /// Register `[[prompts]]` entries on top of what is present.
    ///
    /// Relative `file` paths resolve against `base_dir`.
    pub fn register_entries(
        &mut self,
        entries: &[PromptEntry],
        base_dir: &Path,
    ) -> Result<(), ConfigError> {
        for entry in entries {
            let text = match (&entry.template, &entry.file) {
                (Some(template), None) => template.clone(),
                (None, Some(file)) => {
                    let path = base_dir.join(file);
                    std::fs::read_to_string(&path)
                        .map_err(|source| ConfigError::PromptFile { path, source })?
                }
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: format!("prompts[{}/{}]", entry.model, entry.language),
                        reason: "set exactly one of `template` or `file`".to_string(),
                    });
                }
            };

            let template = PromptTemplate::new(text);
            template.validate(&entry.model, entry.language)?;

            tracing::debug!(
                target: "prompts",
                "registered prompt for {} ({})",
                entry.model,
                entry.language
            );
            self.prompts
                .insert((entry.model.clone(), entry.language), template);
        }
        Ok(())
    }

    /// Template for a pair, or [`ConfigError::MissingPrompt`].
    pub fn get(&self, model: &str, language: Language) -> Result<&PromptTemplate, ConfigError> {
        self.prompts
            .get(&(model.to_string(), language))
            .ok_or_else(|| ConfigError::MissingPrompt {
                model: model.to_string(),
                language: language.to_string(),
            })
    }

    pub fn contains(&self, model: &str, language: Language) -> bool {
        self.prompts.contains_key(&(model.to_string(), language))
    }

    /// Registered pairs in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, Language)> {
        self.prompts
            .keys()
            .map(|(model, language)| (model.as_str(), *language))
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// Bullet list of retrieved passages, one per line.
pub fn build_context<S: AsRef<str>>(items: &[S]) -> String {
    let joined = items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n- ");
    format!("- {joined}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::builtin::{BIELIK_11B_INSTRUCT, BIELIK_11B_INSTRUCT_GPTQ, GEMMA_2B_IT};
    use tempfile::TempDir;

    #[test]
    fn test_builtin_pairs() {
        let registry = PromptRegistry::with_builtin();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(GEMMA_2B_IT, Language::English));
        assert!(registry.contains(BIELIK_11B_INSTRUCT, Language::Polish));
        assert_eq!(
            registry.get(BIELIK_11B_INSTRUCT, Language::Polish).unwrap(),
            registry.get(BIELIK_11B_INSTRUCT_GPTQ, Language::Polish).unwrap()
        );
    }

    #[test]
    fn test_missing_pair() {
        let registry = PromptRegistry::with_builtin();
        let err = registry.get(GEMMA_2B_IT, Language::Polish).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingPrompt { ref model, ref language }
                if model == GEMMA_2B_IT && language == "polish"
        ));
    }

    #[test]
    fn test_builtin_templates_have_slots() {
        let registry = PromptRegistry::with_builtin();
        for (model, language) in registry.keys() {
            let template = registry.get(model, language).unwrap();
            template.validate(model, language).unwrap();
        }
    }

    #[test]
    fn test_render() {
        let template = PromptTemplate::new("Context:\n{context}\nQuestion: {query}");
        let prompt = template.render("- a\n- b", "why?");
        assert_eq!(prompt, "Context:\n- a\n- b\nQuestion: why?");
    }

    #[test]
    fn test_render_does_not_expand_inserted_text() {
        let template = PromptTemplate::new("{context} | {query}");
        assert_eq!(template.render("{query}", "{context}"), "{query} | {context}");
    }

    #[test]
    fn test_build_context() {
        assert_eq!(build_context(&["first", "second"]), "- first\n- second");
        assert_eq!(build_context(&["only"]), "- only");
    }

    #[test]
    fn test_register_entries_inline_and_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("en.txt"), "Q: {query}\nC: {context}").unwrap();

        let entries = vec![
            PromptEntry {
                model: "local/model".to_string(),
                language: Language::Polish,
                template: Some("{context}\n{query}".to_string()),
                file: None,
            },
            PromptEntry {
                model: "local/model".to_string(),
                language: Language::English,
                template: None,
                file: Some("en.txt".into()),
            },
        ];

        let mut registry = PromptRegistry::with_builtin();
        registry.register_entries(&entries, temp.path()).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry
                .get("local/model", Language::English)
                .unwrap()
                .render("ctx", "q"),
            "Q: q\nC: ctx"
        );
    }

    #[test]
    fn test_register_entry_without_placeholder() {
        let entries = vec![PromptEntry {
            model: "local/model".to_string(),
            language: Language::English,
            template: Some("no slots".to_string()),
            file: None,
        }];
        let err = PromptRegistry::new()
            .register_entries(&entries, Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
