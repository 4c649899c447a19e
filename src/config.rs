//! Configuration module for the retrieval pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.lai/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `LAI_` and use double underscores
//! to separate nested levels:
//! - `LAI_RETRIEVAL__N_RESULTS=5` sets `retrieval.n_results`
//! - `LAI_LLM__ENDPOINT=http://gpu-box:8080` sets `llm.endpoint`
//! - `LAI_LANGUAGE=english` sets `language`

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Language;
use crate::vector::parse_embedding_model;

/// Directory holding settings and local data.
pub const CONFIG_DIR: &str = ".lai";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .lai is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Language of the indexed documents and prompts
    #[serde(default = "default_language")]
    pub language: String,

    /// Cache for embedding weights and tokenizer files
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extra prompt templates, registered over the built-in ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<PromptEntry>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChunkingConfig {
    /// Consecutive sentences per stored chunk
    #[serde(default = "default_sentences_per_chunk")]
    pub sentences_per_chunk: usize,

    /// Added to the physical page index (e.g. -41 when page 41 is printed as 0)
    #[serde(default)]
    pub page_offset: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// fastembed model name or Hugging Face repository id
    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

/// Lifecycle of the vector collection.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In memory, gone when the process exits
    Ephemeral,
    /// Tantivy index under `path`
    #[default]
    Persistent,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,

    /// Root directory of persistent collections
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    #[serde(default = "default_collection")]
    pub collection: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Chunks retrieved per query
    #[serde(default = "default_n_results")]
    pub n_results: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    /// Hugging Face model id; selects tokenizer and prompt template
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Base URL of the text-generation server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Hub and server token; falls back to `HF_TOKEN`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_token: Option<String>,

    #[serde(default = "default_true")]
    pub use_chat_template: bool,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,

    /// Longest prompt accepted, in tokens
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `store = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

/// A `[[prompts]]` entry: inline `template` or a `file` to read.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PromptEntry {
    pub model: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_version() -> u32 {
    1
}
fn default_language() -> String {
    Language::Polish.to_string()
}
fn default_models_dir() -> PathBuf {
    PathBuf::from(".lai/models")
}
fn default_sentences_per_chunk() -> usize {
    3
}
fn default_embedding_model() -> String {
    crate::vector::DEFAULT_EMBEDDING_MODEL.to_string()
}
fn default_true() -> bool {
    true
}
fn default_store_path() -> PathBuf {
    PathBuf::from(".lai/db")
}
fn default_collection() -> String {
    "lai_db".to_string()
}
fn default_n_results() -> usize {
    3
}
fn default_llm_model() -> String {
    crate::prompts::BIELIK_11B_INSTRUCT.to_string()
}
fn default_endpoint() -> String {
    "http://localhost:8080".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_new_tokens() -> usize {
    512
}
fn default_max_input_tokens() -> usize {
    4096
}
fn default_request_timeout_secs() -> u64 {
    300
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            language: default_language(),
            models_dir: default_models_dir(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
            logging: LoggingConfig::default(),
            prompts: Vec::new(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            sentences_per_chunk: default_sentences_per_chunk(),
            page_offset: 0,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            show_download_progress: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_store_path(),
            collection: default_collection(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            n_results: default_n_results(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            endpoint: default_endpoint(),
            hub_token: None,
            use_chat_template: true,
            temperature: default_temperature(),
            max_new_tokens: default_max_new_tokens(),
            max_input_tokens: default_max_input_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .lai directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));

        Self::layered(&config_path).map(|mut settings| {
            // If workspace_root is not set in config, detect it
            if settings.workspace_root.is_none() {
                settings.workspace_root = Self::workspace_root();
            }
            settings
        })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::layered(path.as_ref())
    }

    fn layered(config_path: &Path) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore stays
            .merge(Env::prefixed("LAI_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for .lai directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Get the workspace root directory (where .lai is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured path against the workspace root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Directory that relative `[[prompts]]` files are read from.
    pub fn base_dir(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Configured language, parsed.
    pub fn language(&self) -> Result<Language, ConfigError> {
        self.language.parse()
    }

    pub fn sentences_per_chunk(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.chunking.sentences_per_chunk).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "chunking.sentences_per_chunk".to_string(),
                reason: "must be at least 1".to_string(),
            }
        })
    }

    /// Reject values that would only fail later in the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.language()?;
        self.sentences_per_chunk()?;
        parse_embedding_model(&self.embedding.model)?;

        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if self.retrieval.n_results == 0 {
            return Err(invalid("retrieval.n_results", "must be at least 1"));
        }
        if !(self.llm.temperature.is_finite() && self.llm.temperature > 0.0) {
            return Err(invalid("llm.temperature", "must be a positive number"));
        }
        if self.llm.max_new_tokens == 0 {
            return Err(invalid("llm.max_new_tokens", "must be at least 1"));
        }
        if self.llm.max_input_tokens == 0 {
            return Err(invalid("llm.max_input_tokens", "must be at least 1"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "must not be empty"));
        }
        if self.store.collection.trim().is_empty() {
            return Err(invalid("store.collection", "must not be empty"));
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE);
        let existed = config_path.exists();

        if !force && existed {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        if existed {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.language().unwrap(), Language::Polish);
        assert_eq!(settings.chunking.sentences_per_chunk, 3);
        assert_eq!(settings.store.kind, StoreKind::Persistent);
        assert_eq!(settings.store.collection, "lai_db");
        assert_eq!(settings.llm.model, "speakleash/Bielik-11B-v2.3-Instruct");
        settings.validate().unwrap();
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2
language = "english"

[chunking]
sentences_per_chunk = 5
page_offset = -41

[store]
kind = "ephemeral"
collection = "rulings"

[llm]
model = "google/gemma-2b-it"
temperature = 0.2

[[prompts]]
model = "local/model"
language = "polish"
template = "{context} {query}"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.language().unwrap(), Language::English);
        assert_eq!(settings.chunking.sentences_per_chunk, 5);
        assert_eq!(settings.chunking.page_offset, -41);
        assert_eq!(settings.store.kind, StoreKind::Ephemeral);
        assert_eq!(settings.store.collection, "rulings");
        assert_eq!(settings.llm.model, "google/gemma-2b-it");
        assert!((settings.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(settings.prompts.len(), 1);
        assert_eq!(settings.prompts[0].language, Language::Polish);
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.embedding.model = "BGESmallENV15".to_string();
        settings.store.path = PathBuf::from("/data/lai");

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.embedding.model, "BGESmallENV15");
        assert_eq!(loaded.store.path, PathBuf::from("/data/lai"));
    }

    #[test]
    fn test_token_not_saved_when_absent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        Settings::default().save(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(!content.contains("hub_token"));
        assert!(content.contains("[retrieval]"));
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        fs::write(&config_path, "[embedding]\nshow_download_progress = false\n").unwrap();

        let settings = Settings::load_from(&config_path).unwrap();

        // Modified values
        assert!(!settings.embedding.show_download_progress);

        // Default values should still be present
        assert_eq!(settings.embedding.model, "ParaphraseMLMiniLML12V2");
        assert_eq!(settings.store.path, PathBuf::from(".lai/db"));
    }

    #[test]
    fn test_env_override() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[llm]\nmax_new_tokens = 128\n").unwrap();

        unsafe {
            std::env::set_var("LAI_LLM__MAX_NEW_TOKENS", "64");
        }
        let settings = Settings::load_from(&config_path).unwrap();
        unsafe {
            std::env::remove_var("LAI_LLM__MAX_NEW_TOKENS");
        }

        // Environment variable should override config file
        assert_eq!(settings.llm.max_new_tokens, 64);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.language = "klingon".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::UnsupportedLanguage(_))
        ));

        let mut settings = Settings::default();
        settings.chunking.sentences_per_chunk = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut settings = Settings::default();
        settings.retrieval.n_results = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut settings = Settings::default();
        settings.llm.temperature = 0.0;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut settings = Settings::default();
        settings.embedding.model = "word2vec".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::UnknownEmbeddingModel(_))
        ));
    }

    #[test]
    fn test_resolve_path() {
        let mut settings = Settings::default();
        assert_eq!(settings.resolve_path(Path::new(".lai/db")), PathBuf::from(".lai/db"));

        settings.workspace_root = Some(PathBuf::from("/work"));
        assert_eq!(
            settings.resolve_path(Path::new(".lai/db")),
            PathBuf::from("/work/.lai/db")
        );
        assert_eq!(settings.resolve_path(Path::new("/abs")), PathBuf::from("/abs"));
    }
}
