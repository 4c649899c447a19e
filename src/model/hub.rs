//! Model file resolution through the Hugging Face hub.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::{Api, ApiBuilder};

use crate::error::ModelError;

/// Environment variable consulted when no token is configured.
pub const HF_TOKEN_ENV: &str = "HF_TOKEN";

/// Downloads and caches files of hub repositories.
pub struct HubClient {
    api: Api,
    cache_dir: PathBuf,
}

impl std::fmt::Debug for HubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubClient")
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

impl HubClient {
    /// Build a client caching under `cache_dir`.
    ///
    /// `token` falls back to `HF_TOKEN`; gated repositories need one.
    pub fn new(cache_dir: &Path, token: Option<&str>) -> Result<Self, ModelError> {
        let token = token
            .map(str::to_string)
            .or_else(|| std::env::var(HF_TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty());

        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.to_path_buf())
            .with_token(token)
            .with_progress(false)
            .build()
            .map_err(|e| ModelError::Hub {
                repo: String::new(),
                file: String::new(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            api,
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    /// Local path of `file` in `repo`, downloading it if needed.
    pub fn get(&self, repo: &str, file: &str) -> Result<PathBuf, ModelError> {
        tracing::debug!(target: "model", "resolving {repo}/{file}");
        self.api
            .model(repo.to_string())
            .get(file)
            .map_err(|e| ModelError::Hub {
                repo: repo.to_string(),
                file: file.to_string(),
                reason: e.to_string(),
            })
    }

    /// Like [`get`](Self::get), but a failure yields `None`.
    pub fn get_optional(&self, repo: &str, file: &str) -> Option<PathBuf> {
        match self.get(repo, file) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(target: "model", "{e}");
                None
            }
        }
    }
}
