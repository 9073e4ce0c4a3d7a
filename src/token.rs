//! Persisted client-side values (the preview-mode API token).
//!
//! SYSTEM CONTEXT
//! ==============
//! Preview deployments ask the agent for an API token once and keep it under
//! a fixed key. Values live in a small JSON object on disk so other keys can
//! share the file. A missing file reads as empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::config::ChatConfig;
use crate::types::ChatError;

/// Key the preview credential prompt stores its token under.
pub const PREVIEW_TOKEN_KEY: &str = "ai-token";

pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `config.state_file`, falling back to the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] when no override is set and the platform
    /// has no home directory.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        if let Some(path) = &config.state_file {
            return Ok(Self::new(path.clone()));
        }
        let dirs = ProjectDirs::from("com", "ticket-chat", "TicketChat")
            .ok_or_else(|| ChatError::Storage("no home directory for local state".into()))?;
        Ok(Self::new(dirs.data_dir().join("state.json")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] if the file exists but is unreadable or
    /// not a JSON object of strings.
    pub fn load(&self, key: &str) -> Result<Option<String>, ChatError> {
        Ok(self.read_all()?.remove(key))
    }

    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] if the file cannot be read or written.
    pub fn save(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    /// Remove `key`, returning whether it was present.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Storage`] if the file cannot be read or written.
    pub fn remove(&self, key: &str) -> Result<bool, ChatError> {
        let mut values = self.read_all()?;
        if values.remove(key).is_none() {
            return Ok(false);
        }
        self.write_all(&values)?;
        Ok(true)
    }

    /// Whether the preview credential prompt would have to be shown.
    ///
    /// # Errors
    ///
    /// Propagates [`TokenStore::load`] failures.
    pub fn needs_preview_token(&self, config: &ChatConfig) -> Result<bool, ChatError> {
        if !config.preview {
            return Ok(false);
        }
        Ok(self.load(PREVIEW_TOKEN_KEY)?.is_none_or(|token| token.trim().is_empty()))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, ChatError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(ChatError::Storage(format!("{}: {e}", self.path.display()))),
        };
        serde_json::from_str(&text).map_err(|e| ChatError::Storage(format!("{}: {e}", self.path.display())))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ChatError::Storage(format!("{}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(values).map_err(|e| ChatError::Storage(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| ChatError::Storage(format!("{}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), keys = values.len(), "local state saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
