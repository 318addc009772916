//! Context store — the grounding text sent with every question.

use skillrelay_config::{ConfigError, ContextConfig};
use std::path::Path;

/// Built-in SkillHub user guide.
pub const PLATFORM_DOCS: &str = include_str!("platform_docs.md");

/// Immutable grounding text, read on every request.
#[derive(Debug, Clone)]
pub struct ContextStore {
    text: String,
}

impl ContextStore {
    /// The built-in platform guide.
    pub fn builtin() -> Self {
        Self {
            text: PLATFORM_DOCS.to_string(),
        }
    }

    /// Load replacement text from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if text.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "context file {} is empty",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), bytes = text.len(), "Loaded context documents");
        Ok(Self { text })
    }

    /// Build from config: the file named by `docs_path`, else the built-in guide.
    pub fn from_config(config: &ContextConfig) -> Result<Self, ConfigError> {
        match &config.docs_path {
            Some(path) => Self::load(Path::new(path)),
            None => Ok(Self::builtin()),
        }
    }

    /// The full grounding text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::builtin()
    }
}
