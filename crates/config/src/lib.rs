//! Configuration loading, validation, and management for SkillRelay.
//!
//! Loads configuration from `skillrelay.toml` (or an explicit path) with
//! `.env` and environment variable overrides. Validates all settings at
//! startup so that a bad deployment fails before it serves traffic.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the inference provider token.
pub const TOKEN_ENV: &str = "HF_TOKEN";

/// The root configuration structure.
///
/// Maps directly to `skillrelay.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider access token. Only ever read from the environment.
    #[serde(skip)]
    pub hf_token: Option<String>,

    /// HTTP listener configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Model fallback and generation settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// Grounding context configuration
    #[serde(default)]
    pub context: ContextConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("hf_token", &redact(&self.hf_token))
            .field("gateway", &self.gateway)
            .field("relay", &self.relay)
            .field("context", &self.context)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. Empty = any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL of the OpenAI-compatible inference endpoint
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// Candidate models, tried in this order on every request
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Maximum tokens per generated reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on a single model attempt
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

fn default_provider_url() -> String {
    "https://router.huggingface.co/v1".into()
}
fn default_models() -> Vec<String> {
    vec![
        "meta-llama/Meta-Llama-3-8B-Instruct".into(),
        "Qwen/Qwen2.5-72B-Instruct".into(),
        "HuggingFaceH4/zephyr-7b-beta".into(),
        "google/gemma-1.1-7b-it".into(),
    ]
}
fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f32 {
    0.7
}
fn default_attempt_timeout_secs() -> u64 {
    30
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            models: default_models(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Replace the built-in platform guide with the contents of this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_path: Option<String>,
}

impl AppConfig {
    /// Load configuration for a running process.
    ///
    /// Order: `.env` in the working directory, then the config file
    /// (`path`, or `skillrelay.toml`), then environment overrides:
    /// - `HF_TOKEN`
    /// - `SKILLRELAY_PORT`
    /// - `SKILLRELAY_PROVIDER_URL`
    /// - `SKILLRELAY_MODELS` (comma-separated)
    ///
    /// Validation runs once, after the overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(env_path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_path.display());
        }

        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);
        Self::resolve(&path, |key| std::env::var(key).ok())
    }

    /// Read `path`, apply overrides from `lookup`, then validate.
    fn resolve<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::read_file(path)?;
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Default config file location, relative to the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from("skillrelay.toml")
    }

    /// Apply environment overrides using `lookup` to read variables.
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_ENV) {
            self.hf_token = Some(token);
        }

        if let Some(port) = lookup("SKILLRELAY_PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("SKILLRELAY_PORT is not a valid port: {port}"))
            })?;
        }

        if let Some(url) = lookup("SKILLRELAY_PROVIDER_URL") {
            self.relay.provider_url = url;
        }

        if let Some(models) = lookup("SKILLRELAY_MODELS") {
            self.relay.models = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.models.is_empty() {
            return Err(ConfigError::ValidationError(
                "relay.models must list at least one model".into(),
            ));
        }

        if self.relay.models.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "relay.models must not contain blank entries".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.relay.temperature) {
            return Err(ConfigError::ValidationError(
                "relay.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.relay.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "relay.max_tokens must be > 0".into(),
            ));
        }

        if self.relay.attempt_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "relay.attempt_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The provider token, or an error if the process must not start.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        match self.hf_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ConfigError::MissingCredential(TOKEN_ENV)),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("{0} is missing. Set it in the environment or in a .env file")]
    MissingCredential(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.gateway.port, 5000);
        assert_eq!(config.relay.models.len(), 4);
        assert_eq!(config.relay.models[0], "meta-llama/Meta-Llama-3-8B-Instruct");
        assert_eq!(config.relay.max_tokens, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.relay.models, config.relay.models);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn token_is_never_serialized() {
        let config = AppConfig {
            hf_token: Some("hf_secret".into()),
            ..AppConfig::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(!toml_str.contains("hf_secret"));
        assert!(!format!("{config:?}").contains("hf_secret"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config =
            AppConfig::resolve(Path::new("/nonexistent/skillrelay.toml"), env(&[])).unwrap();
        assert_eq!(config.relay.provider_url, "https://router.huggingface.co/v1");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillrelay.toml");
        std::fs::write(
            &path,
            r#"
[relay]
models = ["a/one", "b/two"]
attempt_timeout_secs = 5
"#,
        )
        .unwrap();

        let config = AppConfig::resolve(&path, env(&[])).unwrap();
        assert_eq!(config.relay.models, vec!["a/one", "b/two"]);
        assert_eq!(config.relay.attempt_timeout_secs, 5);
        assert_eq!(config.relay.max_tokens, 500);
        assert_eq!(config.gateway.port, 5000);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillrelay.toml");
        std::fs::write(&path, "[relay\nmodels = ").unwrap();

        let err = AppConfig::resolve(&path, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn empty_model_list_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillrelay.toml");
        std::fs::write(&path, "[relay]\nmodels = []\n").unwrap();

        let err = AppConfig::resolve(&path, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn env_models_fill_an_empty_file_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillrelay.toml");
        std::fs::write(&path, "[relay]\nmodels = []\n").unwrap();

        let config =
            AppConfig::resolve(&path, env(&[("SKILLRELAY_MODELS", "x/one, y/two")])).unwrap();
        assert_eq!(config.relay.models, vec!["x/one", "y/two"]);
    }

    #[test]
    fn invalid_env_override_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillrelay.toml");
        std::fs::write(&path, "[relay]\nmodels = [\"a/one\"]\n").unwrap();

        let err = AppConfig::resolve(&path, env(&[("SKILLRELAY_MODELS", " , ")])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.relay.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("HF_TOKEN", "hf_abc"),
                ("SKILLRELAY_PORT", "8080"),
                ("SKILLRELAY_MODELS", "x/first, ,y/second"),
            ]))
            .unwrap();

        assert_eq!(config.require_token().unwrap(), "hf_abc");
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.relay.models, vec!["x/first", "y/second"]);
    }

    #[test]
    fn bad_port_override_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("SKILLRELAY_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn missing_or_blank_token_is_fatal() {
        let config = AppConfig::default();
        assert!(matches!(
            config.require_token(),
            Err(ConfigError::MissingCredential("HF_TOKEN"))
        ));

        let blank = AppConfig {
            hf_token: Some("   ".into()),
            ..AppConfig::default()
        };
        assert!(blank.require_token().is_err());
    }
}
