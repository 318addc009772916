//! Subcommand implementations and the shared startup wiring.

pub mod ask;
pub mod doctor;
pub mod models;
pub mod serve;

use skillrelay_config::AppConfig;
use skillrelay_providers::OpenAiCompatProvider;
use skillrelay_relay::{ChatRelay, ContextStore, RelaySettings};
use std::path::Path;
use std::sync::Arc;

pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}").into())
}

/// Build the relay once; it is shared by every request for the process lifetime.
///
/// Fails when the provider token is absent so that nothing starts serving.
pub fn build_relay(config: &AppConfig) -> Result<Arc<ChatRelay>, Box<dyn std::error::Error>> {
    let token = config.require_token()?;
    let provider = OpenAiCompatProvider::new("huggingface", &config.relay.provider_url, token)?;
    let context = ContextStore::from_config(&config.context)?;

    Ok(Arc::new(ChatRelay::new(
        Arc::new(provider),
        Arc::new(context),
        RelaySettings::from_config(&config.relay),
    )))
}
