//! Multi-model fallback relay.
//!
//! Candidates are tried strictly one after another, each with its own
//! timeout. The first usable answer ends the request; a failure of any kind
//! moves on to the next candidate without retrying.

use skillrelay_config::RelayConfig;
use skillrelay_core::error::{AttemptFailure, ProviderError, RelayError};
use skillrelay_core::message::Message;
use skillrelay_core::provider::{Provider, ProviderRequest, ProviderResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::context::ContextStore;

/// Instruction placed ahead of the grounding text in the system turn.
pub const SYSTEM_PREAMBLE: &str = "You are a helpful assistant for SkillHub. \
Answer questions strictly based on the context below. \
If the answer is not in the context, say 'I don't know'.\n\nCONTEXT:\n";

/// Reply sent to the caller when every candidate failed.
pub const DEGRADED_REPLY: &str =
    "I apologize, but my AI servers are currently overloaded. Please try again in a minute.";

/// Fixed generation parameters and the candidate order.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub models: Vec<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub attempt_timeout: Duration,
}

impl RelaySettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            models: config.models.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

/// A successful answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    /// Generated text
    pub reply: String,
    /// The candidate that produced it
    pub model: String,
    /// Provider calls made, including the successful one
    pub attempts: usize,
}

/// Result of a single candidate attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Succeeded(ProviderResponse),
    Failed(ProviderError),
}

/// Relays a single question through the candidate models.
///
/// Holds only read-only state, so one instance is shared by all requests.
pub struct ChatRelay {
    provider: Arc<dyn Provider>,
    context: Arc<ContextStore>,
    settings: RelaySettings,
}

impl ChatRelay {
    pub fn new(
        provider: Arc<dyn Provider>,
        context: Arc<ContextStore>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            provider,
            context,
            settings,
        }
    }

    /// Candidate models in the order they are tried.
    pub fn models(&self) -> &[String] {
        &self.settings.models
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The system and user turns sent for `message`.
    pub fn build_conversation(&self, message: &str) -> Vec<Message> {
        let mut system = String::with_capacity(SYSTEM_PREAMBLE.len() + self.context.text().len());
        system.push_str(SYSTEM_PREAMBLE);
        system.push_str(self.context.text());

        vec![Message::system(system), Message::user(message)]
    }

    /// Answer `message`, falling back through the candidates in order.
    pub async fn handle(&self, message: &str) -> Result<ChatReply, RelayError> {
        if message.trim().is_empty() {
            return Err(RelayError::InvalidRequest);
        }

        let messages = self.build_conversation(message);
        let total = self.settings.models.len();
        let mut failures = Vec::new();

        for (i, model) in self.settings.models.iter().enumerate() {
            info!(model = %model, attempt = i + 1, total, "Trying model");

            match self.attempt(model, &messages).await {
                AttemptOutcome::Succeeded(response) => {
                    info!(model = %model, attempt = i + 1, "Model answered");
                    return Ok(ChatReply {
                        reply: response.message.content,
                        model: model.clone(),
                        attempts: i + 1,
                    });
                }
                AttemptOutcome::Failed(error) => {
                    warn!(model = %model, error = %error, "Model failed, trying next");
                    failures.push(AttemptFailure {
                        model: model.clone(),
                        error,
                    });
                }
            }
        }

        error!(attempts = failures.len(), "Every candidate model failed");
        Err(RelayError::AllModelsExhausted { failures })
    }

    /// One bounded call against one candidate.
    async fn attempt(&self, model: &str, messages: &[Message]) -> AttemptOutcome {
        let request = ProviderRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature: self.settings.temperature,
            max_tokens: Some(self.settings.max_tokens),
        };

        let timeout = self.settings.attempt_timeout;
        match tokio::time::timeout(timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) if response.message.content.trim().is_empty() => AttemptOutcome::Failed(
                ProviderError::EmptyResponse(format!("'{model}' returned empty text")),
            ),
            Ok(Ok(response)) => AttemptOutcome::Succeeded(response),
            Ok(Err(e)) => AttemptOutcome::Failed(e),
            Err(_) => AttemptOutcome::Failed(ProviderError::Timeout(format!(
                "'{model}' did not answer within {}s",
                timeout.as_secs_f32()
            ))),
        }
    }
}
