//! Provider trait — the abstraction over the inference backend.
//!
//! A Provider knows how to send a conversation for one named model and get a
//! complete assistant message back. It makes exactly one call per `complete`;
//! retrying and moving between models is the relay's job.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "meta-llama/Meta-Llama-3-8B-Instruct")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "huggingface").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    ///
    /// Implementations must return an error rather than an empty message, so
    /// that callers can treat every `Ok` as a usable answer.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            let last = request.messages.last().cloned().unwrap_or(Message::user(""));
            Ok(ProviderResponse {
                message: Message::assistant(last.content),
                usage: None,
                model: request.model,
            })
        }
    }

    #[tokio::test]
    async fn default_health_check_is_healthy() {
        let provider = EchoProvider;
        assert!(provider.health_check().await.unwrap());

        let response = provider
            .complete(ProviderRequest {
                model: "echo-1".into(),
                messages: vec![Message::user("ping")],
                temperature: 0.0,
                max_tokens: Some(5),
            })
            .await
            .unwrap();
        assert_eq!(response.message.content, "ping");
        assert_eq!(response.model, "echo-1");
    }
}
