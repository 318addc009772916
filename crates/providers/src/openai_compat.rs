//! OpenAI-compatible provider implementation.
//!
//! Works with the Hugging Face inference router and any other endpoint that
//! exposes `/chat/completions` in the OpenAI shape (vLLM, TGI, OpenRouter).
//!
//! Supports:
//! - Chat completions (non-streaming)
//! - Health checks via the model listing endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillrelay_core::error::ProviderError;
use skillrelay_core::message::{Message, Role};
use skillrelay_core::provider::*;
use tracing::{debug, warn};

/// Longest provider error body kept in a `ProviderError`.
const MAX_ERROR_BODY: usize = 512;

/// An OpenAI-compatible inference provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create a Hugging Face router provider (convenience constructor).
    pub fn huggingface(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("huggingface", "https://router.huggingface.co/v1", api_key)
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }
}

fn truncate(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[async_trait]
impl skillrelay_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API token or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = truncate(response.text().await.unwrap_or_default());
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::EmptyResponse("No choices in response".into()))?;

        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse("Choice has no text content".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message: Message {
                role: Role::Assistant,
                content,
            },
            usage,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use skillrelay_core::Provider;

    /// Serve `app` on an ephemeral local port and return its base URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn request(model: &str) -> ProviderRequest {
        ProviderRequest {
            model: model.into(),
            messages: vec![Message::system("CONTEXT"), Message::user("How do I register?")],
            temperature: 0.7,
            max_tokens: Some(500),
        }
    }

    #[test]
    fn huggingface_constructor() {
        let p = OpenAiCompatProvider::huggingface("hf_test").unwrap();
        assert_eq!(p.name(), "huggingface");
        assert_eq!(p.base_url(), "https://router.huggingface.co/v1");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let p = OpenAiCompatProvider::new("custom", "http://localhost:8080/v1/", "k").unwrap();
        assert_eq!(p.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn request_body_shape() {
        let body = OpenAiCompatProvider::build_body(&request("google/gemma-1.1-7b-it"));
        assert_eq!(body["model"], "google/gemma-1.1-7b-it");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "How do I register?");
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let long = "é".repeat(MAX_ERROR_BODY);
        let cut = truncate(long);
        assert!(cut.len() <= MAX_ERROR_BODY + '…'.len_utf8());
        assert!(cut.ends_with('…'));
    }

    #[tokio::test]
    async fn completes_against_openai_shape() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(
                    headers.get("authorization").unwrap().to_str().unwrap(),
                    "Bearer hf_test"
                );
                assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
                Json(serde_json::json!({
                    "model": body["model"],
                    "choices": [{"message": {"role": "assistant", "content": "Click Register."}}],
                    "usage": {"prompt_tokens": 40, "completion_tokens": 3, "total_tokens": 43}
                }))
            }),
        );
        let base = serve(app).await;

        let provider = OpenAiCompatProvider::new("test", base, "hf_test").unwrap();
        let response = provider.complete(request("zephyr")).await.unwrap();
        assert_eq!(response.message.content, "Click Register.");
        assert_eq!(response.model, "zephyr");
        assert_eq!(response.usage.unwrap().total_tokens, 43);
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                Json(serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": "  "}}]
                }))
            }),
        );
        let provider = OpenAiCompatProvider::new("test", serve(app).await, "k").unwrap();
        let err = provider.complete(request("m")).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn no_choices_is_an_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(serde_json::json!({ "choices": [] })) }),
        );
        let provider = OpenAiCompatProvider::new("test", serve(app).await, "k").unwrap();
        let err = provider.complete(request("m")).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn status_codes_map_to_errors() {
        let app = Router::new()
            .route(
                "/v1/chat/completions",
                post(|Json(body): Json<serde_json::Value>| async move {
                    match body["model"].as_str().unwrap_or_default() {
                        "limited" => (
                            StatusCode::TOO_MANY_REQUESTS,
                            [("retry-after", "12")],
                            "slow down",
                        )
                            .into_response(),
                        "denied" => (StatusCode::FORBIDDEN, "no").into_response(),
                        _ => (StatusCode::SERVICE_UNAVAILABLE, "Model is loading").into_response(),
                    }
                }),
            )
            .route("/v1/models", get(|| async { StatusCode::UNAUTHORIZED }));
        let provider = OpenAiCompatProvider::new("test", serve(app).await, "k").unwrap();

        assert_eq!(
            provider.complete(request("limited")).await.unwrap_err(),
            ProviderError::RateLimited {
                retry_after_secs: 12
            }
        );
        assert!(matches!(
            provider.complete(request("denied")).await.unwrap_err(),
            ProviderError::AuthenticationFailed(_)
        ));
        assert_eq!(
            provider.complete(request("loading")).await.unwrap_err(),
            ProviderError::ApiError {
                status_code: 503,
                message: "Model is loading".into()
            }
        );
        assert!(!provider.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = OpenAiCompatProvider::new("test", format!("http://{addr}/v1"), "k").unwrap();
        let err = provider.complete(request("m")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
