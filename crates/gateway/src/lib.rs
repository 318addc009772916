//! HTTP API gateway for SkillRelay.
//!
//! Endpoints:
//!
//! - `POST /chat`   — Ask the assistant a question
//! - `GET  /health` — Liveness and configured model count
//!
//! Built on Axum. Cross-origin requests are allowed because the chat widget
//! is served from a different origin than this service.

use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::{Router, extract::State, routing::get, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{Instrument, debug, info, info_span, warn};

use skillrelay_config::AppConfig;
use skillrelay_core::error::RelayError;
use skillrelay_relay::{ChatRelay, DEGRADED_REPLY};

/// Maximum accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub relay: Arc<ChatRelay>,
    pub started_at: DateTime<Utc>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(relay: Arc<ChatRelay>) -> SharedState {
        Arc::new(Self {
            relay,
            started_at: Utc::now(),
        })
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS policy: any origin when `allowed_origins` is empty, else that list.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start(
    config: &AppConfig,
    relay: Arc<ChatRelay>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let app = build_router(
        GatewayState::new(relay),
        cors_layer(&config.gateway.allowed_origins),
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown requested");
        })
        .await?;

    Ok(())
}

// --- Handlers ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// HTTP rendering of a relay failure.
struct ChatFailure(RelayError);

impl IntoResponse for ChatFailure {
    fn into_response(self) -> Response {
        match self.0 {
            RelayError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "No message provided".into(),
                }),
            )
                .into_response(),
            RelayError::AllModelsExhausted { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ChatResponse {
                    reply: DEGRADED_REPLY.into(),
                }),
            )
                .into_response(),
        }
    }
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatFailure> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("chat", %request_id);

    async move {
        let message = match payload {
            Ok(Json(ChatRequest {
                message: Some(message),
            })) => message,
            Ok(_) => return Err(ChatFailure(RelayError::InvalidRequest)),
            Err(rejection) => {
                debug!(error = %rejection, "Unreadable chat body");
                return Err(ChatFailure(RelayError::InvalidRequest));
            }
        };

        info!(message_len = message.len(), "Chat message received");
        debug!(question = %message, "User question");

        match state.relay.handle(&message).await {
            Ok(reply) => {
                info!(model = %reply.model, attempts = reply.attempts, "Chat answered");
                Ok(Json(ChatResponse { reply: reply.reply }))
            }
            Err(e) => Err(ChatFailure(e)),
        }
    }
    .instrument(span)
    .await
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub models: usize,
    pub uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        models: state.relay.models().len(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}
