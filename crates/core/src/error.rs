//! Error types for the SkillRelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Per-attempt provider failures stay inside the relay; only `RelayError`
//! reaches the HTTP layer.

use thiserror::Error;

/// Why a single inference attempt failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider returned no usable text: {0}")]
    EmptyResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// One candidate model that was tried and failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{model}: {error}")]
pub struct AttemptFailure {
    pub model: String,
    pub error: ProviderError,
}

/// Outcomes of a chat request that are not a reply.
///
/// The two variants map to distinct HTTP statuses and must never be merged.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    #[error("No message provided")]
    InvalidRequest,

    #[error("All {} candidate models failed", failures.len())]
    AllModelsExhausted { failures: Vec<AttemptFailure> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 503,
            message: "Model is overloaded".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("Model is overloaded"));
    }

    #[test]
    fn attempt_failure_names_the_model() {
        let failure = AttemptFailure {
            model: "Qwen/Qwen2.5-72B-Instruct".into(),
            error: ProviderError::Timeout("30s elapsed".into()),
        };
        let text = failure.to_string();
        assert!(text.starts_with("Qwen/Qwen2.5-72B-Instruct:"));
        assert!(text.contains("30s elapsed"));
    }

    #[test]
    fn relay_errors_display() {
        let failure = AttemptFailure {
            model: "m".into(),
            error: ProviderError::Network("refused".into()),
        };
        let err = RelayError::AllModelsExhausted {
            failures: vec![failure.clone(), failure],
        };
        assert_eq!(err.to_string(), "All 2 candidate models failed");
        assert_eq!(RelayError::InvalidRequest.to_string(), "No message provided");
    }
}
