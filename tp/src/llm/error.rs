//! LLM error types

use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key not found. Set the {env} environment variable.")]
    MissingApiKey { env: String },

    /// HTTP 429; retried on the planner's own schedule like any other failure
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_message() {
        let err = LlmError::MissingApiKey {
            env: "HF_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("HF_API_KEY"));
    }

    #[test]
    fn test_error_messages() {
        let err = LlmError::RateLimited("slow down".to_string());
        assert_eq!(err.to_string(), "Rate limited: slow down");

        let err = LlmError::ApiError {
            status: 503,
            message: "Service unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "API error 503: Service unavailable");
    }
}
