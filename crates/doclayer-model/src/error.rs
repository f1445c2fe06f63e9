//! Error types for doclayer-model.
//!
//! Errors explain what went wrong talking to the generation backend and,
//! where possible, how to fix it.

use thiserror::Error;

/// Result type alias for doclayer-model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in doclayer-model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    // ========================================================================
    // Provider errors
    // ========================================================================
    /// Provider not available (feature disabled or unknown provider).
    #[error("Provider '{provider}' not available: {reason}")]
    ProviderNotAvailable { provider: String, reason: String },

    /// Backend could not be reached.
    #[error("{}", format_unreachable(.endpoint, .message))]
    Unreachable { endpoint: String, message: String },

    /// Backend answered with a non-success status.
    #[error("Generation backend returned HTTP {status} for model '{model_id}': {body}")]
    BadStatus {
        model_id: String,
        status: u16,
        body: String,
    },

    // ========================================================================
    // Generation errors
    // ========================================================================
    /// Generation failed for a reason reported by the backend.
    #[error("Generation failed for model '{model_id}': {message}")]
    GenerationFailed { model_id: String, message: String },

    /// Backend response could not be decoded.
    #[error("Invalid response from model '{model_id}': {message}")]
    InvalidResponse { model_id: String, message: String },

    /// Invalid generation configuration.
    #[error("Invalid generation configuration: {message}")]
    InvalidConfig { message: String },

    // ========================================================================
    // I/O errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_unreachable(endpoint: &str, message: &str) -> String {
    format!(
        "Generation backend not reachable at {endpoint}: {message}\n\n\
        doclayer talks to a local Ollama server by default. To fix:\n\
        1. Start it with `ollama serve`, OR\n\
        2. Point doclayer elsewhere with --ollama-url / DOCLAYER_OLLAMA_URL."
    )
}

// ============================================================================
// Error constructors
// ============================================================================

impl ModelError {
    /// Create a generation failed error.
    pub fn generation_failed(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// Create an unreachable-backend error.
    pub fn unreachable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreachable {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_message_has_hint() {
        let err = ModelError::unreachable("http://localhost:11434", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("http://localhost:11434"));
        assert!(msg.contains("connection refused"));
        assert!(msg.contains("ollama serve"));
    }

    #[test]
    fn test_bad_status_message() {
        let err = ModelError::BadStatus {
            model_id: "tinyllama".to_string(),
            status: 404,
            body: "model not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Generation backend returned HTTP 404 for model 'tinyllama': model not found"
        );
    }
}
