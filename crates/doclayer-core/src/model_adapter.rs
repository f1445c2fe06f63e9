//! Bridge between doclayer-core and doclayer-model.
//!
//! Re-exports the generation interface and maps [`doclayer_model::ModelError`]
//! into [`DocError`] so the pipeline deals with a single error type.

pub use doclayer_model::{
    create_generator, GenerationConfig, GenerationParams, GenerationProviderKind, ModelError,
    TextGenerator, DEFAULT_MODEL_ID, DEFAULT_OLLAMA_URL,
};

use crate::errors::{DocError, DocResult};

// ============================================================================
// Error Conversion
// ============================================================================

/// Convert a doclayer-model error to a doclayer-core error.
pub fn from_model_error(err: ModelError) -> DocError {
    match err {
        ModelError::ProviderNotAvailable { provider, reason } => {
            DocError::Generation { provider, reason }
        }

        ModelError::Unreachable { ref endpoint, .. } => DocError::Generation {
            provider: endpoint.clone(),
            reason: err.to_string(),
        },

        ModelError::BadStatus {
            model_id,
            status,
            body,
        } => DocError::Generation {
            provider: model_id,
            reason: format!("HTTP {status}: {body}"),
        },

        ModelError::GenerationFailed { model_id, message }
        | ModelError::InvalidResponse { model_id, message } => DocError::Generation {
            provider: model_id,
            reason: message,
        },

        ModelError::InvalidConfig { message } => DocError::InvalidConfiguration {
            message,
            hint: "Check the `generation` section of your doclayer config".to_string(),
        },

        ModelError::Json(e) => DocError::Json(e),
    }
}

/// Run `generator` and convert its error.
pub fn generate(
    generator: &dyn TextGenerator,
    prompt: &str,
    params: &GenerationParams,
) -> DocResult<String> {
    tracing::debug!(
        model = generator.model_id(),
        prompt_chars = prompt.len(),
        "Calling text generator"
    );
    generator.generate(prompt, params).map_err(from_model_error)
}

/// Build the configured generator.
pub fn create_text_generator(config: &GenerationConfig) -> DocResult<Box<dyn TextGenerator>> {
    create_generator(config).map_err(from_model_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_status_keeps_model_and_status() {
        let err = from_model_error(ModelError::BadStatus {
            model_id: "tinyllama".to_string(),
            status: 404,
            body: "model not found".to_string(),
        });
        match err {
            DocError::Generation { provider, reason } => {
                assert_eq!(provider, "tinyllama");
                assert!(reason.contains("404"));
                assert!(reason.contains("model not found"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unreachable_keeps_hint() {
        let err = from_model_error(ModelError::unreachable("http://localhost:11434", "refused"));
        assert!(err.to_string().contains("ollama serve"));
    }

    #[test]
    fn test_invalid_config_maps_to_configuration_error() {
        let err = from_model_error(ModelError::InvalidConfig {
            message: "empty model id".to_string(),
        });
        assert!(matches!(err, DocError::InvalidConfiguration { .. }));
    }
}
