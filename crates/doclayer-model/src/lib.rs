//! # doclayer-model
//!
//! Text generation layer for doclayer.
//!
//! This crate owns every interaction with a language model. It provides:
//!
//! - **[`TextGenerator`]**: the narrow capability the rest of doclayer depends on
//! - **Config**: [`GenerationConfig`] (backend selection) and [`GenerationParams`] (per call)
//! - **Backends**: [`OllamaGenerator`] talking to a local Ollama server
//!
//! ## Design Principles
//!
//! 1. **Production-only**: No mock implementations. Test doubles live in consuming crates.
//! 2. **Local-first**: The default backend is a model served on localhost.
//! 3. **Blocking**: `generate` blocks the caller; timeouts are the backend's job.
//! 4. **No retries**: Failures are reported once and never retried here.
//!
//! ## Features
//!
//! - `ollama` (default): HTTP backend for an Ollama server
//!
//! ## Usage
//!
//! ```ignore
//! use doclayer_model::{create_generator, GenerationConfig, GenerationParams};
//!
//! let generator = create_generator(&GenerationConfig::default())?;
//! let text = generator.generate("Explain RAII", &GenerationParams::new().with_max_new_tokens(64))?;
//! ```

pub mod config;
pub mod error;

#[cfg(feature = "ollama")]
mod ollama;

pub use config::{
    GenerationConfig, GenerationParams, GenerationProviderKind, ResolvedParams,
    DEFAULT_MAX_NEW_TOKENS, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
};
pub use error::{ModelError, ModelResult};

#[cfg(feature = "ollama")]
pub use ollama::OllamaGenerator;

/// Default model served by the local backend.
pub const DEFAULT_MODEL_ID: &str = "tinyllama";

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

// ============================================================================
// TextGenerator Trait
// ============================================================================

/// Trait for text generation backends.
///
/// Any model host (local server, remote API, test stub) implements this and
/// nothing else is required by callers.
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Generate a completion for `prompt`.
    ///
    /// Unset fields of `params` fall back to the backend's configured defaults.
    fn generate(&self, prompt: &str, params: &GenerationParams) -> ModelResult<String>;

    /// Get the model ID.
    fn model_id(&self) -> &str;
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> ModelResult<String> {
        (**self).generate(prompt, params)
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Create a text generator from configuration.
///
/// # Errors
///
/// Returns [`ModelError::InvalidConfig`] for unusable configuration and
/// [`ModelError::ProviderNotAvailable`] when the backend was compiled out.
pub fn create_generator(config: &GenerationConfig) -> ModelResult<Box<dyn TextGenerator>> {
    let problems = config.problems();
    if !problems.is_empty() {
        return Err(ModelError::InvalidConfig {
            message: problems.join("; "),
        });
    }

    match config.provider {
        #[cfg(feature = "ollama")]
        GenerationProviderKind::Ollama => {
            let generator = OllamaGenerator::new(config)?;
            Ok(Box::new(generator))
        }
        #[cfg(not(feature = "ollama"))]
        GenerationProviderKind::Ollama => Err(ModelError::ProviderNotAvailable {
            provider: "ollama".to_string(),
            reason: "Built without the 'ollama' feature.".to_string(),
        }),
    }
}
