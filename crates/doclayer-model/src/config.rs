//! Configuration types for doclayer-model.
//!
//! [`GenerationConfig`] selects and configures a backend; [`GenerationParams`]
//! carries the per-call sampling knobs.

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_MODEL_ID, DEFAULT_OLLAMA_URL};

/// Default maximum number of generated tokens.
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 80;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// System preamble sent with every generation request.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an expert Python documentation assistant. Answer concisely and clearly.";

// ============================================================================
// GenerationProviderKind
// ============================================================================

/// Generation provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProviderKind {
    /// Local Ollama server.
    #[default]
    Ollama,
}

impl std::fmt::Display for GenerationProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for GenerationProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" | "local" => Ok(Self::Ollama),
            _ => Err(format!("Unknown provider: '{}'. Use 'ollama'.", s)),
        }
    }
}

// ============================================================================
// GenerationConfig
// ============================================================================

/// Backend configuration for text generation.
///
/// # Example YAML
///
/// ```yaml
/// generation:
///   provider: ollama
///   modelId: tinyllama
///   baseUrl: http://localhost:11434
///   timeoutSecs: 120
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Which backend to use.
    #[serde(default)]
    pub provider: GenerationProviderKind,

    /// Model identifier understood by the backend.
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Base URL of the backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// System preamble prepended to every request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Default sampling parameters; per-call parameters override them.
    #[serde(default)]
    pub defaults: GenerationParams,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_base_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProviderKind::default(),
            model_id: default_model_id(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
            defaults: GenerationParams::default(),
        }
    }
}

impl GenerationConfig {
    /// Override the model ID.
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Validate the configuration.
    ///
    /// Returns human-readable problems; an empty vector means the config is usable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.model_id.trim().is_empty() {
            problems.push("generation.modelId must not be empty".to_string());
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            problems.push(format!(
                "generation.baseUrl must start with http:// or https:// (got '{}')",
                self.base_url
            ));
        }
        if self.timeout_secs == 0 {
            problems.push("generation.timeoutSecs must be greater than 0".to_string());
        }
        problems
    }
}

// ============================================================================
// GenerationParams
// ============================================================================

/// Sampling parameters for a single generation call.
///
/// Unset fields fall back to the backend defaults via [`GenerationParams::merged_with`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    /// Maximum number of tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,

    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Whether to sample (false = greedy decoding).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_sample: Option<bool>,
}

impl GenerationParams {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = Some(max_new_tokens);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Enable or disable sampling.
    pub fn with_do_sample(mut self, do_sample: bool) -> Self {
        self.do_sample = Some(do_sample);
        self
    }

    /// Fill unset fields from `base`; fields set on `self` win.
    pub fn merged_with(&self, base: &GenerationParams) -> GenerationParams {
        GenerationParams {
            max_new_tokens: self.max_new_tokens.or(base.max_new_tokens),
            temperature: self.temperature.or(base.temperature),
            do_sample: self.do_sample.or(base.do_sample),
        }
    }

    /// Resolve every field, using the crate defaults for anything still unset.
    pub fn resolved(&self) -> ResolvedParams {
        ResolvedParams {
            max_new_tokens: self.max_new_tokens.unwrap_or(DEFAULT_MAX_NEW_TOKENS),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            do_sample: self.do_sample.unwrap_or(false),
        }
    }
}

/// Fully-resolved sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub do_sample: bool,
}
