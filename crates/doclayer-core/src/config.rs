//! Configuration types for doclayer.
//!
//! [`DocLayerConfig`] is loaded from `~/.doclayer/config.yaml` (or a path given
//! with `--config`) and falls back to defaults when no file exists.
//!
//! # Example YAML
//!
//! ```yaml
//! generation:
//!   provider: ollama
//!   modelId: tinyllama
//!   baseUrl: http://localhost:11434
//! index:
//!   topK: 4
//!   maxSnippetChars: 1200
//!   maxCodeChars: 2000
//! cache:
//!   path: .ai_doc_cache.json
//! docs:
//!   outputDir: ai_docs
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use doclayer_model::GenerationConfig;

use crate::constants::{
    CACHE_FILENAME, DEFAULT_MAX_CODE_CHARS, DEFAULT_MAX_SNIPPET_CHARS, DEFAULT_TOP_K,
    DOCLAYER_HOME_DIR, DOCS_DIR_NAME, GLOBAL_CONFIG_FILENAME,
};
use crate::errors::{DocError, DocResult};
use crate::search::TokenizerConfig;

// ============================================================================
// DocLayerConfig
// ============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocLayerConfig {
    /// Text generation backend.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Search index and retrieval settings.
    #[serde(default)]
    pub index: IndexConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Generated documentation settings.
    #[serde(default)]
    pub docs: DocsConfig,
}

impl DocLayerConfig {
    /// Load the configuration from the default location (`~/.doclayer/config.yaml`).
    ///
    /// If the file does not exist, returns defaults so doclayer works without setup.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::InvalidConfig`] if the file exists but cannot be parsed.
    pub fn load_default() -> DocResult<Self> {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load the configuration from a specific path.
    ///
    /// A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::InvalidConfig`] if the file cannot be read or parsed,
    /// and [`DocError::InvalidConfiguration`] if validation fails.
    pub fn from_path(path: &Path) -> DocResult<Self> {
        if !path.exists() {
            tracing::debug!("Config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DocError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            DocError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let warnings = config.validate()?;
        for warning in warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    /// Get the default configuration directory (`~/.doclayer`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DOCLAYER_HOME_DIR))
    }

    /// Get the default configuration file path (`~/.doclayer/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(GLOBAL_CONFIG_FILENAME))
    }

    /// Validate the configuration.
    ///
    /// Returns non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::InvalidConfiguration`] for values that cannot work.
    pub fn validate(&self) -> DocResult<Vec<String>> {
        let mut warnings = Vec::new();

        let problems = self.generation.problems();
        if !problems.is_empty() {
            return Err(DocError::InvalidConfiguration {
                message: problems.join("; "),
                hint: "Fix the `generation` section of your config".to_string(),
            });
        }

        if self.index.max_snippet_chars == Some(0) {
            return Err(DocError::InvalidConfiguration {
                message: "index.maxSnippetChars must be greater than 0".to_string(),
                hint: "Remove the key to disable snippet truncation".to_string(),
            });
        }

        if self.index.max_code_chars == 0 {
            return Err(DocError::InvalidConfiguration {
                message: "index.maxCodeChars must be greater than 0".to_string(),
                hint: format!("The default is {}", DEFAULT_MAX_CODE_CHARS),
            });
        }

        if self.index.top_k == 0 {
            warnings.push("index.topK is 0; `ask` prompts will carry no context".to_string());
        }

        if self.index.min_token_length == 0 {
            warnings.push("index.minTokenLength is 0; single characters will be indexed".to_string());
        }

        if self.docs.output_dir.trim().is_empty() {
            return Err(DocError::InvalidConfiguration {
                message: "docs.outputDir must not be empty".to_string(),
                hint: format!("The default is `{}`", DOCS_DIR_NAME),
            });
        }

        Ok(warnings)
    }
}

// ============================================================================
// IndexConfig
// ============================================================================

/// Search index settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    /// Default number of snippets used by `ask`.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Truncate snippets to this many characters (None = no truncation).
    #[serde(default = "default_max_snippet_chars")]
    pub max_snippet_chars: Option<usize>,

    /// Truncate parsed function source to this many characters.
    #[serde(default = "default_max_code_chars")]
    pub max_code_chars: usize,

    /// Apply English stemming to tokens.
    #[serde(default = "default_true")]
    pub stemming: bool,

    /// Remove common stop words.
    #[serde(default = "default_true")]
    pub remove_stopwords: bool,

    /// Minimum token length to include.
    #[serde(default = "default_min_token_length")]
    pub min_token_length: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_max_snippet_chars() -> Option<usize> {
    Some(DEFAULT_MAX_SNIPPET_CHARS)
}

fn default_max_code_chars() -> usize {
    DEFAULT_MAX_CODE_CHARS
}

fn default_true() -> bool {
    true
}

fn default_min_token_length() -> usize {
    2
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_snippet_chars: default_max_snippet_chars(),
            max_code_chars: default_max_code_chars(),
            stemming: true,
            remove_stopwords: true,
            min_token_length: default_min_token_length(),
        }
    }
}

impl IndexConfig {
    /// Tokenizer settings derived from this config.
    pub fn tokenizer_config(&self) -> TokenizerConfig {
        TokenizerConfig {
            stemming: self.stemming,
            remove_stopwords: self.remove_stopwords,
            min_token_length: self.min_token_length,
        }
    }
}

// ============================================================================
// CacheConfig / DocsConfig
// ============================================================================

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Cache file location. Relative paths resolve against the working directory.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(CACHE_FILENAME)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

/// Generated documentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocsConfig {
    /// Directory under the repository root receiving module Markdown.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    DOCS_DIR_NAME.to_string()
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = DocLayerConfig::from_path(&temp.path().join("nope.yaml")).unwrap();
        assert_eq!(config, DocLayerConfig::default());
        assert_eq!(config.index.top_k, DEFAULT_TOP_K);
        assert_eq!(config.cache.path, PathBuf::from(CACHE_FILENAME));
    }

    #[test]
    fn test_partial_yaml_merges_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            "generation:\n  modelId: qwen2.5-coder\nindex:\n  topK: 6\ncache:\n  path: /tmp/answers.json\n",
        )
        .unwrap();

        let config = DocLayerConfig::from_path(&path).unwrap();
        assert_eq!(config.generation.model_id, "qwen2.5-coder");
        assert_eq!(config.index.top_k, 6);
        assert_eq!(config.index.max_code_chars, DEFAULT_MAX_CODE_CHARS);
        assert_eq!(config.cache.path, PathBuf::from("/tmp/answers.json"));
        assert_eq!(config.docs.output_dir, DOCS_DIR_NAME);
    }

    #[test]
    fn test_unparseable_yaml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "index: [unclosed").unwrap();

        let err = DocLayerConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, DocError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_snippet_chars_rejected() {
        let mut config = DocLayerConfig::default();
        config.index.max_snippet_chars = Some(0);
        assert!(matches!(
            config.validate(),
            Err(DocError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_zero_top_k_warns() {
        let mut config = DocLayerConfig::default();
        config.index.top_k = 0;
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("topK"));
    }

    #[test]
    fn test_bad_generation_url_rejected() {
        let mut config = DocLayerConfig::default();
        config.generation.base_url = "localhost".to_string();
        assert!(config.validate().is_err());
    }
}
