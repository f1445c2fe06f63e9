//! Error types for doclayer-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for doclayer-core operations.
pub type DocResult<T> = Result<T, DocError>;

/// Domain-specific errors for doclayer operations.
#[derive(Error, Debug)]
pub enum DocError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file could not be read or parsed.
    #[error("Config invalid: {0}")]
    InvalidConfig(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    // =========================================================================
    // Cache Errors
    // =========================================================================
    /// Cache storage could not be read or written.
    #[error("Cache I/O error at `{path}`: {message}")]
    CacheIo {
        /// Location of the cache store.
        path: String,
        /// Description of the I/O error.
        message: String,
    },

    /// Cache storage exists but is not a valid mapping.
    ///
    /// The cache is never reset automatically; delete the file to start over.
    #[error("Cache file `{path}` is corrupted: {message}. Delete it to reset the cache.")]
    CacheParse {
        /// Location of the cache store.
        path: String,
        /// Description of the parse error.
        message: String,
    },

    // =========================================================================
    // Source Errors
    // =========================================================================
    /// A source file could not be parsed.
    #[error("Failed to parse `{path}`: {message}")]
    SourceParse {
        /// The file that failed.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A path or file was not found.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Failed to rewrite a source file or write generated docs.
    #[error("Failed to write `{path}`: {message}")]
    WriteFailed {
        /// The file that could not be written.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    // =========================================================================
    // Generation Errors
    // =========================================================================
    /// The text generation backend failed.
    #[error("Generation via `{provider}` failed: {reason}")]
    Generation {
        /// The backend or model that failed.
        provider: String,
        /// Description of the failure.
        reason: String,
    },

    // =========================================================================
    // Git Errors
    // =========================================================================
    /// A git command failed.
    #[error("git {command} failed in `{repo}`: {message}")]
    Git {
        /// The git subcommand and arguments.
        command: String,
        /// Repository path.
        repo: PathBuf,
        /// stderr or spawn error.
        message: String,
    },

    /// Invalid argument provided to a command.
    #[error("{0}")]
    InvalidArgument(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
