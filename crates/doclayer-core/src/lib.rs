//! # doclayer-core
//!
//! **doclayer** core library: documentation generation and grounded question
//! answering for Python codebases.
//!
//! This crate holds the domain logic consumed by the `doclayer` CLI. Text
//! generation is delegated to `doclayer-model`.
//!
//! ## Main Types
//!
//! - [`DocLayerEngine`] – entry point wiring config, cache and generator
//! - [`Assistant`] – cache-first question answering over a search index
//! - [`SearchIndex`] – function-level retrieval
//! - [`CacheStore`] – content-addressed response cache
//! - [`DocError`] – domain-specific error type
//!
//! ## Modules
//!
//! - [`ask`] – the ask pipeline
//! - [`cache`] – cache keys and storage backends
//! - [`config`] – YAML configuration
//! - [`diff`] – git change detection
//! - [`docgen`] – docstring, overview and commit summary generation
//! - [`parser`] – Python function extraction
//! - [`prompt`] – prompt templates
//! - [`search`] – tokenizer, scoring and index
//! - [`uml`] – class diagrams
//! - [`writer`] – docstring injection and Markdown pages
//!
//! ## Example
//!
//! ```ignore
//! use doclayer_core::{DocLayerConfig, DocLayerEngine};
//! use std::path::Path;
//!
//! let engine = DocLayerEngine::from_config(DocLayerConfig::load_default()?)?;
//! let assistant = engine.assistant(Path::new("."))?;
//! println!("{}", assistant.ask("Where are requests retried?", 4)?);
//! ```

// Modules
pub mod ask;
pub mod cache;
pub mod config;
pub mod constants;
pub mod diff;
pub mod docgen;
pub mod engine;
pub mod errors;
pub mod model_adapter;
pub mod parser;
pub mod prompt;
pub mod search;
pub mod uml;
pub mod writer;

// Re-exports for convenience
pub use ask::{AskOutcome, Assistant};
pub use cache::{cache_key, cache_params, CacheBackend, CacheParams, CacheStore, FileBackend, MemoryBackend};
pub use config::{CacheConfig, DocLayerConfig, DocsConfig, IndexConfig};
pub use docgen::{sanitize_docstring, DocGenerator};
pub use engine::{DocLayerEngine, FileDocReport, GenerateObserver, GenerateOptions, GenerateReport};
pub use errors::{DocError, DocResult};
pub use model_adapter::{GenerationConfig, GenerationParams, TextGenerator};
pub use parser::{FunctionRecord, PythonParser, ScanReport, SourceParser};
pub use prompt::PromptTemplate;
pub use search::{IndexBuildReport, IndexEntry, QueryHit, SearchIndex};
pub use uml::{UmlFormat, UmlModel, UmlOptions};
