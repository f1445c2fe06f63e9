//! Content-addressed response cache.
//!
//! Model responses are memoized under a SHA-256 digest of the prompt text plus
//! a canonical (key-sorted) JSON rendering of any extra parameters. The whole
//! store is a single JSON object persisted through a [`CacheBackend`]:
//!
//! ```text
//! .ai_doc_cache.json
//! {
//!   "3f1c...e9": "The function parses configuration files ...",
//!   "a07b...12": "\"\"\"Send a request and return the decoded body.\"\"\""
//! }
//! ```
//!
//! ## Semantics
//!
//! - Every [`CacheStore::load`] re-reads the backend; there is no in-memory layer.
//! - Every [`CacheStore::save`] is read-modify-write of the full mapping with no
//!   locking. Two processes saving at once can lose an update (last writer wins).
//! - A corrupted store is a hard [`DocError::CacheParse`] error, never reset.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::{DocError, DocResult};

/// Extra request parameters folded into a cache key.
///
/// A `BTreeMap` so that construction order never affects the digest.
pub type CacheParams = BTreeMap<String, Value>;

/// The persisted mapping: digest -> response text.
pub type CacheMap = BTreeMap<String, String>;

// ============================================================================
// Key derivation
// ============================================================================

/// Build [`CacheParams`] from key/value pairs.
///
/// ```
/// use doclayer_core::cache::cache_params;
///
/// let params = cache_params([("top_k", 4)]);
/// assert_eq!(params["top_k"], 4);
/// ```
pub fn cache_params<K, V, I>(pairs: I) -> CacheParams
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Compute the cache key for a prompt and optional extra parameters.
///
/// The digest covers `prompt` followed by the canonical JSON of `extra`;
/// absent and empty `extra` both contribute nothing. Output is 64 lowercase
/// hex characters and is stable across runs and platforms.
pub fn cache_key(prompt: &str, extra: Option<&CacheParams>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    if let Some(extra) = extra.filter(|e| !e.is_empty()) {
        hasher.update(canonical_json(extra).as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Compact JSON with object keys sorted at every depth.
fn canonical_json(extra: &CacheParams) -> String {
    let object = extra
        .iter()
        .map(|(k, v)| (k.clone(), canonicalize(v)))
        .collect::<serde_json::Map<_, _>>();
    Value::Object(object).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

// ============================================================================
// Backends
// ============================================================================

/// Raw storage for the serialized cache mapping.
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Read the serialized mapping, or `None` if nothing has been stored yet.
    fn read(&self) -> DocResult<Option<String>>;

    /// Replace the serialized mapping.
    fn write(&self, contents: &str) -> DocResult<()>;

    /// Delete the stored mapping. Returns whether anything was removed.
    fn remove(&self) -> DocResult<bool>;

    /// Human-readable location for messages.
    fn location(&self) -> String;
}

/// Single JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Back the cache with the file at `path` (created on first save).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, err: std::io::Error) -> DocError {
        DocError::CacheIo {
            path: self.location(),
            message: err.to_string(),
        }
    }
}

impl CacheBackend for FileBackend {
    fn read(&self) -> DocResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, contents: &str) -> DocResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, contents).map_err(|e| self.io_error(e))
    }

    fn remove(&self) -> DocResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process storage, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    contents: Mutex<Option<String>>,
}

impl MemoryBackend {
    /// Empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory store pre-loaded with raw serialized contents.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.contents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self) -> DocResult<Option<String>> {
        Ok(self.slot().clone())
    }

    fn write(&self, contents: &str) -> DocResult<()> {
        *self.slot() = Some(contents.to_string());
        Ok(())
    }

    fn remove(&self) -> DocResult<bool> {
        Ok(self.slot().take().is_some())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

// ============================================================================
// CacheStore
// ============================================================================

/// Handle to the response cache.
///
/// Construct once per process and pass by reference to whatever needs it.
#[derive(Debug)]
pub struct CacheStore {
    backend: Box<dyn CacheBackend>,
}

impl CacheStore {
    /// Cache persisted in the JSON file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_backend(FileBackend::new(path))
    }

    /// Cache kept in memory only.
    pub fn in_memory() -> Self {
        Self::with_backend(MemoryBackend::new())
    }

    /// Cache over an arbitrary backend.
    pub fn with_backend(backend: impl CacheBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Where the cache lives, for display.
    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Look up a cached response.
    ///
    /// Returns `Ok(None)` if the store does not exist yet or has no entry for
    /// the key.
    ///
    /// # Errors
    ///
    /// [`DocError::CacheParse`] if the stored mapping is malformed.
    pub fn load(&self, prompt: &str, extra: Option<&CacheParams>) -> DocResult<Option<String>> {
        let key = cache_key(prompt, extra);
        let hit = self
            .read_map()?
            .and_then(|mut map| map.remove(&key));
        tracing::debug!(key = %&key[..12], hit = hit.is_some(), "Cache lookup");
        Ok(hit)
    }

    /// Store a response, overwriting any previous entry for the same key.
    ///
    /// # Errors
    ///
    /// [`DocError::CacheParse`] if the existing mapping is malformed; it is
    /// left untouched in that case.
    pub fn save(&self, prompt: &str, response: &str, extra: Option<&CacheParams>) -> DocResult<()> {
        let key = cache_key(prompt, extra);
        let mut map = self.read_map()?.unwrap_or_default();
        map.insert(key, response.to_string());
        let serialized = serde_json::to_string_pretty(&map)?;
        self.backend.write(&serialized)?;
        tracing::debug!(entries = map.len(), location = %self.location(), "Cache saved");
        Ok(())
    }

    /// Every stored entry.
    pub fn entries(&self) -> DocResult<CacheMap> {
        Ok(self.read_map()?.unwrap_or_default())
    }

    /// Number of stored entries.
    pub fn len(&self) -> DocResult<usize> {
        Ok(self.entries()?.len())
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> DocResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Delete the whole store. Returns whether anything was removed.
    pub fn clear(&self) -> DocResult<bool> {
        self.backend.remove()
    }

    fn read_map(&self) -> DocResult<Option<CacheMap>> {
        let Some(raw) = self.backend.read()? else {
            return Ok(None);
        };
        serde_json::from_str::<CacheMap>(&raw)
            .map(Some)
            .map_err(|e| DocError::CacheParse {
                path: self.location(),
                message: e.to_string(),
            })
    }
}
