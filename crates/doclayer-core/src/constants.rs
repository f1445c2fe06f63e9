//! Common constants used throughout doclayer-core.
//!
//! Paths, directory names, and generation knobs live here so the pipeline,
//! the writer, and the CLI agree on them.

// ============================================================================
// File and Directory Names
// ============================================================================

/// Default cache file, relative to the working directory.
pub const CACHE_FILENAME: &str = ".ai_doc_cache.json";

/// Directory (under the repository root) that receives per-module Markdown.
pub const DOCS_DIR_NAME: &str = "ai_docs";

/// The name of the global doclayer configuration directory (`~/.doclayer/`).
pub const DOCLAYER_HOME_DIR: &str = ".doclayer";

/// The name of the global configuration file.
pub const GLOBAL_CONFIG_FILENAME: &str = "config.yaml";

/// Source file extension handled by the parser.
pub const PYTHON_EXTENSION: &str = "py";

// ============================================================================
// Ignored Directories
// ============================================================================

/// Directories that should always be skipped during file traversal.
pub const ALWAYS_IGNORED_DIRS: &[&str] = &[
    ".git",
    DOCS_DIR_NAME,
    "target",
    "node_modules",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
];

/// Check if a directory name should always be ignored.
#[inline]
pub fn should_ignore_dir(name: &str) -> bool {
    ALWAYS_IGNORED_DIRS.contains(&name)
}

// ============================================================================
// Retrieval and Generation
// ============================================================================

/// Default number of snippets retrieved for `ask`.
pub const DEFAULT_TOP_K: usize = 4;

/// Maximum characters of function source kept per record.
pub const DEFAULT_MAX_CODE_CHARS: usize = 2_000;

/// Maximum characters of snippet text embedded in an `ask` prompt per hit.
pub const DEFAULT_MAX_SNIPPET_CHARS: usize = 1_200;

/// Token budget for `ask` answers.
pub const ASK_MAX_NEW_TOKENS: u32 = 180;

/// Sampling temperature for `ask` answers.
pub const ASK_TEMPERATURE: f32 = 0.1;

/// Token budget for generated docstrings.
pub const DOCSTRING_MAX_NEW_TOKENS: u32 = 70;

/// Default git refs compared by `--only-changed` and commit summaries.
pub const DEFAULT_DIFF_BASE: &str = "HEAD~1";
pub const DEFAULT_DIFF_TARGET: &str = "HEAD";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignored_dirs() {
        assert!(should_ignore_dir(".git"));
        assert!(should_ignore_dir("__pycache__"));
        assert!(should_ignore_dir(DOCS_DIR_NAME));
        assert!(!should_ignore_dir("src"));
    }
}
