//! Function-level retrieval for `ask` and `search`.
//!
//! ```text
//! FunctionRecord ──► Tokenizer ──► IndexEntry { fingerprint }
//!                                        │
//! query text ──► Tokenizer ──► token set ┴──► overlap_score ──► top_k hits
//! ```
//!
//! ## Key Components
//!
//! - [`tokenizer`]: Unicode segmentation, identifier splitting, stemming
//! - [`scorer`]: token-overlap relevance in `[0, 1]`
//! - [`index`]: entry collection, build and ranked query
//!
//! ## Usage
//!
//! ```
//! use doclayer_core::search::SearchIndex;
//!
//! let index = SearchIndex::default();
//! assert!(index.query("parse config", 4).is_empty());
//! ```

mod index;
mod scorer;
mod tokenizer;

pub use index::{IndexBuildReport, IndexEntry, QueryHit, SearchIndex};
pub use scorer::overlap_score;
pub use tokenizer::{Tokenizer, TokenizerConfig};
