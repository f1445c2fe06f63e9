//! Unicode-aware tokenizer for code search.
//!
//! Turns function names, source bodies and questions into comparable tokens:
//! - Unicode word segmentation
//! - Identifier splitting (`snake_case`, `camelCase`, `HTTPServer`)
//! - Case folding (lowercasing)
//! - Stop word removal
//! - English stemming
//! - Minimum token length filtering

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Tokenizer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Apply English stemming to tokens.
    pub stemming: bool,
    /// Remove common stop words.
    pub remove_stopwords: bool,
    /// Minimum token length to include.
    pub min_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            stemming: true,
            remove_stopwords: true,
            min_token_length: 2,
        }
    }
}

/// Tokenizer shared by fingerprints and queries.
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<&'static str>,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Tokenizer {
    /// Create a new tokenizer with the given configuration.
    pub fn new(config: TokenizerConfig) -> Self {
        let stemmer = config
            .stemming
            .then(|| Stemmer::create(Algorithm::English));

        Self {
            config,
            stemmer,
            stopwords: Self::default_stopwords(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> TokenizerConfig {
        self.config
    }

    /// Tokenize text into processed tokens, in order of appearance.
    ///
    /// Compound identifiers yield their parts followed by the joined form:
    /// `parse_config` becomes `parse`, `config`, `parseconfig` before stemming.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for word in text.unicode_words() {
            let parts = split_identifier(word);
            if parts.len() > 1 {
                tokens.extend(parts.iter().filter_map(|p| self.process_token(p)));
                tokens.extend(self.process_token(&parts.concat()));
            } else {
                tokens.extend(self.process_token(word));
            }
        }
        tokens
    }

    /// Distinct tokens of `text`, ordered.
    pub fn token_set(&self, text: &str) -> BTreeSet<String> {
        self.tokenize(text).into_iter().collect()
    }

    fn process_token(&self, word: &str) -> Option<String> {
        let lower = word.to_lowercase();

        // Pure numbers carry no meaning for lookup
        if !lower.chars().any(|c| c.is_alphabetic()) {
            return None;
        }

        if lower.chars().count() < self.config.min_token_length {
            return None;
        }

        if self.config.remove_stopwords && self.stopwords.contains(lower.as_str()) {
            return None;
        }

        let token = match &self.stemmer {
            Some(stemmer) => stemmer.stem(&lower).into_owned(),
            None => lower,
        };

        // Some stems become too short
        if token.chars().count() < self.config.min_token_length {
            return None;
        }

        Some(token)
    }

    /// English stop words, minus words that carry meaning in code
    /// (`return`, `for`, `if`, `do`, ...).
    fn default_stopwords() -> HashSet<&'static str> {
        [
            "a", "an", "the", // articles
            "in", "on", "at", "to", "of", "with", "by", "from", "as", "into", "through", "during",
            "before", "after", "above", "below", "between", "under", "over", "out", "up", "down",
            "off", // prepositions
            "and", "or", "but", "nor", "so", "yet", // conjunctions
            "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my",
            "your", "his", "its", "our", "their", "this", "that", "these", "those", "which", "who",
            "whom", "whose", "what", "where", "when", "how", "why", // pronouns
            "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
            "does", "did", "doing", "will", "would", "could", "should", "may", "might", "must",
            "shall", "can", "need", // auxiliaries
            "not", "no", "yes", "all", "any", "both", "each", "few", "more", "most", "other",
            "some", "such", "than", "too", "very", "just", "also", "only", "own", "same", "then",
            "there", "here", "now", "always", "never", "ever", "about", "whether", "please",
            "explain", "tell",
        ]
        .into_iter()
        .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

/// Split an identifier on underscores and case boundaries.
///
/// `parse_config` -> `[parse, config]`, `loadHTTPConfig` -> `[load, HTTP, Config]`.
/// Words without boundaries come back as a single part.
fn split_identifier(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    for piece in word.split('_').filter(|p| !p.is_empty()) {
        let chars: Vec<char> = piece.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && c.is_uppercase() {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                let boundary = prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower);
                if boundary && !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            current.push(c);
        }
        if !current.is_empty() {
            parts.push(current);
        }
    }
    parts
}
