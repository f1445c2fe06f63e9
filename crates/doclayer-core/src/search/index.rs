//! In-memory search index over function records.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::scorer::overlap_score;
use super::tokenizer::{Tokenizer, TokenizerConfig};
use crate::errors::DocResult;
use crate::parser::{truncate_chars, FunctionRecord, SourceParser};

/// One searchable function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub file_path: PathBuf,
    pub function_name: String,
    pub line_number: usize,
    /// Full function source as parsed.
    pub snippet_text: String,
    /// Distinct tokens of the function name and body.
    #[serde(skip)]
    pub fingerprint: BTreeSet<String>,
}

/// A ranked query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryHit {
    pub file_path: PathBuf,
    pub function_name: String,
    pub line_number: usize,
    pub score: f32,
    /// Entry source, truncated to the index's snippet limit.
    pub snippet: String,
}

/// Outcome of [`SearchIndex::build_index`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBuildReport {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub entries: usize,
}

/// Function-level search index.
///
/// Rebuilt from scratch on every [`build_index`](Self::build_index) call;
/// entries are never mutated in place.
#[derive(Debug)]
pub struct SearchIndex {
    tokenizer: Tokenizer,
    entries: Vec<IndexEntry>,
    max_snippet_chars: Option<usize>,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(TokenizerConfig::default(), None)
    }
}

impl SearchIndex {
    /// Create an empty index.
    pub fn new(tokenizer_config: TokenizerConfig, max_snippet_chars: Option<usize>) -> Self {
        Self {
            tokenizer: Tokenizer::new(tokenizer_config),
            entries: Vec::new(),
            max_snippet_chars,
        }
    }

    /// Replace the entries with one per function found under `root`.
    ///
    /// Files the parser cannot read are skipped and counted in the report.
    pub fn build_index(
        &mut self,
        root: &Path,
        parser: &dyn SourceParser,
    ) -> DocResult<IndexBuildReport> {
        let scan = parser.scan(root)?;
        self.build_from_records(scan.records);

        let report = IndexBuildReport {
            files_scanned: scan.files_scanned,
            files_skipped: scan.skipped.len(),
            entries: self.entries.len(),
        };
        tracing::debug!(
            entries = report.entries,
            files = report.files_scanned,
            skipped = report.files_skipped,
            "Search index built"
        );
        Ok(report)
    }

    /// Replace the entries with one per record, in the given order.
    pub fn build_from_records(&mut self, records: impl IntoIterator<Item = FunctionRecord>) {
        self.entries = records
            .into_iter()
            .map(|record| self.entry_for(record))
            .collect();
    }

    fn entry_for(&self, record: FunctionRecord) -> IndexEntry {
        let mut fingerprint = self.tokenizer.token_set(&record.function_name);
        fingerprint.extend(self.tokenizer.tokenize(&record.body_text));

        IndexEntry {
            file_path: record.file_path,
            function_name: record.function_name,
            line_number: record.line_number,
            snippet_text: record.body_text,
            fingerprint,
        }
    }

    /// Rank entries against `text` and return the best `top_k`.
    ///
    /// Every entry is scored, so with `top_k` at or above [`len`](Self::len)
    /// all entries come back, zero scores included. Ties keep index order.
    /// Returns nothing for an empty index, `top_k == 0`, or a query without
    /// any meaningful token (empty text, only stop words).
    pub fn query(&self, text: &str, top_k: usize) -> Vec<QueryHit> {
        if top_k == 0 || self.entries.is_empty() {
            return Vec::new();
        }
        let query_tokens = self.tokenizer.token_set(text);
        if query_tokens.is_empty() {
            tracing::debug!("Query has no searchable tokens: {:?}", text);
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (idx, overlap_score(&query_tokens, &entry.fingerprint)))
            .collect();

        // Stable: equal scores stay in index order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(idx, score)| {
                let entry = &self.entries[idx];
                QueryHit {
                    file_path: entry.file_path.clone(),
                    function_name: entry.function_name.clone(),
                    line_number: entry.line_number,
                    score,
                    snippet: self.snippet(&entry.snippet_text),
                }
            })
            .collect()
    }

    fn snippet(&self, text: &str) -> String {
        match self.max_snippet_chars {
            Some(max) => truncate_chars(text, max).to_string(),
            None => text.to_string(),
        }
    }

    /// All entries, in build order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PythonParser;
    use std::fs;
    use tempfile::TempDir;

    fn record(name: &str, body: &str, line: usize) -> FunctionRecord {
        FunctionRecord {
            file_path: PathBuf::from("mod.py"),
            function_name: name.to_string(),
            line_number: line,
            parameter_names: Vec::new(),
            body_text: body.to_string(),
            indent: String::new(),
            header_end_line: line,
            end_line: line,
            has_docstring: false,
        }
    }

    fn f1_f2_index() -> SearchIndex {
        let mut index = SearchIndex::default();
        index.build_from_records([
            record("f1", "parses configuration files", 10),
            record("f2", "sends network requests", 40),
        ]);
        index
    }

    #[test]
    fn test_parse_config_ranks_f1_first() {
        let index = f1_f2_index();

        let top = index.query("parse config", 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].function_name, "f1");
        assert_eq!(top[0].line_number, 10);

        let all = index.query("parse config", 2);
        assert!(all[0].score > all[1].score);
        assert_eq!(all[1].function_name, "f2");
        assert_eq!(all[1].score, 0.0);
    }

    #[test]
    fn test_monotonic_relevance() {
        let mut index = SearchIndex::default();
        index.build_from_records([
            record("only_alpha", "alpha", 1),
            record("both", "alpha beta", 2),
        ]);

        let hits = index.query("alpha beta", 2);
        assert_eq!(hits[0].function_name, "both");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_ties_keep_index_order() {
        let mut index = SearchIndex::default();
        index.build_from_records([
            record("first", "socket", 1),
            record("second", "socket", 2),
            record("third", "socket", 3),
        ]);
        let names: Vec<_> = index
            .query("socket", 3)
            .into_iter()
            .map(|h| h.function_name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_query_is_deterministic() {
        let index = f1_f2_index();
        let first = index.query("network config", 4);
        for _ in 0..5 {
            assert_eq!(index.query("network config", 4), first);
        }
    }

    #[test]
    fn test_top_k_bounds() {
        let index = f1_f2_index();
        assert!(index.query("parse", 0).is_empty());
        assert_eq!(index.query("parse", 1).len(), 1);
        assert_eq!(index.query("parse", 10).len(), 2);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        assert!(SearchIndex::default().query("parse config", 4).is_empty());
    }

    #[test]
    fn test_tokenless_query_returns_nothing() {
        let index = f1_f2_index();
        assert!(index.query("", 4).is_empty());
        assert!(index.query("what is the", 4).is_empty());
    }

    #[test]
    fn test_function_name_is_searchable() {
        let mut index = SearchIndex::default();
        index.build_from_records([
            record("load_settings", "pass", 1),
            record("other", "pass", 2),
        ]);
        let hits = index.query("settings", 1);
        assert_eq!(hits[0].function_name, "load_settings");
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_snippet_truncation() {
        let mut index = SearchIndex::new(TokenizerConfig::default(), Some(5));
        index.build_from_records([record("f1", "parses configuration files", 10)]);
        let hits = index.query("parse", 1);
        assert_eq!(hits[0].snippet, "parse");
        assert_eq!(index.entries()[0].snippet_text, "parses configuration files");
    }

    #[test]
    fn test_build_replaces_entries() {
        let mut index = f1_f2_index();
        index.build_from_records([record("g", "other", 1)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.entries()[0].function_name, "g");
    }

    #[test]
    fn test_build_index_from_tree() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("cfg.py"),
            "def parse_config(path):\n    return open(path).read()\n",
        )
        .unwrap();
        fs::write(temp.path().join("net.py"), "def send(url):\n    pass\n").unwrap();

        let mut index = SearchIndex::default();
        let report = index
            .build_index(temp.path(), &PythonParser::default())
            .unwrap();

        assert_eq!(report.entries, 2);
        assert_eq!(report.files_scanned, 2);
        assert_eq!(index.query("parse config", 1)[0].function_name, "parse_config");
    }

    #[test]
    fn test_build_index_empty_tree() {
        let temp = TempDir::new().unwrap();
        let mut index = f1_f2_index();
        let report = index
            .build_index(temp.path(), &PythonParser::default())
            .unwrap();
        assert_eq!(report.entries, 0);
        assert!(index.is_empty());
        assert!(index.query("parse", 4).is_empty());
    }
}
