//! Python source scanning.
//!
//! Walks a source tree, reads every `.py` file and extracts one
//! [`FunctionRecord`] per `def` / `async def`, methods and nested functions
//! included. Extraction is line based: the signature is followed by bracket
//! depth until its closing `:`, and the body by indentation.
//!
//! Traversal order is sorted by path so repeated scans of the same tree yield
//! the same record order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use ignore::WalkBuilder;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

use crate::constants::{should_ignore_dir, DEFAULT_MAX_CODE_CHARS, PYTHON_EXTENSION};
use crate::errors::{DocError, DocResult};

pub(crate) static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([ \t]*)(?:async[ \t]+)?def[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*\(")
        .expect("def pattern is valid")
});

// ============================================================================
// Types
// ============================================================================

/// A function definition found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRecord {
    /// File the function was found in, as reached from the scan root.
    pub file_path: PathBuf,
    /// Function or method name.
    pub function_name: String,
    /// 1-based line of the `def` keyword.
    pub line_number: usize,
    /// Positional parameter names, in declaration order (`self` included).
    pub parameter_names: Vec<String>,
    /// Source text from the `def` line to the end of the body, truncated.
    pub body_text: String,
    /// Leading whitespace of the `def` line.
    pub indent: String,
    /// 1-based line holding the signature's closing `:`.
    pub header_end_line: usize,
    /// 1-based last line of the body.
    pub end_line: usize,
    /// Whether the body opens with a string literal.
    pub has_docstring: bool,
}

impl FunctionRecord {
    /// `name(a, b)` rendering used in generated docs.
    pub fn signature(&self) -> String {
        format!("{}({})", self.function_name, self.parameter_names.join(", "))
    }
}

/// A file that could not be parsed during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of scanning a source tree.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// All records, in file order then line order.
    pub records: Vec<FunctionRecord>,
    /// Number of candidate files visited.
    pub files_scanned: usize,
    /// Files that failed to parse.
    pub skipped: Vec<SkippedFile>,
}

/// Produces function records from source files.
pub trait SourceParser: Send + Sync {
    /// Scan every matching file under `root`, skipping unparseable ones.
    fn scan(&self, root: &Path) -> DocResult<ScanReport>;

    /// Parse a single file.
    fn parse_file(&self, path: &Path) -> DocResult<Vec<FunctionRecord>>;
}

// ============================================================================
// PythonParser
// ============================================================================

/// Line-based Python function extractor.
#[derive(Debug, Clone)]
pub struct PythonParser {
    max_code_chars: usize,
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CODE_CHARS)
    }
}

impl PythonParser {
    /// Parser keeping at most `max_code_chars` characters of each body.
    pub fn new(max_code_chars: usize) -> Self {
        Self { max_code_chars }
    }

    /// Extract records from already-loaded source text.
    pub fn parse_source(&self, path: &Path, source: &str) -> Vec<FunctionRecord> {
        let lines: Vec<&str> = source.lines().collect();
        let in_string = string_continuations(&lines);
        let mut records = Vec::new();

        for (start, line) in lines.iter().enumerate() {
            if in_string[start] {
                continue;
            }
            let Some(caps) = DEF_RE.captures(line) else {
                continue;
            };
            let indent = caps.get(1).map_or("", |m| m.as_str());
            let name = caps.get(2).map_or("", |m| m.as_str());
            let open = caps.get(0).map_or(0, |m| m.end() - 1);

            let Some((header_end, params)) = scan_signature(&lines, start, open) else {
                tracing::debug!(file = %path.display(), line = start + 1, "Unterminated signature");
                continue;
            };
            let end = body_end(&lines, &in_string, header_end, indent.len());
            let body = lines[start..=end].join("\n");

            records.push(FunctionRecord {
                file_path: path.to_path_buf(),
                function_name: name.to_string(),
                line_number: start + 1,
                parameter_names: parameter_names(&params),
                body_text: truncate_chars(&body, self.max_code_chars).to_string(),
                indent: indent.to_string(),
                header_end_line: header_end + 1,
                end_line: end + 1,
                has_docstring: opens_with_string(&lines, header_end, end),
            });
        }

        records
    }
}

impl SourceParser for PythonParser {
    fn scan(&self, root: &Path) -> DocResult<ScanReport> {
        let files = find_source_files(root, PYTHON_EXTENSION)?;
        let files_scanned = files.len();

        let parsed: Vec<(PathBuf, DocResult<Vec<FunctionRecord>>)> = files
            .into_par_iter()
            .map(|path| {
                let result = self.parse_file(&path);
                (path, result)
            })
            .collect();

        let mut report = ScanReport {
            files_scanned,
            ..Default::default()
        };
        for (path, result) in parsed {
            match result {
                Ok(records) => report.records.extend(records),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            files = files_scanned,
            functions = report.records.len(),
            skipped = report.skipped.len(),
            "Scanned {}",
            root.display()
        );
        Ok(report)
    }

    fn parse_file(&self, path: &Path) -> DocResult<Vec<FunctionRecord>> {
        let bytes = fs::read(path).map_err(|e| DocError::SourceParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let source = String::from_utf8(bytes).map_err(|e| DocError::SourceParse {
            path: path.to_path_buf(),
            message: format!("not valid UTF-8: {e}"),
        })?;
        Ok(self.parse_source(path, &source))
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// List files with `extension` under `root`, sorted by path.
///
/// Respects `.gitignore` inside git repositories, skips hidden entries and the
/// directories in [`ALWAYS_IGNORED_DIRS`](crate::constants::ALWAYS_IGNORED_DIRS).
/// A `root` that is itself a matching file is returned as-is.
pub fn find_source_files(root: &Path, extension: &str) -> DocResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(DocError::PathNotFound(root.display().to_string()));
    }
    if root.is_file() {
        return Ok(has_extension(root, extension)
            .then(|| root.to_path_buf())
            .into_iter()
            .collect());
    }

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .follow_links(false)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && should_ignore_dir(&entry.file_name().to_string_lossy()))
        })
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error walking {}: {}", root.display(), e);
                continue;
            }
        };
        let is_file = entry.file_type().is_some_and(|t| t.is_file());
        if is_file && has_extension(entry.path(), extension) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

/// Longest prefix of `text` with at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ============================================================================
// Line scanning
// ============================================================================

/// Follow a signature from the `(` at byte `open` of line `start`.
///
/// Returns the 0-based line holding the closing `:` and the raw text between
/// the outer parentheses.
pub(crate) fn scan_signature(lines: &[&str], start: usize, open: usize) -> Option<(usize, String)> {
    let mut depth = 0usize;
    let mut closed = false;
    let mut params = String::new();

    for (j, line) in lines.iter().enumerate().skip(start) {
        let text = if j == start { &line[open..] } else { line };
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for c in text.chars() {
            let collecting = !closed && depth > 0;
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                if collecting {
                    params.push(c);
                }
                continue;
            }
            match c {
                '#' => break,
                '\'' | '"' => quote = Some(c),
                '(' | '[' | '{' => {
                    depth += 1;
                    if depth == 1 && !closed {
                        continue;
                    }
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && !closed {
                        closed = true;
                        continue;
                    }
                }
                ':' if closed && depth == 0 => return Some((j, params)),
                _ => {}
            }
            if !closed && depth > 0 {
                params.push(c);
            }
        }

        if !closed && depth > 0 {
            params.push(' ');
        }
    }
    None
}

/// Positional parameter names; stops at `*`, `*args` or `**kwargs`.
fn parameter_names(params: &str) -> Vec<String> {
    let mut names = Vec::new();
    for raw in split_top_level(params) {
        let param = raw.trim();
        if param.is_empty() || param == "/" {
            continue;
        }
        if param.starts_with('*') {
            break;
        }
        let name = param.split([':', '=']).next().unwrap_or_default().trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    names
}

pub(crate) fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut last = 0;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[last..i]);
                last = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[last..]);
    parts
}

pub(crate) fn leading_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// For each line, whether it starts inside a triple-quoted string.
///
/// Such lines are string content: they never hold a `def` or `class` and
/// their indentation says nothing about block structure.
pub(crate) fn string_continuations(lines: &[&str]) -> Vec<bool> {
    let mut open: Option<&'static [u8]> = None;
    let mut result = Vec::with_capacity(lines.len());

    for line in lines {
        result.push(open.is_some());
        let bytes = line.as_bytes();
        // Single- or double-quoted string on this line only.
        let mut quote: Option<u8> = None;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            if let Some(delim) = open {
                if b == b'\\' {
                    i += 2;
                } else if bytes[i..].starts_with(delim) {
                    open = None;
                    i += 3;
                } else {
                    i += 1;
                }
                continue;
            }
            if let Some(q) = quote {
                if b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == q {
                    quote = None;
                }
                i += 1;
                continue;
            }
            match b {
                b'#' => break,
                b'"' | b'\'' => {
                    let delim: &'static [u8] = if b == b'"' { b"\"\"\"" } else { b"'''" };
                    if bytes[i..].starts_with(delim) {
                        open = Some(delim);
                        i += 3;
                    } else {
                        quote = Some(b);
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }
    }
    result
}

/// Last 0-based line of a body whose header ends at `header_end`.
///
/// Blank lines and dedented comments never end a body on their own; trailing
/// ones are not included. Lines inside a multi-line string (`in_string`, from
/// [`string_continuations`]) always belong to the body.
pub(crate) fn body_end(
    lines: &[&str],
    in_string: &[bool],
    header_end: usize,
    def_indent: usize,
) -> usize {
    let mut end = header_end;
    for (j, line) in lines.iter().enumerate().skip(header_end + 1) {
        if in_string.get(j).copied().unwrap_or(false) {
            end = j;
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if leading_width(line) <= def_indent {
            if trimmed.starts_with('#') {
                continue;
            }
            break;
        }
        end = j;
    }
    end
}

fn opens_with_string(lines: &[&str], header_end: usize, end: usize) -> bool {
    lines[header_end + 1..=end]
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .is_some_and(|first| {
            let unprefixed = first.trim_start_matches(['r', 'R', 'u', 'U', 'b', 'B']);
            unprefixed.starts_with("\"\"\"")
                || unprefixed.starts_with("'''")
                || unprefixed.starts_with('"')
                || unprefixed.starts_with('\'')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"import os


def load(path, mode="r"):
    with open(path, mode) as f:
        return f.read()


class Client(Base):
    """HTTP client."""

    def send(self, url: str, *, timeout: float = 1.0) -> dict:
        """Send a request."""
        return {}

    async def fetch(
        self,
        urls: list[str],
        retries: int = 3,
    ) -> None:
        pass


def one_liner(x): return x
"#;

    fn parse(source: &str) -> Vec<FunctionRecord> {
        PythonParser::default().parse_source(Path::new("mod.py"), source)
    }

    #[test]
    fn test_finds_functions_and_methods_in_order() {
        let names: Vec<_> = parse(SAMPLE).into_iter().map(|r| r.function_name).collect();
        assert_eq!(names, vec!["load", "send", "fetch", "one_liner"]);
    }

    #[test]
    fn test_line_numbers_and_extent() {
        let records = parse(SAMPLE);
        let load = &records[0];
        assert_eq!(load.line_number, 4);
        assert_eq!(load.header_end_line, 4);
        assert_eq!(load.end_line, 6);
        assert!(load.body_text.starts_with("def load(path, mode=\"r\"):"));
        assert!(load.body_text.ends_with("return f.read()"));
        assert_eq!(load.indent, "");
    }

    #[test]
    fn test_multiline_signature() {
        let fetch = &parse(SAMPLE)[2];
        assert_eq!(fetch.line_number, 16);
        assert_eq!(fetch.header_end_line, 20);
        assert_eq!(fetch.end_line, 21);
        assert_eq!(fetch.parameter_names, vec!["self", "urls", "retries"]);
        assert_eq!(fetch.indent, "    ");
    }

    #[test]
    fn test_parameters_stop_at_star() {
        let send = &parse(SAMPLE)[1];
        assert_eq!(send.parameter_names, vec!["self", "url"]);
        assert_eq!(send.signature(), "send(self, url)");
    }

    #[test]
    fn test_docstring_detection() {
        let records = parse(SAMPLE);
        assert!(!records[0].has_docstring);
        assert!(records[1].has_docstring);
        assert!(!records[3].has_docstring);
    }

    #[test]
    fn test_one_liner_body() {
        let one = &parse(SAMPLE)[3];
        assert_eq!(one.header_end_line, one.end_line);
        assert_eq!(one.body_text, "def one_liner(x): return x");
    }

    #[test]
    fn test_body_truncated() {
        let records = PythonParser::new(10).parse_source(Path::new("m.py"), SAMPLE);
        assert_eq!(records[0].body_text, "def load(p");
    }

    #[test]
    fn test_dict_default_does_not_end_signature() {
        let records = parse("def f(a={'k': 1}, b=(1, 2)):\n    return a\n");
        assert_eq!(records[0].parameter_names, vec!["a", "b"]);
        assert_eq!(records[0].end_line, 2);
    }

    #[test]
    fn test_scan_is_sorted_and_skips_ignored() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(root.join("__pycache__")).unwrap();
        fs::write(root.join("b.py"), "def b():\n    pass\n").unwrap();
        fs::write(root.join("a.py"), "def a():\n    pass\n").unwrap();
        fs::write(root.join("pkg/c.py"), "def c():\n    pass\n").unwrap();
        fs::write(root.join("__pycache__/x.py"), "def x():\n    pass\n").unwrap();
        fs::write(root.join("notes.txt"), "def txt():\n").unwrap();

        let report = PythonParser::default().scan(root).unwrap();
        let names: Vec<_> = report.records.iter().map(|r| r.function_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(report.files_scanned, 3);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_scan_skips_non_utf8() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.py"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(temp.path().join("good.py"), "def ok():\n    pass\n").unwrap();

        let report = PythonParser::default().scan(temp.path()).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("bad.py"));
    }

    #[test]
    fn test_scan_missing_root() {
        let err = PythonParser::default().scan(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, DocError::PathNotFound(_)));
    }

    const TEMPLATE_SOURCE: &str = r#"def render():
    template = """
def fake(x):
    pass
"""
    return template


def after():
    return 1
"#;

    #[test]
    fn test_def_inside_triple_quoted_string_is_not_a_function() {
        let records = parse(TEMPLATE_SOURCE);
        let names: Vec<_> = records.iter().map(|r| r.function_name.as_str()).collect();
        assert_eq!(names, vec!["render", "after"]);

        let render = &records[0];
        assert_eq!(render.line_number, 1);
        assert_eq!(render.end_line, 6);
        assert!(render.body_text.contains("def fake(x):"));
        assert!(render.body_text.ends_with("    return template"));
        assert!(!render.has_docstring);
    }

    #[test]
    fn test_string_continuations() {
        let lines = [
            "x = '''a",
            "def hidden():",
            "'''",
            r#"y = "'''"  # not a delimiter"#,
            r"s = '\''",
            "z = 1",
        ];
        assert_eq!(
            string_continuations(&lines),
            vec![false, true, true, false, false, false]
        );
    }

    #[test]
    fn test_one_line_triple_quoted_string_does_not_open() {
        let lines = [r#"    """Docstring.""""#, "def f():"];
        assert_eq!(string_continuations(&lines), vec![false, false]);
    }

    #[test]
    fn test_escaped_quote_in_default() {
        let source = r#"def f(x="\""):
    return x

def g(y='\'', z=2):
    return y
"#;
        let records = parse(source);
        let names: Vec<_> = records.iter().map(|r| r.function_name.as_str()).collect();
        assert_eq!(names, vec!["f", "g"]);
        assert_eq!(records[0].parameter_names, vec!["x"]);
        assert_eq!(records[1].parameter_names, vec!["y", "z"]);
    }

    #[test]
    fn test_split_top_level_with_escaped_quote() {
        assert_eq!(split_top_level(r#"a="\",", b"#), vec![r#"a="\",""#, " b"]);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
