//! Writes generated documentation back to disk.
//!
//! - [`inject_docstrings`] rewrites a Python file in place
//! - [`write_module_markdown`] emits one Markdown page per module

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{DocError, DocResult};
use crate::parser::{FunctionRecord, PythonParser};

const BODY_INDENT: &str = "    ";

/// Insert docstrings after the signatures of the functions defined at the
/// given 1-based lines.
///
/// Insertions run bottom-up so earlier line numbers stay valid. Functions
/// that already open with a docstring, single-line functions, and lines
/// without a `def` are left untouched. Returns how many docstrings were
/// inserted.
pub fn inject_docstrings(file: &Path, docs: &BTreeMap<usize, String>) -> DocResult<usize> {
    let source = fs::read_to_string(file).map_err(|e| DocError::SourceParse {
        path: file.to_path_buf(),
        message: e.to_string(),
    })?;

    let records: HashMap<usize, FunctionRecord> = PythonParser::new(usize::MAX)
        .parse_source(file, &source)
        .into_iter()
        .map(|r| (r.line_number, r))
        .collect();

    let mut lines: Vec<String> = source.lines().map(str::to_string).collect();
    let mut inserted = 0;

    for (line, doc) in docs.iter().rev() {
        let Some(record) = records.get(line) else {
            tracing::warn!("No function at {}:{}, skipping docstring", file.display(), line);
            continue;
        };
        if record.has_docstring {
            tracing::debug!(function = %record.function_name, "Already documented");
            continue;
        }
        if record.end_line == record.header_end_line {
            tracing::debug!(function = %record.function_name, "Single-line body, skipping");
            continue;
        }

        let indent = format!("{}{}", record.indent, BODY_INDENT);
        let block: Vec<String> = docstring_lines(doc)
            .into_iter()
            .map(|l| format!("{indent}{l}"))
            .collect();
        let at = record.header_end_line;
        lines.splice(at..at, block);
        inserted += 1;
    }

    if inserted > 0 {
        let mut output = lines.join("\n");
        if source.ends_with('\n') {
            output.push('\n');
        }
        fs::write(file, output).map_err(|e| DocError::WriteFailed {
            path: file.to_path_buf(),
            message: e.to_string(),
        })?;
    }

    tracing::debug!(file = %file.display(), inserted, "Docstrings injected");
    Ok(inserted)
}

/// Docstring split into left-trimmed lines with `"""` at both ends.
fn docstring_lines(doc: &str) -> Vec<String> {
    let mut lines: Vec<String> = doc
        .trim()
        .lines()
        .map(|l| l.trim_start().to_string())
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }

    if !lines[0].starts_with("\"\"\"") {
        lines[0] = format!("\"\"\"{}", lines[0]);
    }
    let last = lines.len() - 1;
    let closed = lines[last].trim_end().ends_with("\"\"\"") && (last > 0 || lines[0].len() >= 6);
    if !closed {
        lines[last] = format!("{}\"\"\"", lines[last].trim_end());
    }
    lines
}

/// Markdown file name for a module: path separators become `_`.
pub fn markdown_file_name(relative: &Path) -> String {
    let flat = relative.to_string_lossy().replace(['/', '\\'], "_");
    format!("{flat}.md")
}

/// Module path recorded in the title of an existing page, if any.
fn page_owner(page: &Path) -> Option<String> {
    let text = fs::read_to_string(page).ok()?;
    let title = text.lines().next()?;
    let owner = title.strip_prefix("# Documentation for `")?.strip_suffix('`')?;
    Some(owner.to_string())
}

/// Write the Markdown page for `file` into `docs_root`.
///
/// Distinct paths such as `a/b_c.py` and `a_b/c.py` flatten to the same page
/// name; the later write wins and a warning names both modules.
///
/// `file` must live under `repo`; the page is named after its relative path.
pub fn write_module_markdown(
    docs_root: &Path,
    repo: &Path,
    file: &Path,
    overview: &str,
    functions: &[FunctionRecord],
) -> DocResult<PathBuf> {
    let relative = file.strip_prefix(repo).map_err(|_| {
        DocError::InvalidArgument(format!(
            "{} is not inside {}",
            file.display(),
            repo.display()
        ))
    })?;

    fs::create_dir_all(docs_root).map_err(|e| DocError::WriteFailed {
        path: docs_root.to_path_buf(),
        message: e.to_string(),
    })?;
    let out_path = docs_root.join(markdown_file_name(relative));
    let module = relative.display().to_string();
    if let Some(owner) = page_owner(&out_path).filter(|owner| *owner != module) {
        tracing::warn!(
            "{} overwrites the page written for {} (both map to {})",
            module,
            owner,
            out_path.display()
        );
    }

    let mut page = vec![
        format!("# Documentation for `{module}`"),
        String::new(),
        "## Module Overview".to_string(),
        String::new(),
        overview.trim().to_string(),
        String::new(),
        "## Functions".to_string(),
        String::new(),
    ];
    for func in functions {
        page.push(format!("### `{}`", func.signature()));
        page.push(String::new());
        page.push("*(Docstring will appear in code file; see source.)*".to_string());
        page.push(String::new());
    }

    fs::write(&out_path, page.join("\n")).map_err(|e| DocError::WriteFailed {
        path: out_path.clone(),
        message: e.to_string(),
    })?;
    Ok(out_path)
}
