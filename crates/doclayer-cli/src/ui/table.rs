//! Table rendering for CLI output using comfy-table.
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `doclayer search` | `render_hits_table()` |
//! | `doclayer ask` (sources) | `render_hits_table()` |
//! | `doclayer generate` | `render_generate_table()` |

use std::path::Path;

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, ContentArrangement, Table, Width};

use doclayer_core::{FileDocReport, QueryHit};

use super::color::terminal_width;
use super::format::{display_path, one_line, truncate_str};

/// Longest snippet preview shown in a hit row.
const SNIPPET_PREVIEW_CHARS: usize = 40;

/// Render ranked hits, best first.
///
/// # Example Output
///
/// ```text
/// #  SCORE  LOCATION          FUNCTION       SNIPPET
/// 1   1.00  pkg/config.py:3   parse_config   def parse_config(path): ...
/// 2   0.50  pkg/config.py:9   load_config    def load_config(): ...
/// ```
pub fn render_hits_table(hits: &[QueryHit], root: &Path) -> String {
    if hits.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(terminal_width());

    table.set_header(vec![
        Cell::new("#").set_alignment(CellAlignment::Right),
        Cell::new("SCORE").set_alignment(CellAlignment::Right),
        Cell::new("LOCATION"),
        Cell::new("FUNCTION"),
        Cell::new("SNIPPET"),
    ]);

    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(2)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
    ]);

    for (i, hit) in hits.iter().enumerate() {
        let location = format!("{}:{}", display_path(&hit.file_path, root), hit.line_number);
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", hit.score)).set_alignment(CellAlignment::Right),
            Cell::new(location),
            Cell::new(&hit.function_name),
            Cell::new(truncate_str(&one_line(&hit.snippet), SNIPPET_PREVIEW_CHARS)),
        ]);
    }

    table.to_string()
}

/// Render one row per processed file of a `generate` run.
///
/// # Example Output
///
/// ```text
/// FILE            FUNCS  MISSING  WRITTEN  PAGE
/// pkg/config.py       3        2        2  ai_docs/pkg_config.py.md
/// ```
pub fn render_generate_table(files: &[FileDocReport], root: &Path) -> String {
    if files.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);

    table.set_header(vec![
        Cell::new("FILE"),
        Cell::new("FUNCS").set_alignment(CellAlignment::Right),
        Cell::new("MISSING").set_alignment(CellAlignment::Right),
        Cell::new("WRITTEN").set_alignment(CellAlignment::Right),
        Cell::new("PAGE"),
    ]);

    for file in files {
        let page = file
            .markdown
            .as_deref()
            .map(|p| display_path(p, root))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(display_path(&file.path, root)),
            Cell::new(file.functions).set_alignment(CellAlignment::Right),
            Cell::new(file.undocumented).set_alignment(CellAlignment::Right),
            Cell::new(file.docstrings_inserted).set_alignment(CellAlignment::Right),
            Cell::new(page),
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn hit(name: &str, score: f32) -> QueryHit {
        QueryHit {
            file_path: PathBuf::from("/repo/pkg/config.py"),
            function_name: name.to_string(),
            line_number: 3,
            score,
            snippet: format!("def {}(path):\n    return path", name),
        }
    }

    #[test]
    fn test_empty_hits_render_nothing() {
        assert!(render_hits_table(&[], Path::new("/repo")).is_empty());
    }

    #[test]
    fn test_hits_table_rows() {
        let output = render_hits_table(&[hit("parse_config", 1.0), hit("load", 0.5)], Path::new("/repo"));
        assert!(output.contains("SCORE"));
        assert!(output.contains("pkg/config.py:3"));
        assert!(output.contains("parse_config"));
        assert!(output.contains("1.00"));
        assert!(output.contains("0.50"));
        let first = output.find("parse_config").unwrap();
        let second = output.find("load").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_generate_table() {
        let files = vec![
            FileDocReport {
                path: PathBuf::from("/repo/pkg/config.py"),
                functions: 3,
                undocumented: 2,
                docstrings_inserted: 2,
                markdown: Some(PathBuf::from("/repo/ai_docs/pkg_config.py.md")),
            },
            FileDocReport {
                path: PathBuf::from("/repo/empty.py"),
                functions: 0,
                undocumented: 0,
                docstrings_inserted: 0,
                markdown: None,
            },
        ];
        let output = render_generate_table(&files, Path::new("/repo"));
        assert!(output.contains("WRITTEN"));
        assert!(output.contains("ai_docs/pkg_config.py.md"));
        assert!(output.contains("empty.py"));
        assert!(output.contains(" -"));
    }

    #[test]
    fn test_empty_generate_table() {
        assert!(render_generate_table(&[], Path::new("/repo")).is_empty());
    }
}
