//! Class diagrams for a Python source tree.
//!
//! Collects module-level classes (methods and base classes) and functions,
//! then renders them as:
//! - DOT (Graphviz), one rounded cluster per file, optionally piped to PNG
//! - Mermaid `classDiagram` for embedding in Markdown

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::constants::PYTHON_EXTENSION;
use crate::errors::{DocError, DocResult};
use crate::parser::{
    body_end, find_source_files, leading_width, scan_signature, split_top_level,
    string_continuations, PythonParser,
};

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*(\()?")
        .expect("class pattern is valid")
});

static DOTTED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("dotted name pattern is valid")
});

const CLUSTER_COLOR: &str = "#8888FF";

// ============================================================================
// Model
// ============================================================================

/// A module-level class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub file: PathBuf,
    pub methods: Vec<String>,
    /// Base class names as written, dotted paths kept (`models.Base`).
    pub bases: Vec<String>,
}

/// Classes and functions of a source tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UmlModel {
    /// One entry per class name; a later definition replaces an earlier one
    /// in place.
    pub classes: Vec<ClassInfo>,
    /// Module-level function names per file.
    pub functions: BTreeMap<PathBuf, Vec<String>>,
}

impl UmlModel {
    fn add_class(&mut self, class: ClassInfo) {
        match self.classes.iter_mut().find(|c| c.name == class.name) {
            Some(existing) => *existing = class,
            None => self.classes.push(class),
        }
    }

    /// Inheritance edges `(base, derived)` between classes of this model.
    ///
    /// A dotted base matches on its last segment.
    pub fn inheritance(&self) -> Vec<(&str, &str)> {
        let known: HashSet<&str> = self.classes.iter().map(|c| c.name.as_str()).collect();
        let mut edges = Vec::new();
        for class in &self.classes {
            for base in &class.bases {
                let short = base.rsplit('.').next().unwrap_or(base);
                if let Some(target) = known.get(short) {
                    edges.push((*target, class.name.as_str()));
                }
            }
        }
        edges
    }

    /// Classes grouped by file, files in first-seen order.
    fn classes_by_file(&self) -> Vec<(&Path, Vec<&ClassInfo>)> {
        let mut groups: Vec<(&Path, Vec<&ClassInfo>)> = Vec::new();
        for class in &self.classes {
            match groups.iter_mut().find(|(file, _)| *file == class.file.as_path()) {
                Some((_, members)) => members.push(class),
                None => groups.push((class.file.as_path(), vec![class])),
            }
        }
        groups
    }
}

// ============================================================================
// Collection
// ============================================================================

/// Collect classes and functions from every Python file under `root`.
///
/// Files that are not valid UTF-8 are skipped with a warning.
pub fn collect_classes(root: &Path) -> DocResult<UmlModel> {
    let mut model = UmlModel::default();
    for file in find_source_files(root, PYTHON_EXTENSION)? {
        let source = match fs::read_to_string(&file) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", file.display(), e);
                continue;
            }
        };
        let (classes, functions) = extract_module(&file, &source);
        for class in classes {
            model.add_class(class);
        }
        model.functions.insert(file, functions);
    }
    tracing::debug!(classes = model.classes.len(), "UML model collected");
    Ok(model)
}

/// Module-level classes and functions of one file.
fn extract_module(file: &Path, source: &str) -> (Vec<ClassInfo>, Vec<String>) {
    let lines: Vec<&str> = source.lines().collect();
    let records = PythonParser::default().parse_source(file, source);

    let functions = records
        .iter()
        .filter(|r| r.indent.is_empty())
        .map(|r| r.function_name.clone())
        .collect();

    let in_string = string_continuations(&lines);
    let mut classes = Vec::new();
    for (start, line) in lines.iter().enumerate() {
        if in_string[start] {
            continue;
        }
        let Some(caps) = CLASS_RE.captures(line) else {
            continue;
        };
        let name = caps.get(1).map_or("", |m| m.as_str()).to_string();

        let (header_end, bases) = match caps.get(2) {
            Some(open) => match scan_signature(&lines, start, open.start()) {
                Some((end, raw)) => (end, base_names(&raw)),
                None => continue,
            },
            None => (start, Vec::new()),
        };
        let end = body_end(&lines, &in_string, header_end, 0);

        let body_indent = lines[header_end + 1..=end]
            .iter()
            .find(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
            .map(|l| leading_width(l));

        let methods = records
            .iter()
            .filter(|r| r.line_number > header_end + 1 && r.line_number <= end + 1)
            .filter(|r| Some(r.indent.len()) == body_indent)
            .map(|r| r.function_name.clone())
            .collect();

        classes.push(ClassInfo {
            name,
            file: file.to_path_buf(),
            methods,
            bases,
        });
    }

    (classes, functions)
}

/// Plain or dotted base names; keyword arguments and subscripts are dropped.
fn base_names(raw: &str) -> Vec<String> {
    split_top_level(raw)
        .into_iter()
        .map(str::trim)
        .filter(|b| DOTTED_NAME_RE.is_match(b))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Rendering
// ============================================================================

/// Diagram output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UmlFormat {
    #[default]
    Dot,
    Mermaid,
}

impl std::fmt::Display for UmlFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dot => write!(f, "dot"),
            Self::Mermaid => write!(f, "mermaid"),
        }
    }
}

impl std::str::FromStr for UmlFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Ok(Self::Dot),
            "mermaid" | "md" => Ok(Self::Mermaid),
            other => Err(format!("Unknown diagram format: {}", other)),
        }
    }
}

/// Rendering options.
#[derive(Debug, Clone, Default)]
pub struct UmlOptions {
    /// Graph name (default `UML`).
    pub title: Option<String>,
    /// Also draw a box of module-level functions per file.
    pub include_functions: bool,
}

impl UmlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_functions(mut self, include: bool) -> Self {
        self.include_functions = include;
        self
    }
}

/// Render in the requested format.
pub fn render(model: &UmlModel, format: UmlFormat, opts: &UmlOptions) -> String {
    match format {
        UmlFormat::Dot => render_dot(model, opts),
        UmlFormat::Mermaid => render_mermaid(model, opts),
    }
}

/// Graphviz source: one cluster per file, a table-shaped box per class and
/// `inherits` edges from base to derived class.
pub fn render_dot(model: &UmlModel, opts: &UmlOptions) -> String {
    let mut lines = Vec::new();

    let title = opts.title.as_deref().unwrap_or("UML");
    lines.push(format!("digraph \"{}\" {{", escape_dot_string(title)));
    lines.push("  rankdir=TB;".to_string());
    lines.push("  node [shape=plaintext];".to_string());

    let mut clusters: Vec<(&Path, Vec<&ClassInfo>, &[String])> = model
        .classes_by_file()
        .into_iter()
        .map(|(file, classes)| (file, classes, &[][..]))
        .collect();
    if opts.include_functions {
        for (file, functions) in &model.functions {
            if functions.is_empty() {
                continue;
            }
            match clusters.iter_mut().find(|(f, _, _)| *f == file.as_path()) {
                Some(cluster) => cluster.2 = functions.as_slice(),
                None => clusters.push((file.as_path(), Vec::new(), functions.as_slice())),
            }
        }
    }

    for (i, (file, classes, functions)) in clusters.iter().enumerate() {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        lines.push(String::new());
        lines.push(format!("  subgraph \"cluster_{i}\" {{"));
        lines.push(format!("    label=<<b>{}</b>>;", escape_html(&file_name)));
        lines.push("    style=rounded;".to_string());
        lines.push(format!("    color=\"{CLUSTER_COLOR}\";"));
        for class in classes {
            let rows: Vec<String> = class.methods.iter().map(|m| format!("{m}()")).collect();
            lines.push(format!(
                "    {} [label=<{}>];",
                escape_dot_id(&class.name),
                html_table(&class.name, &rows)
            ));
        }
        if !functions.is_empty() {
            let rows: Vec<String> = functions.iter().map(|f| format!("{f}()")).collect();
            lines.push(format!(
                "    {} [label=<{}>];",
                escape_dot_id(&format!("{}::functions", file.display())),
                html_table("functions", &rows)
            ));
        }
        lines.push("  }".to_string());
    }

    let edges = model.inheritance();
    if !edges.is_empty() {
        lines.push(String::new());
    }
    for (base, derived) in edges {
        lines.push(format!(
            "  {} -> {} [label=\"inherits\", arrowhead=onormal];",
            escape_dot_id(base),
            escape_dot_id(derived)
        ));
    }

    lines.push("}".to_string());
    lines.join("\n")
}

/// Mermaid `classDiagram`, fenced for Markdown.
pub fn render_mermaid(model: &UmlModel, opts: &UmlOptions) -> String {
    let mut lines = Vec::new();
    lines.push("```mermaid".to_string());
    lines.push("classDiagram".to_string());

    for class in &model.classes {
        if class.methods.is_empty() {
            lines.push(format!("  class {}", class.name));
            continue;
        }
        lines.push(format!("  class {} {{", class.name));
        for method in &class.methods {
            lines.push(format!("    +{method}()"));
        }
        lines.push("  }".to_string());
    }

    if opts.include_functions {
        for (file, functions) in &model.functions {
            if functions.is_empty() {
                continue;
            }
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            lines.push(format!("  class {}_module {{", mermaid_id(&stem)));
            lines.push("    <<module>>".to_string());
            for function in functions {
                lines.push(format!("    +{function}()"));
            }
            lines.push("  }".to_string());
        }
    }

    for (base, derived) in model.inheritance() {
        lines.push(format!("  {base} <|-- {derived} : inherits"));
    }

    lines.push("```".to_string());
    lines.join("\n")
}

/// Render DOT source to a PNG with the `dot` binary.
pub fn write_png(dot_source: &str, out: &Path) -> DocResult<()> {
    let write_failed = |message: String| DocError::WriteFailed {
        path: out.to_path_buf(),
        message,
    };

    let mut child = Command::new("dot")
        .arg("-Tpng")
        .arg("-o")
        .arg(out)
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| write_failed(format!("could not run Graphviz `dot`: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(dot_source.as_bytes())
            .map_err(|e| write_failed(e.to_string()))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| write_failed(e.to_string()))?;
    if !output.status.success() {
        return Err(write_failed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn html_table(header: &str, rows: &[String]) -> String {
    let mut table = String::from(r#"<TABLE BORDER="1" CELLBORDER="0" CELLSPACING="0">"#);
    table.push_str(&format!("<TR><TD><B>{}</B></TD></TR><HR/>", escape_html(header)));
    for row in rows {
        table.push_str(&format!(r#"<TR><TD ALIGN="LEFT">{}</TD></TR>"#, escape_html(row)));
    }
    table.push_str("</TABLE>");
    table
}

fn escape_dot_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn escape_dot_id(s: &str) -> String {
    format!("\"{}\"", escape_dot_string(s))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn mermaid_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MODELS: &str = "\
import abc


class Base(abc.ABC):
    def save(self):
        pass

    async def load(self):
        def helper():
            pass
        return helper


class User(Base, metaclass=Meta):
    name = 'x'

    def greet(
        self,
    ):
        return self.name


def make_user():
    return User()
";

    const VIEWS: &str = "\
from models import User


class Admin(models.User, Generic[T]):
    def ban(self):
        pass


def index():
    pass
";

    fn sample_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("models.py"), MODELS).unwrap();
        fs::write(temp.path().join("views.py"), VIEWS).unwrap();
        temp
    }

    #[test]
    fn test_collects_classes_methods_and_bases() {
        let temp = sample_tree();
        let model = collect_classes(temp.path()).unwrap();

        let names: Vec<_> = model.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Base", "User", "Admin"]);

        assert_eq!(model.classes[0].methods, vec!["save", "load"]);
        assert_eq!(model.classes[0].bases, vec!["abc.ABC"]);
        assert_eq!(model.classes[1].methods, vec!["greet"]);
        assert_eq!(model.classes[1].bases, vec!["Base"]);
        assert_eq!(model.classes[2].bases, vec!["models.User"]);

        assert_eq!(model.functions[&temp.path().join("models.py")], vec!["make_user"]);
        assert_eq!(model.functions[&temp.path().join("views.py")], vec!["index"]);
    }

    #[test]
    fn test_inheritance_between_known_classes_only() {
        let temp = sample_tree();
        let model = collect_classes(temp.path()).unwrap();
        assert_eq!(model.inheritance(), vec![("Base", "User"), ("User", "Admin")]);
    }

    #[test]
    fn test_duplicate_class_replaced_in_place() {
        let mut model = UmlModel::default();
        for (name, file) in [("A", "one.py"), ("B", "one.py"), ("A", "two.py")] {
            model.add_class(ClassInfo {
                name: name.to_string(),
                file: PathBuf::from(file),
                methods: Vec::new(),
                bases: Vec::new(),
            });
        }
        assert_eq!(model.classes.len(), 2);
        assert_eq!(model.classes[0].file, PathBuf::from("two.py"));
    }

    #[test]
    fn test_render_dot() {
        let temp = sample_tree();
        let model = collect_classes(temp.path()).unwrap();
        let dot = render_dot(&model, &UmlOptions::default());

        assert!(dot.starts_with("digraph \"UML\" {\n  rankdir=TB;"));
        assert!(dot.contains("subgraph \"cluster_0\" {\n    label=<<b>models.py</b>>;"));
        assert!(dot.contains("color=\"#8888FF\";"));
        assert!(dot.contains(
            "\"Base\" [label=<<TABLE BORDER=\"1\" CELLBORDER=\"0\" CELLSPACING=\"0\"><TR><TD><B>Base</B></TD></TR><HR/>\
             <TR><TD ALIGN=\"LEFT\">save()</TD></TR><TR><TD ALIGN=\"LEFT\">load()</TD></TR></TABLE>>];"
        ));
        assert!(dot.contains("\"Base\" -> \"User\" [label=\"inherits\", arrowhead=onormal];"));
        assert!(!dot.contains("make_user"));
        assert!(dot.ends_with('}'));
    }

    #[test]
    fn test_render_dot_with_functions() {
        let temp = sample_tree();
        let model = collect_classes(temp.path()).unwrap();
        let dot = render_dot(&model, &UmlOptions::new().with_functions(true));
        assert!(dot.contains("make_user()"));
        assert!(dot.contains("index()"));
    }

    #[test]
    fn test_render_mermaid() {
        let temp = sample_tree();
        let model = collect_classes(temp.path()).unwrap();
        let mermaid = render_mermaid(&model, &UmlOptions::default());

        assert!(mermaid.starts_with("```mermaid\nclassDiagram\n"));
        assert!(mermaid.contains("  class User {\n    +greet()\n  }"));
        assert!(mermaid.contains("  Base <|-- User : inherits"));
        assert!(mermaid.ends_with("```"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let temp = sample_tree();
        let a = render_dot(&collect_classes(temp.path()).unwrap(), &UmlOptions::default());
        let b = render_dot(&collect_classes(temp.path()).unwrap(), &UmlOptions::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_tree() {
        let temp = TempDir::new().unwrap();
        let model = collect_classes(temp.path()).unwrap();
        assert_eq!(render_dot(&model, &UmlOptions::default()), "digraph \"UML\" {\n  rankdir=TB;\n  node [shape=plaintext];\n}");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("DOT".parse::<UmlFormat>().unwrap(), UmlFormat::Dot);
        assert_eq!("mermaid".parse::<UmlFormat>().unwrap(), UmlFormat::Mermaid);
        assert!("svg".parse::<UmlFormat>().is_err());
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(html_table("A<B>", &[]), r#"<TABLE BORDER="1" CELLBORDER="0" CELLSPACING="0"><TR><TD><B>A&lt;B&gt;</B></TD></TR><HR/></TABLE>"#);
    }
}
