//! doclayer engine: the entry point for every command.
//!
//! [`DocLayerEngine`] owns the configuration, the response cache and the text
//! generator, and wires them into the ask pipeline, documentation generation,
//! commit summaries and class diagrams.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ask::Assistant;
use crate::cache::CacheStore;
use crate::config::DocLayerConfig;
use crate::constants::{DEFAULT_DIFF_BASE, DEFAULT_DIFF_TARGET, PYTHON_EXTENSION};
use crate::diff::{changed_files, diff_text};
use crate::docgen::DocGenerator;
use crate::errors::{DocError, DocResult};
use crate::model_adapter::{create_text_generator, TextGenerator};
use crate::parser::{find_source_files, PythonParser, SkippedFile, SourceParser};
use crate::search::{QueryHit, SearchIndex};
use crate::uml::{collect_classes, UmlModel};
use crate::writer::{inject_docstrings, write_module_markdown};

// ============================================================================
// Generation options and reports
// ============================================================================

/// Options for [`DocLayerEngine::generate_docs`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Only process Python files changed between `base` and `target`.
    pub only_changed: bool,
    /// List what would be documented without calling the model or writing.
    pub dry_run: bool,
    pub base: String,
    pub target: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            only_changed: false,
            dry_run: false,
            base: DEFAULT_DIFF_BASE.to_string(),
            target: DEFAULT_DIFF_TARGET.to_string(),
        }
    }
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDocReport {
    pub path: PathBuf,
    /// Functions found in the file.
    pub functions: usize,
    /// Functions lacking a docstring (the ones sent to the model).
    pub undocumented: usize,
    /// Docstrings actually written into the file.
    pub docstrings_inserted: usize,
    /// Module page, when one was written.
    pub markdown: Option<PathBuf>,
}

/// Outcome of [`DocLayerEngine::generate_docs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReport {
    pub files: Vec<FileDocReport>,
    pub skipped: Vec<SkippedFile>,
    pub dry_run: bool,
}

impl GenerateReport {
    pub fn docstrings_inserted(&self) -> usize {
        self.files.iter().map(|f| f.docstrings_inserted).sum()
    }
}

/// Progress callbacks for long documentation runs.
pub trait GenerateObserver {
    /// Called once the list of files is known.
    fn on_start(&mut self, _total_files: usize) {}

    /// Called before a file is processed.
    fn on_file(&mut self, _path: &Path) {}

    /// Called after a file has been processed.
    fn on_file_done(&mut self, _report: &FileDocReport) {}
}

impl GenerateObserver for () {}

// ============================================================================
// DocLayerEngine
// ============================================================================

/// The main engine for doclayer operations.
///
/// # Example
///
/// ```ignore
/// use doclayer_core::{DocLayerConfig, DocLayerEngine};
///
/// let engine = DocLayerEngine::from_config(DocLayerConfig::load_default()?)?;
/// let answer = engine.assistant(Path::new("."))?.ask("where is the config parsed?", 4)?;
/// ```
#[derive(Debug)]
pub struct DocLayerEngine {
    config: DocLayerConfig,
    cache: CacheStore,
    generator: Box<dyn TextGenerator>,
}

impl DocLayerEngine {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Assemble an engine from explicit parts.
    pub fn new(config: DocLayerConfig, cache: CacheStore, generator: Box<dyn TextGenerator>) -> Self {
        Self {
            config,
            cache,
            generator,
        }
    }

    /// Create an engine with the file cache and generator the config names.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator cannot be built.
    pub fn from_config(config: DocLayerConfig) -> DocResult<Self> {
        let cache = CacheStore::open(&config.cache.path);
        let generator = create_text_generator(&config.generation)?;
        tracing::debug!(
            model = generator.model_id(),
            cache = %cache.location(),
            "Engine ready"
        );
        Ok(Self::new(config, cache, generator))
    }

    /// Create an engine from `~/.doclayer/config.yaml` (or defaults).
    pub fn with_defaults() -> DocResult<Self> {
        Self::from_config(DocLayerConfig::load_default()?)
    }

    pub fn config(&self) -> &DocLayerConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    fn parser(&self) -> PythonParser {
        PythonParser::new(self.config.index.max_code_chars)
    }

    fn empty_index(&self) -> SearchIndex {
        SearchIndex::new(
            self.config.index.tokenizer_config(),
            self.config.index.max_snippet_chars,
        )
    }

    fn build_index(&self, repo: &Path) -> DocResult<SearchIndex> {
        let mut index = self.empty_index();
        let report = index.build_index(repo, &self.parser())?;
        if report.files_skipped > 0 {
            tracing::warn!(
                "{} file(s) under {} could not be parsed",
                report.files_skipped,
                repo.display()
            );
        }
        Ok(index)
    }

    // -------------------------------------------------------------------------
    // Retrieval
    // -------------------------------------------------------------------------

    /// An [`Assistant`] over a freshly built index of `repo`.
    pub fn assistant(&self, repo: &Path) -> DocResult<Assistant<'_>> {
        let index = self.build_index(repo)?;
        Ok(Assistant::new(&self.cache, self.generator.as_ref(), index))
    }

    /// Rank the functions of `repo` against `query` without calling the model.
    pub fn search(&self, repo: &Path, query: &str, top_k: usize) -> DocResult<Vec<QueryHit>> {
        Ok(self.build_index(repo)?.query(query, top_k))
    }

    // -------------------------------------------------------------------------
    // Documentation
    // -------------------------------------------------------------------------

    /// Generate docstrings and module pages for the Python files of `repo`.
    ///
    /// Files are rewritten in place and pages land in
    /// `<repo>/<docs.outputDir>/`. A model failure aborts the run; files
    /// already processed keep their changes.
    pub fn generate_docs(
        &self,
        repo: &Path,
        opts: &GenerateOptions,
        observer: &mut dyn GenerateObserver,
    ) -> DocResult<GenerateReport> {
        if !repo.is_dir() {
            return Err(DocError::PathNotFound(repo.display().to_string()));
        }

        let files = if opts.only_changed {
            changed_files(repo, &opts.base, &opts.target)?
                .into_iter()
                .filter(|path| {
                    let exists = path.is_file();
                    if !exists {
                        tracing::debug!("Skipping removed file {}", path.display());
                    }
                    exists
                })
                .collect()
        } else {
            find_source_files(repo, PYTHON_EXTENSION)?
        };

        let parser = self.parser();
        let docgen = DocGenerator::new(&self.cache, self.generator.as_ref());
        let docs_root = repo.join(&self.config.docs.output_dir);
        let mut report = GenerateReport {
            dry_run: opts.dry_run,
            ..Default::default()
        };

        observer.on_start(files.len());
        for path in files {
            observer.on_file(&path);

            let functions = match parser.parse_file(&path) {
                Ok(functions) => functions,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.skipped.push(SkippedFile {
                        reason: e.to_string(),
                        path,
                    });
                    continue;
                }
            };

            let undocumented: Vec<_> = functions.iter().filter(|f| !f.has_docstring).collect();
            let mut file_report = FileDocReport {
                path: path.clone(),
                functions: functions.len(),
                undocumented: undocumented.len(),
                docstrings_inserted: 0,
                markdown: None,
            };

            if !opts.dry_run && !functions.is_empty() {
                let mut docstrings = BTreeMap::new();
                for func in &undocumented {
                    docstrings.insert(func.line_number, docgen.generate_docstring(func)?);
                }
                file_report.docstrings_inserted = inject_docstrings(&path, &docstrings)?;

                let overview = docgen.generate_module_overview(&path, &functions)?;
                file_report.markdown = Some(write_module_markdown(
                    &docs_root, repo, &path, &overview, &functions,
                )?);
            }

            observer.on_file_done(&file_report);
            report.files.push(file_report);
        }

        tracing::debug!(
            files = report.files.len(),
            inserted = report.docstrings_inserted(),
            dry_run = opts.dry_run,
            "Documentation run finished"
        );
        Ok(report)
    }

    /// Summarize the changes between `HEAD~1` and `HEAD`.
    pub fn summarize_last_commit(&self, repo: &Path) -> DocResult<String> {
        self.summarize_commit(repo, DEFAULT_DIFF_BASE, DEFAULT_DIFF_TARGET)
    }

    /// Summarize the changes between two refs.
    ///
    /// An empty diff is reported without calling the model.
    pub fn summarize_commit(&self, repo: &Path, base: &str, target: &str) -> DocResult<String> {
        let diff = diff_text(repo, base, target)?;
        if diff.trim().is_empty() {
            return Ok(format!("No changes between {base} and {target}."));
        }
        DocGenerator::new(&self.cache, self.generator.as_ref()).generate_commit_summary(&diff)
    }

    // -------------------------------------------------------------------------
    // Diagrams
    // -------------------------------------------------------------------------

    /// Class model of `repo` for diagram rendering.
    pub fn uml(&self, repo: &Path) -> DocResult<UmlModel> {
        collect_classes(repo)
    }
}
