//! CLI definition and command dispatch for doclayer.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to the engine.
//!
//! ## Configuration Precedence
//!
//! Configuration is resolved with the following precedence (highest to lowest):
//! 1. CLI flags (e.g., `--model`, `--cache`)
//! 2. Environment variables (`DOCLAYER_MODEL`, `DOCLAYER_CACHE`, ...)
//! 3. Config file (`~/.doclayer/config.yaml` or path from `--config`/`DOCLAYER_CONFIG`)
//! 4. Built-in defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::ui::format::{display_path, format_bytes};
use crate::ui::{table, ColorMode, MessageType, Progress, ProgressMode, Style};

use doclayer_core::uml::{render, write_png, UmlFormat, UmlOptions};
use doclayer_core::{
    DocError, DocLayerConfig, DocLayerEngine, DocResult, FileDocReport, GenerateObserver,
    GenerateOptions,
};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// doclayer – ask questions about a Python codebase and generate its docs
#[derive(Parser, Debug)]
#[command(name = "doclayer")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "DOCLAYER_VERBOSE")]
    pub verbose: bool,

    /// Suppress progress and informational messages
    #[arg(short, long, global = true, env = "DOCLAYER_QUIET")]
    pub quiet: bool,

    /// Path to configuration file (default: ~/.doclayer/config.yaml)
    #[arg(long, global = true, env = "DOCLAYER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Color output mode: always, never, or auto (default: auto)
    #[arg(long, global = true, env = "DOCLAYER_COLOR", default_value = "auto")]
    pub color: String,

    /// Response cache file (default: .ai_doc_cache.json)
    #[arg(long, global = true, env = "DOCLAYER_CACHE")]
    pub cache: Option<PathBuf>,

    /// Model served by the generation backend
    #[arg(long, global = true, env = "DOCLAYER_MODEL")]
    pub model: Option<String>,

    /// Base URL of the Ollama server
    #[arg(long, global = true, env = "DOCLAYER_OLLAMA_URL")]
    pub ollama_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a question about the code, citing the functions it used
    #[command(after_help = r#"EXAMPLES:
    doclayer ask "How is the config file parsed?"
    doclayer ask "Where are retries handled?" --repo ../service --top-k 6
    doclayer ask "What does load() return?" --json"#)]
    Ask {
        /// The question to answer
        question: String,

        /// Repository to index
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Number of functions given to the model as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank functions by relevance to a query, without calling the model
    #[command(after_help = r#"EXAMPLES:
    doclayer search "parse config"
    doclayer search "http retry" --repo ../service --top-k 10 --json"#)]
    Search {
        /// Free-text query
        query: String,

        /// Repository to index
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Insert missing docstrings and write one Markdown page per module
    #[command(after_help = r#"EXAMPLES:
    doclayer generate
    doclayer generate ../service --dry-run
    doclayer generate --only-changed
    doclayer generate --only-changed --base main --target HEAD"#)]
    Generate {
        /// Repository to document
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Only process Python files changed between --base and --target
        #[arg(long)]
        only_changed: bool,

        /// List what would be documented without calling the model or writing files
        #[arg(long)]
        dry_run: bool,

        /// Base ref for --only-changed
        #[arg(long, default_value = "HEAD~1", requires = "only_changed")]
        base: String,

        /// Target ref for --only-changed
        #[arg(long, default_value = "HEAD", requires = "only_changed")]
        target: String,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize the most recent commit (HEAD~1..HEAD) in plain English
    #[command(after_help = r#"EXAMPLES:
    doclayer summarize-last-commit
    doclayer summarize-last-commit ../service"#)]
    SummarizeLastCommit {
        /// Git repository
        #[arg(default_value = ".")]
        repo: PathBuf,
    },

    /// Draw a class diagram of the repository
    #[command(after_help = r#"EXAMPLES:
    doclayer uml
    doclayer uml --format mermaid --out classes.md
    doclayer uml ../service --png classes.png --functions"#)]
    Uml {
        /// Repository to scan
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Diagram format: dot or mermaid
        #[arg(long, default_value = "dot")]
        format: UmlFormat,

        /// Write the diagram source to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Render a PNG with Graphviz `dot`
        #[arg(long)]
        png: Option<PathBuf>,

        /// Also list module-level functions per file
        #[arg(long)]
        functions: bool,

        /// Diagram title
        #[arg(long)]
        title: Option<String>,
    },

    /// Inspect or reset the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the cache location and number of entries
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the cache file
    Clear,
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse arguments, build the engine and run the selected command.
///
/// Returns `ExitCode::SUCCESS` on success, or `ExitCode::FAILURE` on error.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Warnings always, debug only with --verbose. Logs go to stderr so --json
    // output stays parseable.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!(
        "doclayer_core={lvl},doclayer_model={lvl},doclayer_cli={lvl}",
        lvl = log_level
    );

    tracing_subscriber::fmt()
        .with_env_filter(&filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let color_mode = match cli.color.parse::<ColorMode>() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("{}", Style::new(ColorMode::Never).message(MessageType::Warn, &e));
            ColorMode::Auto
        }
    };
    let style = Style::new(color_mode);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            let hint = match &cli.config {
                Some(path) => format!("Check your config at {}", path.display()),
                None => "Check your global config at ~/.doclayer/config.yaml".to_string(),
            };
            eprintln!(
                "{}",
                style.error_with_context(
                    "Failed to load configuration",
                    Some(&e.to_string()),
                    Some(&hint),
                )
            );
            return ExitCode::FAILURE;
        }
    };

    let engine = match DocLayerEngine::from_config(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!(
                "{}",
                style.error_with_context(
                    "Failed to initialize doclayer engine",
                    Some(&e.to_string()),
                    hint_for(&e),
                )
            );
            return ExitCode::FAILURE;
        }
    };

    let quiet = cli.quiet;
    let result = match cli.command {
        Command::Ask {
            question,
            repo,
            top_k,
            json,
        } => handle_ask(&style, &engine, &repo, &question, top_k, json, quiet),
        Command::Search {
            query,
            repo,
            top_k,
            json,
        } => handle_search(&style, &engine, &repo, &query, top_k, json),
        Command::Generate {
            repo,
            only_changed,
            dry_run,
            base,
            target,
            json,
        } => {
            let opts = GenerateOptions {
                only_changed,
                dry_run,
                base,
                target,
            };
            handle_generate(&style, &engine, &repo, &opts, json, quiet)
        }
        Command::SummarizeLastCommit { repo } => {
            handle_summarize_last_commit(&style, &engine, &repo, quiet)
        }
        Command::Uml {
            repo,
            format,
            out,
            png,
            functions,
            title,
        } => {
            let mut opts = UmlOptions::new().with_functions(functions);
            if let Some(title) = title {
                opts = opts.with_title(title);
            }
            handle_uml(&style, &engine, &repo, format, &opts, out.as_deref(), png.as_deref())
        }
        Command::Cache { action } => match action {
            CacheAction::Info { json } => handle_cache_info(&style, &engine, json),
            CacheAction::Clear => handle_cache_clear(&style, &engine),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                style.error_with_context(&e.to_string(), None, hint_for(&e))
            );
            ExitCode::FAILURE
        }
    }
}

/// Load the config file and apply flag/env overrides on top of it.
fn load_config(cli: &Cli) -> DocResult<DocLayerConfig> {
    let mut config = match &cli.config {
        Some(path) => DocLayerConfig::from_path(path)?,
        None => DocLayerConfig::load_default()?,
    };

    if let Some(cache) = &cli.cache {
        config.cache.path = cache.clone();
    }
    if let Some(model) = &cli.model {
        config.generation.model_id = model.clone();
    }
    if let Some(url) = &cli.ollama_url {
        config.generation.base_url = url.clone();
    }

    tracing::debug!(
        model = %config.generation.model_id,
        base_url = %config.generation.base_url,
        cache = %config.cache.path.display(),
        "Configuration resolved"
    );
    Ok(config)
}

/// Actionable next step for errors users can fix themselves.
fn hint_for(error: &DocError) -> Option<&'static str> {
    match error {
        DocError::Generation { .. } => {
            Some("Make sure Ollama is running (`ollama serve`) and the model is pulled")
        }
        DocError::CacheParse { .. } => Some("Run `doclayer cache clear` to start a fresh cache"),
        DocError::Git { .. } => Some("Run the command inside a git repository with at least two commits"),
        DocError::PathNotFound(_) => Some("Pass an existing directory with --repo"),
        _ => None,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> DocResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_ask(
    style: &Style,
    engine: &DocLayerEngine,
    repo: &Path,
    question: &str,
    top_k: Option<usize>,
    json: bool,
    quiet: bool,
) -> DocResult<()> {
    let top_k = top_k.unwrap_or(engine.config().index.top_k);
    let assistant = engine.assistant(repo)?;
    tracing::debug!(entries = assistant.index().len(), top_k, "Index built");

    let progress = Progress::spinner(
        &format!("Asking {}...", engine.generator().model_id()),
        ProgressMode::detect(quiet, json),
    );
    let outcome = assistant.ask_detailed(question, top_k);
    progress.finish_clear();
    let outcome = outcome?;

    if json {
        return print_json(&outcome);
    }

    println!("{}", style.section("ANSWER"));
    println!();
    println!("{}", outcome.answer);

    if !outcome.sources.is_empty() {
        println!();
        println!("{}", style.section("SOURCES"));
        println!();
        println!("{}", table::render_hits_table(&outcome.sources, repo));
    }

    if outcome.from_cache && !quiet {
        println!();
        println!(
            "{}",
            style.message(MessageType::Info, "Answer served from cache")
        );
    }
    Ok(())
}

fn handle_search(
    style: &Style,
    engine: &DocLayerEngine,
    repo: &Path,
    query: &str,
    top_k: Option<usize>,
    json: bool,
) -> DocResult<()> {
    let top_k = top_k.unwrap_or(engine.config().index.top_k);
    let hits = engine.search(repo, query, top_k)?;

    if json {
        return print_json(&hits);
    }

    if hits.is_empty() {
        println!("{}", style.message(MessageType::Info, "No matching functions found."));
        println!(
            "{}",
            style.message(MessageType::Hint, "Try different words or check --repo")
        );
        return Ok(());
    }

    println!(
        "{}",
        style.message(MessageType::Ok, &format!("{} matching function(s)", hits.len()))
    );
    println!("{}", style.message_detail("Best score", &style.score(hits[0].score)));
    println!();
    println!("{}", table::render_hits_table(&hits, repo));
    Ok(())
}

/// Drives the progress bar and per-file lines during `generate`.
struct GenerateProgress<'a> {
    style: &'a Style,
    repo: &'a Path,
    progress: Progress,
    dry_run: bool,
}

impl GenerateObserver for GenerateProgress<'_> {
    fn on_start(&mut self, total_files: usize) {
        self.progress.set_length(total_files as u64);
    }

    fn on_file(&mut self, path: &Path) {
        self.progress.set_message(&display_path(path, self.repo));
    }

    fn on_file_done(&mut self, report: &FileDocReport) {
        self.progress.inc(1);
        let path = self.style.file_path(&display_path(&report.path, self.repo));
        let line = if self.dry_run {
            self.style.message(
                MessageType::Info,
                &format!("{} ({} of {} functions undocumented)", path, report.undocumented, report.functions),
            )
        } else if report.docstrings_inserted > 0 {
            self.style.message(
                MessageType::Ok,
                &format!("{} (+{} docstrings)", path, report.docstrings_inserted),
            )
        } else {
            self.style.message(MessageType::Skip, &format!("{} (nothing to insert)", path))
        };
        self.progress.println(&line);
    }
}

fn handle_generate(
    style: &Style,
    engine: &DocLayerEngine,
    repo: &Path,
    opts: &GenerateOptions,
    json: bool,
    quiet: bool,
) -> DocResult<()> {
    let mut observer = GenerateProgress {
        style,
        repo,
        progress: Progress::bar(0, "Documenting", ProgressMode::detect(quiet, json)),
        dry_run: opts.dry_run,
    };
    let report = engine.generate_docs(repo, opts, &mut observer);
    observer.progress.finish_clear();
    let report = report?;

    if json {
        return print_json(&report);
    }

    for skipped in &report.skipped {
        eprintln!(
            "{}",
            style.message(
                MessageType::Warn,
                &format!("{}: {}", display_path(&skipped.path, repo), skipped.reason)
            )
        );
    }

    if report.files.is_empty() {
        println!("{}", style.message(MessageType::Info, "No Python files to document."));
        return Ok(());
    }

    if !quiet {
        println!();
        println!("{}", table::render_generate_table(&report.files, repo));
        println!();
    }

    if report.dry_run {
        let pending: usize = report.files.iter().map(|f| f.undocumented).sum();
        println!(
            "{}",
            style.message(
                MessageType::Info,
                &format!(
                    "Dry run: {} docstring(s) would be generated across {} file(s)",
                    pending,
                    report.files.len()
                )
            )
        );
    } else {
        println!(
            "{}",
            style.message(
                MessageType::Ok,
                &format!(
                    "Inserted {} docstring(s) in {} file(s)",
                    report.docstrings_inserted(),
                    report.files.len()
                )
            )
        );
        println!(
            "{}",
            style.message_detail(
                "Pages",
                &display_path(&repo.join(&engine.config().docs.output_dir), repo)
            )
        );
    }
    Ok(())
}

fn handle_summarize_last_commit(
    style: &Style,
    engine: &DocLayerEngine,
    repo: &Path,
    quiet: bool,
) -> DocResult<()> {
    let progress = Progress::spinner("Summarizing HEAD~1..HEAD...", ProgressMode::detect(quiet, false));
    let summary = engine.summarize_last_commit(repo);
    progress.finish_clear();

    println!("{}", style.section("LAST COMMIT"));
    println!();
    println!("{}", summary?);
    Ok(())
}

fn handle_uml(
    style: &Style,
    engine: &DocLayerEngine,
    repo: &Path,
    format: UmlFormat,
    opts: &UmlOptions,
    out: Option<&Path>,
    png: Option<&Path>,
) -> DocResult<()> {
    let model = engine.uml(repo)?;
    if model.classes.is_empty() {
        eprintln!("{}", style.message(MessageType::Warn, "No classes found"));
    }

    let source = render(&model, format, opts);
    match out {
        Some(path) => {
            fs::write(path, &source).map_err(|e| DocError::WriteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            println!(
                "{}",
                style.message(
                    MessageType::Ok,
                    &format!("Wrote {} diagram to {}", format, style.file_path(&path.display().to_string()))
                )
            );
        }
        None if png.is_none() => println!("{}", source),
        None => {}
    }

    if let Some(png_path) = png {
        let dot = match format {
            UmlFormat::Dot => source,
            UmlFormat::Mermaid => render(&model, UmlFormat::Dot, opts),
        };
        write_png(&dot, png_path)?;
        println!(
            "{}",
            style.message(
                MessageType::Ok,
                &format!("Rendered {}", style.file_path(&png_path.display().to_string()))
            )
        );
    }
    Ok(())
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheInfo {
    location: String,
    exists: bool,
    entries: usize,
    size_bytes: u64,
}

fn handle_cache_info(style: &Style, engine: &DocLayerEngine, json: bool) -> DocResult<()> {
    let cache = engine.cache();
    let size_bytes = fs::metadata(&engine.config().cache.path)
        .map(|m| m.len())
        .ok();
    let info = CacheInfo {
        location: cache.location(),
        exists: size_bytes.is_some(),
        entries: cache.len()?,
        size_bytes: size_bytes.unwrap_or(0),
    };

    if json {
        return print_json(&info);
    }

    println!("{}", style.section("CACHE"));
    println!();
    println!("  {}", style.key_value("Location", &style.file_path(&info.location)));
    println!("  {}", style.key_value("Entries", &info.entries.to_string()));
    if info.exists {
        println!("  {}", style.key_value("Size", &format_bytes(info.size_bytes)));
    } else {
        println!("  {}", style.key_value("Size", "(not created yet)"));
    }
    Ok(())
}

fn handle_cache_clear(style: &Style, engine: &DocLayerEngine) -> DocResult<()> {
    if engine.cache().clear()? {
        println!(
            "{}",
            style.message(
                MessageType::Ok,
                &format!("Cleared cache at {}", engine.cache().location())
            )
        );
    } else {
        println!("{}", style.message(MessageType::Info, "Cache is already empty"));
    }
    Ok(())
}
