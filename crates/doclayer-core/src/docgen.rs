//! Docstring, module overview and commit summary generation.

use std::path::Path;

use crate::cache::{cache_params, CacheStore};
use crate::constants::DOCSTRING_MAX_NEW_TOKENS;
use crate::errors::DocResult;
use crate::model_adapter::{generate, GenerationParams, TextGenerator};
use crate::parser::FunctionRecord;
use crate::prompt::PromptTemplate;

/// Docstring used when the model returns nothing usable.
pub const FALLBACK_DOCSTRING: &str = "TODO: add documentation.";

/// Prompt fragments that show the model echoed its instructions.
const ECHO_PHRASES: &[&str] = &[
    "Write a SHORT Python docstring",
    "Write a short Python docstring",
    "Explain:",
    "Do NOT",
    "Function code:",
    "Function:",
];

const MAX_DOCSTRING_SENTENCES: usize = 3;

/// Turn raw model output into a short triple-quoted docstring.
///
/// Code fences and quote delimiters are stripped. When the output echoes the
/// prompt, only the text after its last `.` is kept. At most three sentences
/// survive.
///
/// ```
/// use doclayer_core::docgen::sanitize_docstring;
///
/// assert_eq!(
///     sanitize_docstring("Loads the file. Parses it. Validates it. Returns it."),
///     "\"\"\"Loads the file. Parses it. Validates it.\"\"\""
/// );
/// ```
pub fn sanitize_docstring(raw: &str) -> String {
    let mut text = raw
        .trim()
        .replace("```", "")
        .replace("\"\"\"", "")
        .replace("'''", "")
        .trim()
        .to_string();

    for phrase in ECHO_PHRASES {
        if text.contains(phrase) {
            text = text.rsplit('.').next().unwrap_or_default().trim().to_string();
        }
    }

    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_DOCSTRING_SENTENCES)
        .collect();

    let body = if sentences.is_empty() {
        FALLBACK_DOCSTRING.to_string()
    } else {
        format!("{}.", sentences.join(". "))
    };

    format!("\"\"\"{body}\"\"\"")
}

/// Generates documentation text through a [`TextGenerator`].
///
/// Docstrings are cached per file name and function name; overviews and
/// commit summaries always reach the model.
#[derive(Debug)]
pub struct DocGenerator<'a> {
    cache: &'a CacheStore,
    generator: &'a dyn TextGenerator,
}

impl<'a> DocGenerator<'a> {
    pub fn new(cache: &'a CacheStore, generator: &'a dyn TextGenerator) -> Self {
        Self { cache, generator }
    }

    /// Sanitized docstring for `func`.
    pub fn generate_docstring(&self, func: &FunctionRecord) -> DocResult<String> {
        let file_name = func
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extra = cache_params([
            ("file", file_name),
            ("func", func.function_name.clone()),
        ]);
        let prompt = PromptTemplate::docstring(&func.body_text).render();

        let raw = match self.cache.load(&prompt, Some(&extra))? {
            Some(cached) => cached,
            None => {
                let params = GenerationParams::new().with_max_new_tokens(DOCSTRING_MAX_NEW_TOKENS);
                let response = generate(self.generator, &prompt, &params)?;
                self.cache.save(&prompt, &response, Some(&extra))?;
                response
            }
        };

        Ok(sanitize_docstring(&raw))
    }

    /// Markdown overview of a module from its function names.
    pub fn generate_module_overview(
        &self,
        file_path: &Path,
        functions: &[FunctionRecord],
    ) -> DocResult<String> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let names: Vec<&str> = functions.iter().map(|f| f.function_name.as_str()).collect();
        let prompt = PromptTemplate::module_overview(&file_name, &names).render();
        generate(self.generator, &prompt, &GenerationParams::new())
    }

    /// Bullet-point summary of a unified diff.
    pub fn generate_commit_summary(&self, diff_text: &str) -> DocResult<String> {
        let prompt = PromptTemplate::commit_summary(diff_text).render();
        generate(self.generator, &prompt, &GenerationParams::new())
    }
}
