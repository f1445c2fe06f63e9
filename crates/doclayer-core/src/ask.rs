//! Ask pipeline: grounded question answering over a codebase.
//!
//! [`Assistant`] combines the response cache, the function search index and a
//! [`TextGenerator`] into one operation.
//!
//! ## Flow
//!
//! 1. Probe the cache with `(question, {"top_k": k})`; a hit is returned as-is
//! 2. Query the search index for the `k` best function snippets
//! 3. Render the labeled snippets into a context block
//! 4. Fill the ask [`PromptTemplate`] and call the generator
//! 5. Save the answer under the key from step 1
//!
//! Generator failures propagate and nothing is cached for them.

use std::path::Path;

use serde::Serialize;

use crate::cache::{cache_params, CacheParams, CacheStore};
use crate::constants::{ASK_MAX_NEW_TOKENS, ASK_TEMPERATURE};
use crate::errors::DocResult;
use crate::model_adapter::{generate, GenerationParams, TextGenerator};
use crate::parser::SourceParser;
use crate::prompt::PromptTemplate;
use crate::search::{IndexBuildReport, QueryHit, SearchIndex};

/// Answer plus provenance, for callers that display more than the text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskOutcome {
    pub answer: String,
    /// True when the answer was served from the cache.
    pub from_cache: bool,
    /// Snippets embedded in the prompt; empty on a cache hit.
    pub sources: Vec<QueryHit>,
}

/// Question-answering front end for one source tree.
///
/// Borrows the process-wide cache and generator; owns its index.
#[derive(Debug)]
pub struct Assistant<'a> {
    cache: &'a CacheStore,
    generator: &'a dyn TextGenerator,
    index: SearchIndex,
}

impl<'a> Assistant<'a> {
    /// Assistant over an already-built index.
    pub fn new(cache: &'a CacheStore, generator: &'a dyn TextGenerator, index: SearchIndex) -> Self {
        Self {
            cache,
            generator,
            index,
        }
    }

    /// Rebuild the index from `root`.
    pub fn build_index(
        &mut self,
        root: &Path,
        parser: &dyn SourceParser,
    ) -> DocResult<IndexBuildReport> {
        self.index.build_index(root, parser)
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Answer `question` using the `top_k` most relevant functions.
    pub fn ask(&self, question: &str, top_k: usize) -> DocResult<String> {
        self.ask_detailed(question, top_k).map(|outcome| outcome.answer)
    }

    /// Like [`ask`](Self::ask), also reporting cache use and sources.
    pub fn ask_detailed(&self, question: &str, top_k: usize) -> DocResult<AskOutcome> {
        let extra = cache_extra(top_k);

        if let Some(answer) = self.cache.load(question, Some(&extra))? {
            tracing::debug!(top_k, "Answer served from cache");
            return Ok(AskOutcome {
                answer,
                from_cache: true,
                sources: Vec::new(),
            });
        }

        let (context, sources) = self.build_context(question, top_k);
        tracing::debug!(
            top_k,
            hits = sources.len(),
            context_chars = context.len(),
            "Context assembled"
        );

        let prompt = PromptTemplate::ask(&context, question).render();
        let params = GenerationParams::new()
            .with_max_new_tokens(ASK_MAX_NEW_TOKENS)
            .with_temperature(ASK_TEMPERATURE)
            .with_do_sample(false);
        let answer = generate(self.generator, &prompt, &params)?;

        self.cache.save(question, &answer, Some(&extra))?;

        Ok(AskOutcome {
            answer,
            from_cache: false,
            sources,
        })
    }

    /// Ranked snippets for `question`, rendered as one context block.
    ///
    /// Each hit becomes
    ///
    /// ```text
    /// File: <path>
    /// Function: <name> (line <n>)
    /// ---
    /// <snippet>
    /// ---
    /// ```
    ///
    /// and blocks are separated by a blank line, best first.
    pub fn build_context(&self, question: &str, top_k: usize) -> (String, Vec<QueryHit>) {
        let hits = self.index.query(question, top_k);
        let context = hits
            .iter()
            .map(format_hit)
            .collect::<Vec<_>>()
            .join("\n\n");
        (context, hits)
    }
}

fn cache_extra(top_k: usize) -> CacheParams {
    cache_params([("top_k", top_k)])
}

fn format_hit(hit: &QueryHit) -> String {
    format!(
        "File: {}\nFunction: {} (line {})\n---\n{}\n---\n",
        hit.file_path.display(),
        hit.function_name,
        hit.line_number,
        hit.snippet
    )
}
