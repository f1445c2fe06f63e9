//! Prompt templates.
//!
//! Every model request is assembled from named slots and rendered to text only
//! at the generator boundary:
//!
//! ```text
//! <instructions>
//!
//! <label>:
//! <context>
//!
//! Question: <question>
//! <closing>
//! ```
//!
//! Slots other than `instructions` are optional and omitted when unset.

use std::fmt;

const ASK_INSTRUCTIONS: &str = "You are an expert developer who only answers based on the provided context.\n\
If the answer is not present, say you could not find enough information.";

const ASK_CLOSING: &str = "Answer concisely, cite files/line numbers when relevant.";

const DOCSTRING_INSTRUCTIONS: &str = "Write a short Python docstring (max 2–3 sentences) describing ONLY:\n\
\n\
- What the function does\n\
- What important parameters mean\n\
- What it returns (if applicable)\n\
\n\
Do NOT copy these instructions.";

const COMMIT_SUMMARY_INSTRUCTIONS: &str = "You are a senior engineer.\n\
\n\
Given this git diff, write a short human-readable summary of what changed and why it might matter.\n\
Limit to 3-4 bullet points.";

const OVERVIEW_CLOSING: &str = "Write a short Markdown section explaining:\n\
- What this module is likely responsible for.\n\
- How the main functions work together.\n\
- Any potential entry point for new developers.\n\
\n\
Keep it under 8 sentences.";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    label: String,
    body: String,
}

/// A model prompt with named slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    instructions: String,
    context: Option<Section>,
    question: Option<String>,
    closing: Option<String>,
}

impl PromptTemplate {
    /// Template with only the instruction slot filled.
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            context: None,
            question: None,
            closing: None,
        }
    }

    /// Attach a labeled context block.
    pub fn with_context(mut self, label: impl Into<String>, body: impl Into<String>) -> Self {
        self.context = Some(Section {
            label: label.into(),
            body: body.into(),
        });
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_closing(mut self, closing: impl Into<String>) -> Self {
        self.closing = Some(closing.into());
        self
    }

    /// Grounded question answering: the model must decline rather than guess
    /// when `context` does not hold the answer.
    pub fn ask(context: &str, question: &str) -> Self {
        Self::new(ASK_INSTRUCTIONS)
            .with_context("Context", context)
            .with_question(question)
            .with_closing(ASK_CLOSING)
    }

    /// Docstring request for one function's source.
    pub fn docstring(code: &str) -> Self {
        Self::new(DOCSTRING_INSTRUCTIONS).with_context("Function", code)
    }

    /// Overview request for a module given its function names.
    pub fn module_overview(file_name: &str, function_names: &[&str]) -> Self {
        let names = if function_names.is_empty() {
            "No functions found".to_string()
        } else {
            function_names.join(", ")
        };
        Self::new(format!(
            "You are documenting a Python module named {file_name}.\n\nFunctions in this file: {names}"
        ))
        .with_closing(format!("\n{OVERVIEW_CLOSING}"))
    }

    /// Change summary request for a unified diff.
    pub fn commit_summary(diff_text: &str) -> Self {
        Self::new(COMMIT_SUMMARY_INSTRUCTIONS).with_context("Diff", diff_text)
    }

    /// Render to the final prompt text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.instructions)?;
        if let Some(section) = &self.context {
            write!(f, "\n\n{}:\n{}", section.label, section.body)?;
        }
        if let Some(question) = &self.question {
            write!(f, "\n\nQuestion: {question}")?;
        }
        if let Some(closing) = &self.closing {
            write!(f, "\n{closing}")?;
        }
        Ok(())
    }
}
