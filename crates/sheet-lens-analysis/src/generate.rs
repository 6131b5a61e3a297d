//! Chunked text generation
//!
//! The rendered workbook document is too large for one request, so it is
//! chunked and sent piece by piece to a [`TextGenerator`]. Two runs are
//! supported:
//!
//! - [`ChunkedAnalyzer::analyze`] writes a user-guide style report. A chunk
//!   the generator rejects is split again at the fallback ceiling.
//! - [`ChunkedAnalyzer::requirements`] writes a product requirements
//!   document and, when several sections come back, asks the generator to
//!   merge them.
//!
//! Failed or empty chunks are logged and left out. Only a run in which
//! every chunk fails is an error.

use serde::Serialize;
use thiserror::Error;

use crate::chunk::{chunk_text, ApproximateTokenCounter, ChunkerConfig, TextChunk, TokenCounter};
use crate::error::{AnalysisError, AnalysisResult, ChunkFailure};
use crate::summary::WorkbookSummary;

/// Joins the per-chunk analyses of a report
pub const ANALYSIS_SEPARATOR: &str = "\n\n## Analysis of Next Section\n\n";
/// Joins requirements sections when the merge request fails
pub const SECTION_FALLBACK_SEPARATOR: &str = "\n\n# PRD SECTION BREAK\n\n";

const ANALYSIS_PREAMBLE: &str = "\
You are reviewing the structure of an Excel workbook that has been converted to markdown. \
Explain it to someone who has to use and maintain it.

Cover:
1. The purpose of each worksheet and how the worksheets relate to each other
2. Which cells are inputs, which are calculations and which are outputs
3. The main calculations, described step by step in plain language
4. Data flow across sheets and any named ranges that carry it
5. Validation rules and the values they allow
6. Risks: fragile formulas, hard-coded constants, missing checks

Use markdown headings and keep cell references so readers can find them.";

const REQUIREMENTS_PREAMBLE: &str = "\
You are a software architect writing a Product Requirements Document for an application \
that replaces the Excel workbook described below. The document must be detailed enough \
for an engineer to rebuild the workbook's behaviour without opening it.

Include:
1. Executive summary: purpose, users, success measures
2. Data model: entities, fields, types and validation rules
3. Business logic: every calculation translated into step-by-step algorithms, \
in dependency order
4. User interface: input forms, tables and dashboards, with their fields
5. Reporting and export requirements
6. Implementation roadmap and acceptance tests

Refer to the source cells and sheets for every requirement.";

const SYNTHESIS_PREAMBLE: &str = "\
The sections below were written separately, each from one part of the same Excel workbook. \
Merge them into a single, consistent Product Requirements Document. Remove duplicated \
requirements, keep every distinct one, and unify the numbering and terminology.";

/// Failure reported by a [`TextGenerator`]
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The request never produced a response (network, timeout)
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with an error status
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The service refused to answer the prompt
    #[error("response blocked: {0}")]
    Blocked(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Sampling parameters sent with each request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

impl GenerationConfig {
    /// Lower temperature for requirements sections
    pub fn requirements() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.9,
            ..Self::default()
        }
    }

    /// Used for the request that merges requirements sections
    pub fn synthesis() -> Self {
        Self {
            temperature: 0.2,
            ..Self::requirements()
        }
    }
}

/// A generative text service
pub trait TextGenerator {
    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError> {
        (**self).generate(prompt, config)
    }
}

/// Workbook facts added to the requirements preamble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookContext {
    pub sheet_count: usize,
    pub complexity_rating: String,
    pub formula_patterns: Vec<String>,
}

impl WorkbookContext {
    pub fn from_summary(summary: &WorkbookSummary) -> Self {
        Self {
            sheet_count: summary.sheet_count,
            complexity_rating: summary.complexity_rating.to_string(),
            formula_patterns: summary
                .formula_patterns
                .tokens()
                .map(str::to_string)
                .collect(),
        }
    }

    fn preamble(&self) -> String {
        format!(
            "{}\n\nADDITIONAL CONTEXT:\n\
             - Number of worksheets: {}\n\
             - Overall complexity: {}\n\
             - Key formulas identified: {}\n",
            REQUIREMENTS_PREAMBLE,
            self.sheet_count,
            self.complexity_rating,
            self.formula_patterns.join(", ")
        )
    }
}

/// Result of a chunked run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocument {
    pub text: String,
    /// Chunks in the first pass
    pub chunk_count: usize,
    /// Chunks that produced nothing, in submission order
    pub failures: Vec<ChunkFailure>,
}

pub struct ChunkedAnalyzer<'a, G: ?Sized> {
    generator: &'a G,
    counter: &'a dyn TokenCounter,
    chunker: ChunkerConfig,
}

impl<'a, G: TextGenerator + ?Sized> ChunkedAnalyzer<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self {
            generator,
            counter: &ApproximateTokenCounter,
            chunker: ChunkerConfig::default(),
        }
    }

    pub fn with_counter(mut self, counter: &'a dyn TokenCounter) -> Self {
        self.counter = counter;
        self
    }

    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    fn chunks(&self, content: &str, max_tokens: usize) -> AnalysisResult<Vec<TextChunk>> {
        if content.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        let chunks = chunk_text(content, max_tokens, self.counter);
        log::info!(
            "split content into {} chunk(s) of at most {} tokens",
            chunks.len(),
            max_tokens
        );
        Ok(chunks)
    }

    /// Send one prompt; `Ok(None)` for an empty response
    fn request(
        &self,
        label: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Option<String>, GenerationError> {
        log::debug!("chunk {}: sending {} byte prompt", label, prompt.len());
        let text = self.generator.generate(prompt, config)?;
        if text.trim().is_empty() {
            log::warn!("chunk {}: empty response", label);
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// User-guide report over `content`
    pub fn analyze(&self, content: &str) -> AnalysisResult<GeneratedDocument> {
        let config = GenerationConfig::default();
        let chunks = self.chunks(content, self.chunker.max_tokens)?;
        let total = chunks.len();
        let mut sections = Vec::new();
        let mut failures = Vec::new();

        for chunk in &chunks {
            let label = format!("{}/{}", chunk.index + 1, total);
            let prompt = analysis_prompt(&label, &chunk.text());
            match self.request(&label, &prompt, &config) {
                Ok(Some(text)) => sections.push(text),
                Ok(None) => failures.push(failure(&label, "empty response")),
                Err(e) if chunk.token_count > self.chunker.fallback_max_tokens => {
                    log::warn!(
                        "chunk {} failed ({}); splitting {} tokens at {}",
                        label,
                        e,
                        chunk.token_count,
                        self.chunker.fallback_max_tokens
                    );
                    self.analyze_split(chunk, &config, &mut sections, &mut failures);
                }
                Err(e) => {
                    log::warn!("chunk {} failed: {}", label, e);
                    failures.push(failure(&label, &e.to_string()));
                }
            }
        }

        finish(sections, failures, total, ANALYSIS_SEPARATOR)
    }

    fn analyze_split(
        &self,
        chunk: &TextChunk,
        config: &GenerationConfig,
        sections: &mut Vec<String>,
        failures: &mut Vec<ChunkFailure>,
    ) {
        let parts = chunk_text(&chunk.text(), self.chunker.fallback_max_tokens, self.counter);
        for part in &parts {
            let label = format!("{}.{}", chunk.index + 1, part.index + 1);
            let prompt = analysis_prompt(&label, &part.text());
            match self.request(&label, &prompt, config) {
                Ok(Some(text)) => sections.push(text),
                Ok(None) => failures.push(failure(&label, "empty response")),
                Err(e) => {
                    log::warn!("chunk {} failed: {}", label, e);
                    failures.push(failure(&label, &e.to_string()));
                }
            }
        }
    }

    /// Product requirements document over `content`
    pub fn requirements(
        &self,
        content: &str,
        context: &WorkbookContext,
    ) -> AnalysisResult<GeneratedDocument> {
        let config = GenerationConfig::requirements();
        let preamble = context.preamble();
        let chunks = self.chunks(content, self.chunker.max_tokens)?;
        let total = chunks.len();
        let mut sections = Vec::new();
        let mut failures = Vec::new();

        for chunk in &chunks {
            let label = format!("{}/{}", chunk.index + 1, total);
            let mut prompt = format!(
                "{}\n\nAnalyze this portion ({}) of the Excel spreadsheet for PRD generation:\n\n{}",
                preamble,
                label,
                chunk.text()
            );
            if total > 1 {
                prompt.push_str(&format!(
                    "\n\nNOTE: This is chunk {} of {}. Describe the functionality visible in \
                     this portion; the sections are merged into one document afterwards.",
                    chunk.index + 1,
                    total
                ));
            }
            match self.request(&label, &prompt, &config) {
                Ok(Some(text)) => sections.push(text),
                Ok(None) => failures.push(failure(&label, "empty response")),
                Err(e) => {
                    log::warn!("chunk {} failed: {}", label, e);
                    failures.push(failure(&label, &e.to_string()));
                }
            }
        }

        if sections.len() > 1 {
            let merged = self.synthesize(&sections);
            let mut document = finish(sections, failures, total, SECTION_FALLBACK_SEPARATOR)?;
            if let Some(text) = merged {
                document.text = text;
            }
            return Ok(document);
        }
        finish(sections, failures, total, SECTION_FALLBACK_SEPARATOR)
    }

    /// Merge requirements sections; `None` when the merge request fails
    fn synthesize(&self, sections: &[String]) -> Option<String> {
        let separator = format!("\n\n{} SECTION BREAK {}\n\n", "=".repeat(40), "=".repeat(40));
        let prompt = format!("{}\n\n{}", SYNTHESIS_PREAMBLE, sections.join(&separator));
        log::info!("merging {} requirements sections", sections.len());
        match self.request("synthesis", &prompt, &GenerationConfig::synthesis()) {
            Ok(merged) => merged,
            Err(e) => {
                log::warn!("merging sections failed: {}; concatenating instead", e);
                None
            }
        }
    }
}

fn analysis_prompt(label: &str, chunk: &str) -> String {
    format!(
        "{}\n\nAnalyze this portion ({}) of the Excel spreadsheet content:\n\n{}",
        ANALYSIS_PREAMBLE, label, chunk
    )
}

fn failure(label: &str, reason: &str) -> ChunkFailure {
    ChunkFailure {
        label: label.to_string(),
        reason: reason.to_string(),
    }
}

fn finish(
    sections: Vec<String>,
    failures: Vec<ChunkFailure>,
    chunk_count: usize,
    separator: &str,
) -> AnalysisResult<GeneratedDocument> {
    if sections.is_empty() {
        return Err(AnalysisError::AllChunksFailed { failures });
    }
    if !failures.is_empty() {
        log::warn!(
            "{} chunk(s) missing from the result: {}",
            failures.len(),
            failures
                .iter()
                .map(|f| f.label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(GeneratedDocument {
        text: sections.join(separator),
        chunk_count,
        failures,
    })
}
