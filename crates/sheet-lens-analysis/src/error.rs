//! Analysis error types

use thiserror::Error;

/// Result type for analysis operations
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Errors surfaced by the analysis pipeline
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Nothing to send to the text generator
    #[error("no content to analyze")]
    EmptyInput,

    /// Every chunk failed; carries the label and cause of each failure
    #[error("all {} chunk(s) failed: {}", .failures.len(), summarize(.failures))]
    AllChunksFailed { failures: Vec<ChunkFailure> },
}

/// A chunk the text generator produced nothing for
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFailure {
    /// `2/5`, or `2.1` for a re-split piece
    pub label: String,
    pub reason: String,
}

fn summarize(failures: &[ChunkFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}] {}", f.label, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
