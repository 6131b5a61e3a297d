//! Token-bounded chunking
//!
//! Text is packed line by line into chunks whose token total stays under a
//! ceiling. Lines are never split or reordered; a line that alone exceeds
//! the ceiling becomes a chunk of its own.
//!
//! ```rust
//! use sheet_lens_analysis::chunk::{chunk_text, ApproximateTokenCounter};
//!
//! let chunks = chunk_text("alpha beta\ngamma\ndelta", 4, &ApproximateTokenCounter);
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[0].lines, vec!["alpha beta"]);
//! assert_eq!(chunks[1].text(), "gamma\ndelta");
//! ```

use lazy_regex::regex;

/// Ceiling for the first chunking pass
pub const DEFAULT_MAX_TOKENS: usize = 500_000;
/// Ceiling for re-chunking a chunk the generator rejected
pub const DEFAULT_FALLBACK_MAX_TOKENS: usize = 200_000;
/// Ceiling for requirements-document runs
pub const REQUIREMENTS_MAX_TOKENS: usize = 400_000;

/// Counts tokens in a piece of text
///
/// Counters that are additive across line breaks (the count of `a\nb` is the
/// count of `a\n` plus the count of `b`) get the single-chunk guarantee of
/// [`chunk_text`].
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;
}

impl<F: Fn(&str) -> usize> TokenCounter for F {
    fn count(&self, text: &str) -> usize {
        self(text)
    }
}

/// Tokenizer-free estimate
///
/// Counts word runs and single punctuation characters. Each line break is
/// one token; other whitespace is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateTokenCounter;

impl TokenCounter for ApproximateTokenCounter {
    fn count(&self, text: &str) -> usize {
        regex!(r"\w+|[^\w\s]|\n").find_iter(text).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub max_tokens: usize,
    pub fallback_max_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            fallback_max_tokens: DEFAULT_FALLBACK_MAX_TOKENS,
        }
    }
}

impl ChunkerConfig {
    /// Ceilings for requirements-document runs
    pub fn requirements() -> Self {
        Self {
            max_tokens: REQUIREMENTS_MAX_TOKENS,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// 0-based position in the chunk sequence
    pub index: usize,
    pub lines: Vec<String>,
    /// Sum of the line costs, terminators included
    pub token_count: usize,
}

impl TextChunk {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Cost of one line, counted with its terminator
pub fn line_cost(line: &str, counter: &dyn TokenCounter) -> usize {
    counter.count(&format!("{}\n", line))
}

/// Total of the line costs of `text`
///
/// For an additive counter this is `counter.count(text) + 1`: the last line
/// is priced with a terminator the text does not have. So any ceiling above
/// the document's own count yields a single chunk.
pub fn document_tokens(text: &str, counter: &dyn TokenCounter) -> usize {
    text.split('\n').map(|line| line_cost(line, counter)).sum()
}

/// Pack `text` into chunks of at most `max_tokens`
pub fn chunk_text(text: &str, max_tokens: usize, counter: &dyn TokenCounter) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut tokens = 0usize;

    let mut flush = |lines: &mut Vec<String>, tokens: &mut usize| {
        if !lines.is_empty() {
            chunks.push(TextChunk {
                index: chunks.len(),
                lines: std::mem::take(lines),
                token_count: std::mem::take(tokens),
            });
        }
    };

    for line in text.split('\n') {
        let cost = line_cost(line, counter);
        if tokens + cost > max_tokens {
            flush(&mut lines, &mut tokens);
        }
        lines.push(line.to_string());
        tokens += cost;
    }
    flush(&mut lines, &mut tokens);

    chunks
}
