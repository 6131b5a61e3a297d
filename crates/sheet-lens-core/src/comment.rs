//! Cell comments (notes)
//!
//! A comment marks a cell as documented for the business-context heuristic;
//! its text is carried into input-section descriptors.

use std::fmt;

/// A note attached to a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellComment {
    /// Author name from the comments part (may be empty)
    pub author: String,
    /// Plain text of the note, rich-text runs concatenated
    pub text: String,
}

impl CellComment {
    /// Create a comment with an author
    ///
    /// ```rust
    /// use sheet_lens_core::CellComment;
    ///
    /// let comment = CellComment::new("Finance", "Update quarterly");
    /// assert_eq!(comment.to_string(), "[Finance]: Update quarterly");
    /// ```
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }

    /// Create a comment with no author
    pub fn text_only(text: impl Into<String>) -> Self {
        Self::new(String::new(), text)
    }

    pub fn has_author(&self) -> bool {
        !self.author.is_empty()
    }
}

impl fmt::Display for CellComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_author() {
            write!(f, "[{}]: {}", self.author, self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_only_has_no_author() {
        let comment = CellComment::text_only("Assumption from budget");
        assert!(!comment.has_author());
        assert_eq!(comment.to_string(), "Assumption from budget");
    }
}
