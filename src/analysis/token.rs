//! Token types for text analysis.
//!
//! A [`Token`] is the unit that flows from a tokenizer through the token
//! filters of an analyzer. The classifier only consumes the token text, but
//! positions and offsets are kept so that misclassification logs and
//! debugging output can point back into the source text.
//!
//! # Examples
//!
//! ```
//! use textcat::analysis::token::Token;
//!
//! let token = Token::with_offsets("world", 1, 6, 11);
//! assert_eq!(token.text, "world");
//! assert_eq!(token.position, 1);
//! assert!(!token.is_stopped());
//! ```

use serde::{Deserialize, Serialize};

/// A single unit of text produced by a tokenizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// The position of the token in the token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the original text
    pub start_offset: usize,

    /// The byte offset where this token ends in the original text
    pub end_offset: usize,

    /// Whether a filter marked this token as stopped
    pub stopped: bool,
}

/// A boxed iterator of tokens, the currency between tokenizers and filters.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset: 0,
            end_offset: 0,
            stopped: false,
        }
    }

    /// Create a new token with text, position, and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
            stopped: false,
        }
    }

    /// Get the length of the token text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the token text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Mark this token as stopped.
    pub fn stop(mut self) -> Self {
        self.stopped = true;
        self
    }

    /// Check if this token is stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Replace the text of this token, keeping position and offsets.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_builders() {
        let token = Token::new("Hello", 3).with_text("hello");
        assert_eq!(token.text, "hello");
        assert_eq!(token.position, 3);
        assert_eq!(token.len(), 5);
        assert!(!token.is_empty());

        let stopped = token.stop();
        assert!(stopped.is_stopped());
    }
}
