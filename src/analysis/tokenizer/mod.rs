//! Tokenizers split raw text into tokens.
//!
//! A tokenizer is the first stage of an analyzer. The classifier never talks
//! to a tokenizer directly: it goes through an
//! [`Analyzer`](crate::analysis::analyzer::Analyzer), which may add filters.
//!
//! # Available Tokenizers
//!
//! - [`whitespace::WhitespaceTokenizer`] - Splits on whitespace ("blank" tokenization)
//! - [`bigram::BigramTokenizer`] - Overlapping character bigrams for CJK text
//! - [`regex::RegexTokenizer`] - Custom regex-based tokenization
//! - [`unicode_word::UnicodeWordTokenizer`] - Unicode word boundaries (UAX #29)
//!
//! # Examples
//!
//! ```
//! use textcat::analysis::tokenizer::Tokenizer;
//! use textcat::analysis::tokenizer::whitespace::WhitespaceTokenizer;
//!
//! let tokenizer = WhitespaceTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello world").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// Tokenizers must be deterministic: the same input always yields the same
/// tokens, otherwise feature ids learned at training time would not line up
/// with the ones seen at prediction time.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod bigram;
pub mod regex;
pub mod unicode_word;
pub mod whitespace;

pub use bigram::BigramTokenizer;
pub use regex::RegexTokenizer;
pub use unicode_word::UnicodeWordTokenizer;
pub use whitespace::WhitespaceTokenizer;
