//! Core analyzer trait definition.
//!
//! An [`Analyzer`] is the tokenization capability the classifier depends on.
//! The same analyzer instance (or one with an identical configuration) must
//! be used for training and prediction, otherwise the tokens seen at
//! prediction time do not map onto the learned features.
//!
//! ```text
//! Raw Text → Analyzer → Token Stream → Document
//!             ↓
//!         Tokenizer
//!             ↓
//!         Filter 1 … Filter N
//! ```
//!
//! # Examples
//!
//! ```
//! use textcat::analysis::analyzer::{Analyzer, StandardAnalyzer};
//!
//! let analyzer = StandardAnalyzer::new().unwrap();
//! let words = analyzer.segment("The Quick brown fox").unwrap();
//! assert_eq!(words, vec!["quick", "brown", "fox"]);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer.
    ///
    /// The name is recorded in persisted models so that a matching analyzer
    /// can be rebuilt with [`analyzer_by_name`](crate::analysis::analyzer_by_name).
    fn name(&self) -> &str;

    /// Segment text into the ordered token strings, skipping stopped tokens.
    fn segment(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .analyze(text)?
            .filter(|token| !token.is_stopped() && !token.is_empty())
            .map(|token| token.text)
            .collect())
    }
}
