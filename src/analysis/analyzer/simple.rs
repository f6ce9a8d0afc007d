//! Simple analyzer that performs tokenization without filtering.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use textcat::analysis::analyzer::{Analyzer, SimpleAnalyzer};
//! use textcat::analysis::tokenizer::WhitespaceTokenizer;
//!
//! let analyzer = SimpleAnalyzer::new(Arc::new(WhitespaceTokenizer::new()));
//! let words = analyzer.segment("Hello World").unwrap();
//!
//! // No filtering applied - original case preserved
//! assert_eq!(words, vec!["Hello", "World"]);
//! assert_eq!(analyzer.name(), "whitespace");
//! ```

use std::sync::Arc;

use crate::analysis::analyzer::analyzer::Analyzer;
use crate::analysis::token::TokenStream;
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A simple analyzer that just tokenizes. Its name is the tokenizer's name.
#[derive(Clone)]
pub struct SimpleAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
}

impl SimpleAnalyzer {
    /// Create a new simple analyzer with the given tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        SimpleAnalyzer { tokenizer }
    }

    /// Get the tokenizer used by this analyzer.
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }
}

impl Analyzer for SimpleAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.tokenizer.tokenize(text)
    }

    fn name(&self) -> &str {
        self.tokenizer.name()
    }
}

impl std::fmt::Debug for SimpleAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleAnalyzer")
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}
