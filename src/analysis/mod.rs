//! Text analysis: turning raw text into the token sequences the classifier
//! counts.
//!
//! Analysis is pluggable. A [`Tokenizer`] splits text, [`Filter`]s rewrite
//! the token stream, and an [`Analyzer`] ties them together. Data sets and
//! trained models hold an `Arc<dyn Analyzer>` so that training and
//! prediction tokenize identically.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

use std::sync::Arc;

pub use analyzer::*;
pub use token::*;
pub use token_filter::*;
pub use tokenizer::*;

use crate::error::{Result, TextcatError};

/// Names accepted by [`analyzer_by_name`].
pub const STOCK_ANALYZERS: &[&str] = &[
    "whitespace",
    "bigram",
    "unicode_word",
    "regex",
    "standard",
    "standard_no_stop",
];

/// Build one of the stock analyzers from its name.
///
/// The name of every stock analyzer equals the name it reports through
/// [`Analyzer::name`], so the name stored in a persisted model rebuilds the
/// analyzer it was trained with.
pub fn analyzer_by_name(name: &str) -> Result<Arc<dyn Analyzer>> {
    let analyzer: Arc<dyn Analyzer> = match name {
        "whitespace" => Arc::new(SimpleAnalyzer::new(Arc::new(WhitespaceTokenizer::new()))),
        "bigram" => Arc::new(SimpleAnalyzer::new(Arc::new(BigramTokenizer::new()))),
        "unicode_word" => Arc::new(SimpleAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))),
        "regex" => Arc::new(SimpleAnalyzer::new(Arc::new(RegexTokenizer::new()?))),
        "standard" => Arc::new(StandardAnalyzer::new()?),
        "standard_no_stop" => Arc::new(StandardAnalyzer::without_stop_words()?),
        other => {
            return Err(TextcatError::invalid_argument(format!(
                "unknown analyzer '{other}', expected one of: {}",
                STOCK_ANALYZERS.join(", ")
            )));
        }
    };
    Ok(analyzer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_names_round_trip() {
        for name in STOCK_ANALYZERS {
            let analyzer = analyzer_by_name(name).unwrap();
            assert_eq!(analyzer.name(), *name);
        }
    }

    #[test]
    fn test_unknown_analyzer() {
        let err = analyzer_by_name("lindera").err().unwrap();
        assert!(matches!(err, TextcatError::InvalidArgument(_)));
    }
}
