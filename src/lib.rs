//! # textcat
//!
//! Multinomial naive Bayes text classification for Rust.
//!
//! ## Features
//!
//! - Chi-square feature selection with an explicit retention policy
//! - Laplace-smoothed log-space model, reproducible scoring
//! - Pluggable text analysis pipeline
//! - In-memory and file-backed corpora
//! - Evaluation with per-category and macro-averaged metrics
//! - JSON model persistence

pub mod analysis;
pub mod classification;
pub mod cli;
pub mod error;

pub mod prelude {
    pub use crate::analysis::{Analyzer, analyzer_by_name};
    pub use crate::classification::{
        Classifier, ClassifierConfig, DataSet, EvaluationResult, FileDataSet, MemoryDataSet,
        NaiveBayesClassifier, NaiveBayesModel,
    };
    pub use crate::error::{Result, TextcatError};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
