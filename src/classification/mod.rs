//! Naive Bayes text classification.
//!
//! The pipeline runs in four stages:
//!
//! 1. [`ChiSquareSelector`] counts documents per category and feature over a
//!    [`DataSet`] and keeps the features most dependent on some category.
//! 2. [`NaiveBayesModel::train`] turns the selected counts into log-priors
//!    and Laplace-smoothed log-likelihoods.
//! 3. A [`Classifier`] scores new text against the trained categories.
//! 4. [`evaluate`] measures a classifier on labeled held-out data.
//!
//! [`NaiveBayesClassifier`] wires the stages together.

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod document;
pub mod evaluation;
pub mod features;
pub mod model;
pub mod scoring;
pub mod vocabulary;

pub use classifier::{Classifier, NaiveBayesClassifier};
pub use config::{ClassifierConfig, FeatureSelectionConfig, Retention};
pub use dataset::{DataSet, DocumentIter, FileDataSet, MemoryDataSet};
pub use diagnostics::{DiagnosticSink, FeatureDump, FileSink, LogSink, Misclassification};
pub use document::Document;
pub use evaluation::{ConfusionCounts, EvaluationResult, evaluate};
pub use features::{
    CHI_SQUARE_CRITICAL_P001, ChiSquareSelector, FeatureLookup, FeatureLookupBuilder,
    FeatureStatistics, SelectedFeatures,
};
pub use model::NaiveBayesModel;
pub use vocabulary::{Catalog, Lexicon, TermIndex};
