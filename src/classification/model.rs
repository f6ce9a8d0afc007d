//! The trained multinomial naive Bayes model.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::document::Document;
use super::features::{FeatureLookup, SelectedFeatures};
use super::vocabulary::Catalog;
use crate::analysis::analyzer::Analyzer;
use crate::error::{Result, TextcatError};

/// Log-priors and Laplace-smoothed log-likelihoods over a selected
/// vocabulary.
///
/// `log_likelihoods[f][c]` is materialized for every selected feature `f`
/// and category `c`, and is always finite and negative. The model is
/// read-only once trained.
#[derive(Clone)]
pub struct NaiveBayesModel {
    documents: usize,
    log_priors: Vec<f64>,
    log_likelihoods: Vec<Vec<f64>>,
    lookup: FeatureLookup,
    catalog: Catalog,
    analyzer: Arc<dyn Analyzer>,
}

impl NaiveBayesModel {
    /// Estimate the model from selected feature counts.
    ///
    /// `log_prior[c] = ln(count[c] / n)` and
    /// `log_likelihood[f][c] = ln((joint[f][c] + 1) / (S[c] + d))`, where
    /// `S[c]` sums the joint counts of category `c` over the `d` selected
    /// features.
    pub fn train(selected: SelectedFeatures, catalog: Catalog, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        let SelectedFeatures {
            statistics, lookup, ..
        } = selected;
        statistics.validate(&catalog)?;
        if statistics.category_count() != catalog.len() {
            return Err(TextcatError::data(format!(
                "statistics cover {} categories but the catalog has {}",
                statistics.category_count(),
                catalog.len()
            )));
        }

        let n = statistics.n as f64;
        let log_priors: Vec<f64> = statistics
            .category_counts
            .iter()
            .map(|&count| (count as f64 / n).ln())
            .collect();

        let d = statistics.feature_count();
        let mut sums = vec![0u64; statistics.category_count()];
        for row in &statistics.joint_counts {
            for (sum, &count) in sums.iter_mut().zip(row) {
                *sum += u64::from(count);
            }
        }
        let denominators: Vec<f64> = sums.iter().map(|&sum| (sum + d as u64) as f64).collect();

        let log_likelihoods: Vec<Vec<f64>> = statistics
            .joint_counts
            .par_iter()
            .map(|row| {
                row.iter()
                    .zip(&denominators)
                    .map(|(&count, &denominator)| ((count as f64 + 1.0) / denominator).ln())
                    .collect()
            })
            .collect();

        log::info!(
            "trained naive Bayes model: {} categories, {} features, {} documents",
            catalog.len(),
            d,
            statistics.n
        );

        Ok(NaiveBayesModel {
            documents: statistics.n,
            log_priors,
            log_likelihoods,
            lookup,
            catalog,
            analyzer,
        })
    }

    /// Number of categories.
    pub fn category_count(&self) -> usize {
        self.log_priors.len()
    }

    /// Number of selected features.
    pub fn feature_count(&self) -> usize {
        self.log_likelihoods.len()
    }

    /// Number of training documents.
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Log-prior of every category, indexed by category id.
    pub fn log_priors(&self) -> &[f64] {
        &self.log_priors
    }

    /// Log-likelihood of feature `feature` given category `category`.
    pub fn log_likelihood(&self, feature: usize, category: usize) -> Option<f64> {
        self.log_likelihoods.get(feature)?.get(category).copied()
    }

    /// The likelihood table, indexed `[feature][category]`.
    pub fn log_likelihoods(&self) -> &[Vec<f64>] {
        &self.log_likelihoods
    }

    /// The token to feature id lookup.
    pub fn lookup(&self) -> &FeatureLookup {
        &self.lookup
    }

    /// The category labels.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The analyzer used at training time.
    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// Map tokens through the feature lookup.
    pub fn document(&self, tokens: Vec<String>, category: Option<usize>) -> Document {
        Document::new(tokens, &self.lookup, category)
    }

    /// Tokenize `text` with the training analyzer and map it through the
    /// feature lookup.
    pub fn encode(&self, text: &str) -> Result<Document> {
        Ok(self.document(self.analyzer.segment(text)?, None))
    }

    /// Raw log-space score of every category.
    ///
    /// Features are summed in ascending id order; ids outside the model are
    /// skipped.
    pub fn score(&self, document: &Document) -> Vec<f64> {
        let mut scores = self.log_priors.clone();
        for (feature, count) in document.features() {
            let Some(row) = self.log_likelihoods.get(feature) else {
                continue;
            };
            let count = f64::from(count);
            for (score, &likelihood) in scores.iter_mut().zip(row) {
                *score += count * likelihood;
            }
        }
        scores
    }

    /// Write the model as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer(&mut writer, &ModelSnapshot::from(self))?;
        writer.flush()?;
        log::info!("saved model to {}", path.as_ref().display());
        Ok(())
    }

    /// Read a model written by [`save`](Self::save), pairing it with
    /// `analyzer`.
    ///
    /// The analyzer should be the one the model was trained with; see
    /// [`stored_analyzer_name`](Self::stored_analyzer_name).
    pub fn load<P: AsRef<Path>>(path: P, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        let snapshot = ModelSnapshot::read(path.as_ref())?;
        if snapshot.analyzer != analyzer.name() {
            log::warn!(
                "model was trained with analyzer '{}' but is loaded with '{}'",
                snapshot.analyzer,
                analyzer.name()
            );
        }
        snapshot.into_model(analyzer)
    }

    /// Name of the analyzer recorded in a saved model.
    pub fn stored_analyzer_name<P: AsRef<Path>>(path: P) -> Result<String> {
        Ok(ModelSnapshot::read(path.as_ref())?.analyzer)
    }
}

impl std::fmt::Debug for NaiveBayesModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaiveBayesModel")
            .field("categories", &self.catalog.labels())
            .field("features", &self.feature_count())
            .field("documents", &self.documents)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

/// On-disk form of a model.
#[derive(Serialize, Deserialize)]
struct ModelSnapshot {
    analyzer: String,
    documents: usize,
    categories: Catalog,
    features: FeatureLookup,
    log_priors: Vec<f64>,
    log_likelihoods: Vec<Vec<f64>>,
}

impl ModelSnapshot {
    fn read(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn into_model(self, analyzer: Arc<dyn Analyzer>) -> Result<NaiveBayesModel> {
        let categories = self.categories.len();
        if categories == 0 || self.log_priors.len() != categories {
            return Err(TextcatError::data(format!(
                "model has {} categories but {} priors",
                categories,
                self.log_priors.len()
            )));
        }
        if self.log_likelihoods.len() != self.features.len()
            || self.log_likelihoods.iter().any(|row| row.len() != categories)
        {
            return Err(TextcatError::data(format!(
                "likelihood table does not match {} features x {} categories",
                self.features.len(),
                categories
            )));
        }

        // Log-probabilities are finite and never positive.
        let is_log_probability = |value: &f64| value.is_finite() && *value <= 0.0;
        if !self.log_priors.iter().all(is_log_probability) {
            return Err(TextcatError::data("model has a prior that is not a log-probability"));
        }
        if let Some(feature) = self
            .log_likelihoods
            .iter()
            .position(|row| !row.iter().all(is_log_probability))
        {
            return Err(TextcatError::data(format!(
                "likelihood of feature '{}' is not a log-probability",
                self.features.word(feature).unwrap_or("?")
            )));
        }

        Ok(NaiveBayesModel {
            documents: self.documents,
            log_priors: self.log_priors,
            log_likelihoods: self.log_likelihoods,
            lookup: self.features,
            catalog: self.categories,
            analyzer,
        })
    }
}

impl From<&NaiveBayesModel> for ModelSnapshot {
    fn from(model: &NaiveBayesModel) -> Self {
        ModelSnapshot {
            analyzer: model.analyzer.name().to_string(),
            documents: model.documents,
            categories: model.catalog.clone(),
            features: model.lookup.clone(),
            log_priors: model.log_priors.clone(),
            log_likelihoods: model.log_likelihoods.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::SimpleAnalyzer;
    use crate::analysis::tokenizer::WhitespaceTokenizer;
    use crate::classification::config::{FeatureSelectionConfig, Retention};
    use crate::classification::dataset::{DataSet, MemoryDataSet};
    use crate::classification::diagnostics::LogSink;
    use crate::classification::features::{ChiSquareSelector, FeatureStatistics};
    use crate::classification::vocabulary::TermIndex;

    fn analyzer() -> Arc<dyn Analyzer> {
        Arc::new(SimpleAnalyzer::new(Arc::new(WhitespaceTokenizer::new())))
    }

    fn train(documents: &[(&str, &str)]) -> (NaiveBayesModel, FeatureStatistics) {
        let mut data = MemoryDataSet::new(analyzer());
        for (category, text) in documents {
            data.add(category, text).unwrap();
        }
        let selector = ChiSquareSelector::new(FeatureSelectionConfig {
            min_score: 0.0,
            retention: Retention::All,
        })
        .unwrap();
        let selected = selector.select(&data, &LogSink).unwrap();
        let statistics = selected.statistics.clone();
        let model = NaiveBayesModel::train(selected, data.catalog().clone(), analyzer()).unwrap();
        (model, statistics)
    }

    #[test]
    fn test_priors_sum_to_one() {
        let (model, statistics) = train(&[("a", "x"), ("a", "x y"), ("a", "y"), ("b", "z")]);

        let total: f64 = model.log_priors().iter().map(|p| p.exp()).sum();
        assert!((total - 1.0).abs() < 1e-9);
        for (c, &count) in statistics.category_counts.iter().enumerate() {
            assert_eq!(model.log_priors()[c], (count as f64 / 4.0).ln());
        }
    }

    #[test]
    fn test_likelihoods_are_smoothed_exactly() {
        let (model, statistics) = train(&[("a", "x x y"), ("a", "x"), ("b", "z"), ("b", "w z")]);
        let d = model.feature_count();

        for c in 0..model.category_count() {
            let sum: u32 = statistics.joint_counts.iter().map(|row| row[c]).sum();
            for (f, row) in statistics.joint_counts.iter().enumerate() {
                let expected = ((row[c] as f64 + 1.0) / (sum as f64 + d as f64)).ln();
                let actual = model.log_likelihood(f, c).unwrap();
                assert_eq!(actual, expected);
                assert!(actual.is_finite());
                assert!(actual < 0.0);
            }
        }
    }

    #[test]
    fn test_unseen_pair_is_finite() {
        let (model, statistics) = train(&[("a", "x"), ("b", "z")]);
        let x = model.lookup().term_id("x").unwrap();
        let s_b: u32 = statistics.joint_counts.iter().map(|row| row[1]).sum();

        let expected = (1.0 / (s_b as f64 + model.feature_count() as f64)).ln();
        assert_eq!(model.log_likelihood(x, 1), Some(expected));
    }

    #[test]
    fn test_score_is_deterministic_and_skips_unknown_ids() {
        let (model, _) = train(&[("a", "x y"), ("a", "x y"), ("b", "z w"), ("b", "z w")]);
        let document = model.encode("x x z unknown").unwrap();

        let first = model.score(&document);
        let second = model.score(&document);
        assert_eq!(first, second);

        let mut foreign = document.clone();
        foreign.term_frequencies.insert(10_000, 3);
        assert_eq!(model.score(&foreign), first);
    }

    #[test]
    fn test_save_and_load() {
        let (model, _) = train(&[("a", "x y"), ("b", "z w")]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        model.save(&path).unwrap();
        assert_eq!(NaiveBayesModel::stored_analyzer_name(&path).unwrap(), "whitespace");

        let loaded = NaiveBayesModel::load(&path, analyzer()).unwrap();
        assert_eq!(loaded.log_priors(), model.log_priors());
        assert_eq!(loaded.log_likelihoods(), model.log_likelihoods());
        assert_eq!(loaded.catalog(), model.catalog());
        assert_eq!(loaded.lookup(), model.lookup());

        let document = loaded.encode("x w").unwrap();
        assert_eq!(loaded.score(&document), model.score(&document));
    }

    #[test]
    fn test_load_rejects_positive_likelihood() {
        let (model, _) = train(&[("a", "x y"), ("b", "z w")]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        model.save(&path).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        json["log_likelihoods"][0][1] = serde_json::json!(0.5);
        std::fs::write(&path, json.to_string()).unwrap();

        let err = NaiveBayesModel::load(&path, analyzer()).unwrap_err();
        assert!(matches!(err, TextcatError::Data(_)));
    }
}
