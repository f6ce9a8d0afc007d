//! Chi-square feature selection.
//!
//! Training counts are collected over the raw lexicon, every feature is
//! scored by its strongest chi-square dependence on any one category, and
//! the best features are renumbered densely into a frozen
//! [`FeatureLookup`].
//!
//! Joint counts are document frequencies: a document contributes at most one
//! to the count of each feature it contains, whatever the token repeats.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::FeatureSelectionConfig;
use super::dataset::DataSet;
use super::diagnostics::{DiagnosticSink, FeatureDump, best_effort};
use super::document::Document;
use super::vocabulary::{Catalog, Lexicon, SymbolTable, TermIndex};
use crate::error::{Result, TextcatError};

/// Critical chi-square value for one degree of freedom at p = 0.001.
pub const CHI_SQUARE_CRITICAL_P001: f64 = 10.83;

/// Document counts collected from a training corpus.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureStatistics {
    /// Number of training documents.
    pub n: usize,

    /// Documents per category.
    pub category_counts: Vec<usize>,

    /// `joint_counts[f][c]`: documents of category `c` containing feature `f`.
    pub joint_counts: Vec<Vec<u32>>,
}

impl FeatureStatistics {
    /// Zeroed counts for `categories` categories and `features` features.
    pub fn new(categories: usize, features: usize) -> Self {
        FeatureStatistics {
            n: 0,
            category_counts: vec![0; categories],
            joint_counts: vec![vec![0; categories]; features],
        }
    }

    /// Count every document of `data`, spreading the work over the current
    /// rayon pool.
    pub fn collect(data: &dyn DataSet) -> Result<Self> {
        let categories = data.catalog().len();
        let features = data.lexicon().len();
        let empty = || FeatureStatistics::new(categories, features);

        data.iter()?
            .par_bridge()
            .try_fold(empty, |mut stats, document| {
                stats.add_document(&document?)?;
                Ok::<_, TextcatError>(stats)
            })
            .try_reduce(empty, |left, right| Ok(left.merge(right)))
    }

    /// Count one labeled document.
    pub fn add_document(&mut self, document: &Document) -> Result<()> {
        let category = document
            .category
            .ok_or_else(|| TextcatError::data("training document has no category"))?;
        if category >= self.category_counts.len() {
            return Err(TextcatError::data(format!(
                "training document has unknown category id {category}"
            )));
        }

        self.n += 1;
        self.category_counts[category] += 1;
        for (feature, _) in document.features() {
            let row = self.joint_counts.get_mut(feature).ok_or_else(|| {
                TextcatError::data(format!("training document has unknown feature id {feature}"))
            })?;
            row[category] += 1;
        }
        Ok(())
    }

    /// Add the counts of `other`, which must have the same shape.
    pub fn merge(mut self, other: FeatureStatistics) -> Self {
        self.n += other.n;
        for (count, added) in self.category_counts.iter_mut().zip(other.category_counts) {
            *count += added;
        }
        for (row, added) in self.joint_counts.iter_mut().zip(other.joint_counts) {
            for (count, added) in row.iter_mut().zip(added) {
                *count += added;
            }
        }
        self
    }

    /// Number of categories.
    pub fn category_count(&self) -> usize {
        self.category_counts.len()
    }

    /// Number of features.
    pub fn feature_count(&self) -> usize {
        self.joint_counts.len()
    }

    /// Fail with a data error when the counts cannot support training: an
    /// empty corpus or a category without any document.
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if self.n == 0 || self.category_counts.is_empty() {
            return Err(TextcatError::data("training data set is empty"));
        }
        if let Some(category) = self.category_counts.iter().position(|&count| count == 0) {
            return Err(TextcatError::data(format!(
                "category '{}' has no training samples",
                catalog.label(category).unwrap_or("?")
            )));
        }
        Ok(())
    }

    /// The best chi-square score of every feature over all categories.
    pub fn chi_square_scores(&self) -> Vec<f64> {
        let n = self.n as f64;
        self.joint_counts
            .par_iter()
            .map(|row| {
                let feature_docs: f64 = row.iter().map(|&count| count as f64).sum();
                row.iter()
                    .zip(&self.category_counts)
                    .map(|(&joint, &category_docs)| {
                        let a = joint as f64;
                        let b = feature_docs - a;
                        let c = category_docs as f64 - a;
                        let d = n - a - b - c;
                        chi_square(a, b, c, d)
                    })
                    .fold(0.0, f64::max)
            })
            .collect()
    }
}

/// Chi-square statistic of a 2x2 contingency table.
///
/// `a`: feature present, in category. `b`: present, outside. `c`: absent,
/// in category. `d`: absent, outside. A table with an empty row or column
/// scores 0.
pub fn chi_square(a: f64, b: f64, c: f64, d: f64) -> f64 {
    let denominator = (a + b) * (c + d) * (a + c) * (b + d);
    if denominator == 0.0 {
        return 0.0;
    }
    let cross = a * d - b * c;
    (a + b + c + d) * cross * cross / denominator
}

/// Frozen token to selected-feature mapping of a trained model.
///
/// Serialized as the list of selected tokens in feature id order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureLookup {
    table: SymbolTable,
}

impl FeatureLookup {
    /// The token of feature `id`.
    pub fn word(&self, id: usize) -> Option<&str> {
        self.table.symbol(id)
    }

    /// All tokens in feature id order.
    pub fn words(&self) -> &[String] {
        self.table.symbols()
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if no feature was selected.
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}

impl TermIndex for FeatureLookup {
    fn term_id(&self, term: &str) -> Option<usize> {
        self.table.id(term)
    }
}

impl From<Vec<String>> for FeatureLookup {
    fn from(words: Vec<String>) -> Self {
        FeatureLookup {
            table: SymbolTable::from(words),
        }
    }
}

impl From<FeatureLookup> for Vec<String> {
    fn from(lookup: FeatureLookup) -> Self {
        lookup.table.symbols().to_vec()
    }
}

/// Builds a [`FeatureLookup`] one feature at a time.
#[derive(Debug, Default)]
pub struct FeatureLookupBuilder {
    table: SymbolTable,
}

impl FeatureLookupBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token, returning its feature id.
    pub fn add(&mut self, word: &str) -> usize {
        self.table.intern(word)
    }

    /// Freeze the mapping.
    pub fn build(self) -> FeatureLookup {
        FeatureLookup { table: self.table }
    }
}

/// The outcome of feature selection.
#[derive(Clone, Debug)]
pub struct SelectedFeatures {
    /// Counts restricted to the selected features, renumbered in rank order.
    pub statistics: FeatureStatistics,

    /// Selected token to feature id.
    pub lookup: FeatureLookup,

    /// Chi-square score of each selected feature.
    pub scores: Vec<f64>,

    /// Number of features before selection.
    pub candidates: usize,
}

/// Ranks features by chi-square score and keeps the best ones.
///
/// Features scoring below `min_score` are dropped, the rest are ranked by
/// descending score with ties broken by ascending raw id, and the
/// [`Retention`](super::config::Retention) policy decides how many of them
/// are kept. If no feature reaches `min_score`, every feature is ranked
/// instead.
#[derive(Clone, Debug, Default)]
pub struct ChiSquareSelector {
    config: FeatureSelectionConfig,
}

impl ChiSquareSelector {
    /// Create a selector, rejecting invalid settings.
    pub fn new(config: FeatureSelectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(ChiSquareSelector { config })
    }

    /// The selection settings.
    pub fn config(&self) -> &FeatureSelectionConfig {
        &self.config
    }

    /// Collect counts from `data` and select its features.
    pub fn select(&self, data: &dyn DataSet, sink: &dyn DiagnosticSink) -> Result<SelectedFeatures> {
        let statistics = FeatureStatistics::collect(data)?;
        self.select_from(statistics, data.lexicon(), data.catalog(), sink)
    }

    /// Select features from already collected counts.
    pub fn select_from(
        &self,
        statistics: FeatureStatistics,
        lexicon: &Lexicon,
        catalog: &Catalog,
        sink: &dyn DiagnosticSink,
    ) -> Result<SelectedFeatures> {
        statistics.validate(catalog)?;
        let candidates = statistics.feature_count();

        let scores = statistics.chi_square_scores();
        let mut ranked: Vec<usize> = (0..candidates)
            .filter(|&feature| scores[feature] >= self.config.min_score)
            .collect();
        if ranked.is_empty() && candidates > 0 {
            log::warn!(
                "no feature reached min_score = {}; ranking all {candidates} features instead",
                self.config.min_score
            );
            ranked = (0..candidates).collect();
        }
        ranked.sort_by(|&x, &y| scores[y].total_cmp(&scores[x]).then(x.cmp(&y)));
        ranked.truncate(self.config.retention.keep(ranked.len()));

        let mut builder = FeatureLookupBuilder::new();
        let mut joint_counts = Vec::with_capacity(ranked.len());
        let mut selected_scores = Vec::with_capacity(ranked.len());
        for &feature in &ranked {
            let word = lexicon.word(feature).ok_or_else(|| {
                TextcatError::data(format!("feature id {feature} is missing from the lexicon"))
            })?;
            builder.add(word);
            joint_counts.push(statistics.joint_counts[feature].clone());
            selected_scores.push(scores[feature]);
        }
        let lookup = builder.build();

        let statistics = FeatureStatistics {
            n: statistics.n,
            category_counts: statistics.category_counts,
            joint_counts,
        };

        let percent = if candidates == 0 {
            0.0
        } else {
            100.0 * lookup.len() as f64 / candidates as f64
        };
        sink.progress(&format!(
            "selected {} of {} features ({percent:.2}%)",
            lookup.len(),
            candidates
        ));
        best_effort(
            "selected features",
            sink.selected_features(&feature_dump(&statistics, &lookup, catalog)),
        );

        Ok(SelectedFeatures {
            statistics,
            lookup,
            scores: selected_scores,
            candidates,
        })
    }
}

fn feature_dump(statistics: &FeatureStatistics, lookup: &FeatureLookup, catalog: &Catalog) -> FeatureDump {
    let mut selected = lookup.words().to_vec();
    selected.sort();

    let by_category = catalog
        .labels()
        .iter()
        .enumerate()
        .map(|(category, label)| {
            let words = lookup
                .words()
                .iter()
                .zip(&statistics.joint_counts)
                .filter(|(_, row)| row[category] > 0)
                .map(|(word, _)| word.clone())
                .collect();
            (label.clone(), words)
        })
        .collect();

    FeatureDump { selected, by_category }
}
