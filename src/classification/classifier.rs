//! Classifier trait and the naive Bayes classifier.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use super::config::{ClassifierConfig, DEFAULT_MIN_SCORE};
use super::dataset::DataSet;
use super::diagnostics::{DiagnosticSink, LogSink};
use super::document::Document;
use super::evaluation::{self, EvaluationResult};
use super::features::ChiSquareSelector;
use super::model::NaiveBayesModel;
use super::scoring;
use super::vocabulary::Catalog;
use crate::analysis::analyzer::Analyzer;
use crate::error::{Result, TextcatError};

/// A trainable single-label text classifier.
///
/// Implementors provide training, tokenization and per-category scoring;
/// the label-level entry points are built on top of them.
pub trait Classifier: Send + Sync {
    /// Train on a labeled data set, replacing any previous model.
    fn train(&mut self, data: &dyn DataSet) -> Result<()>;

    /// Score every category for a document encoded with
    /// [`document`](Self::document), indexed by category id.
    fn categorize(&self, document: &Document) -> Result<Vec<f64>>;

    /// Encode tokens with the trained feature lookup.
    fn document(&self, tokens: Vec<String>) -> Result<Document>;

    /// Tokenize text the way the training data was tokenized.
    fn segment(&self, text: &str) -> Result<Vec<String>>;

    /// The labels of the trained categories.
    fn catalog(&self) -> Result<&Catalog>;

    /// Get the name of this classifier for debugging and logging.
    fn name(&self) -> &str;

    /// Default threshold of [`predict_top`](Self::predict_top).
    fn min_score(&self) -> f64 {
        DEFAULT_MIN_SCORE
    }

    /// Score every category for raw text.
    fn scores(&self, text: &str) -> Result<Vec<f64>> {
        let document = self.document(self.segment(text)?)?;
        self.categorize(&document)
    }

    /// Score of every category, keyed by label.
    fn predict(&self, text: &str) -> Result<BTreeMap<String, f64>> {
        let scores = self.scores(text)?;
        let catalog = self.catalog()?;
        Ok(catalog.labels().iter().cloned().zip(scores).collect())
    }

    /// Every category with its score, best first. Ties are ordered by
    /// ascending category id.
    fn label(&self, text: &str) -> Result<Vec<(String, f64)>> {
        let scores = self.scores(text)?;
        labeled(self.catalog()?, scoring::rank(&scores))
    }

    /// The label of the best category.
    fn classify(&self, text: &str) -> Result<String> {
        let scores = self.scores(text)?;
        let (category, _) = scoring::best(&scores)
            .ok_or_else(|| TextcatError::invalid_state("classifier has no category"))?;
        label_of(self.catalog()?, category)
    }

    /// At most `n` best categories scoring at least
    /// [`min_score`](Self::min_score).
    fn predict_top(&self, text: &str, n: usize) -> Result<Vec<(String, f64)>> {
        self.predict_top_above(text, n, self.min_score())
    }

    /// At most `n` best categories scoring at least `min_score`.
    fn predict_top_above(&self, text: &str, n: usize, min_score: f64) -> Result<Vec<(String, f64)>> {
        if min_score.is_nan() {
            return Err(TextcatError::invalid_argument("min_score must not be NaN"));
        }
        let scores = self.scores(text)?;
        labeled(self.catalog()?, scoring::rank_top(&scores, n, min_score))
    }
}

fn label_of(catalog: &Catalog, category: usize) -> Result<String> {
    catalog
        .label(category)
        .map(str::to_string)
        .ok_or_else(|| TextcatError::invalid_state(format!("no label for category id {category}")))
}

fn labeled(catalog: &Catalog, ranked: Vec<(usize, f64)>) -> Result<Vec<(String, f64)>> {
    ranked
        .into_iter()
        .map(|(category, score)| Ok((label_of(catalog, category)?, score)))
        .collect()
}

/// Multinomial naive Bayes classifier with chi-square feature selection.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use textcat::analysis::analyzer::SimpleAnalyzer;
/// use textcat::analysis::tokenizer::WhitespaceTokenizer;
/// use textcat::classification::{
///     Classifier, ClassifierConfig, DataSet, MemoryDataSet, NaiveBayesClassifier,
/// };
///
/// let analyzer = Arc::new(SimpleAnalyzer::new(Arc::new(WhitespaceTokenizer::new())));
/// let mut data = MemoryDataSet::new(analyzer);
/// data.add("fruit", "apple banana cherry").unwrap();
/// data.add("fruit", "banana apple").unwrap();
/// data.add("vehicle", "car truck bus").unwrap();
/// data.add("vehicle", "bus car").unwrap();
///
/// let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
/// classifier.train(&data).unwrap();
///
/// assert_eq!(classifier.classify("apple apple car").unwrap(), "fruit");
/// ```
pub struct NaiveBayesClassifier {
    config: ClassifierConfig,
    model: Option<NaiveBayesModel>,
    pool: Option<Arc<ThreadPool>>,
    sink: Arc<dyn DiagnosticSink>,
}

impl NaiveBayesClassifier {
    /// Create an untrained classifier.
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;

        let pool = match config.num_threads {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("textcat-{i}"))
                    .build()
                    .map_err(|e| {
                        TextcatError::invalid_argument(format!("failed to create thread pool: {e}"))
                    })?;
                Some(Arc::new(pool))
            }
            None => None,
        };

        Ok(NaiveBayesClassifier {
            config,
            model: None,
            pool,
            sink: Arc::new(LogSink),
        })
    }

    /// Wrap an already trained model.
    pub fn with_model(config: ClassifierConfig, model: NaiveBayesModel) -> Result<Self> {
        let mut classifier = Self::new(config)?;
        classifier.model = Some(model);
        Ok(classifier)
    }

    /// Load a saved model.
    pub fn load<P: AsRef<Path>>(path: P, analyzer: Arc<dyn Analyzer>, config: ClassifierConfig) -> Result<Self> {
        Self::with_model(config, NaiveBayesModel::load(path, analyzer)?)
    }

    /// Send progress and diagnostic records to `sink` instead of the log.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// The trained model.
    pub fn model(&self) -> Result<&NaiveBayesModel> {
        self.model.as_ref().ok_or_else(TextcatError::untrained)
    }

    /// Check if a model is available.
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Save the trained model.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.model()?.save(path)
    }

    /// Evaluate the trained model on a labeled held-out data set.
    ///
    /// Predictions scoring below `threshold` are rejected; see
    /// [`evaluate`](evaluation::evaluate).
    pub fn evaluate(&self, data: &dyn DataSet, threshold: f64) -> Result<EvaluationResult> {
        self.model()?;
        let sink = self.sink.as_ref();
        self.install(|| evaluation::evaluate(self, data, threshold, sink))
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Classifier for NaiveBayesClassifier {
    fn train(&mut self, data: &dyn DataSet) -> Result<()> {
        let selector = ChiSquareSelector::new(self.config.feature_selection.clone())?;
        let sink = self.sink.as_ref();
        sink.progress(&format!(
            "training on {} documents in {} categories, {} distinct tokens",
            data.len(),
            data.catalog().len(),
            data.lexicon().len()
        ));

        let model = self.install(|| {
            let selected = selector.select(data, sink)?;
            NaiveBayesModel::train(selected, data.catalog().clone(), Arc::clone(data.analyzer()))
        })?;

        sink.progress(&format!(
            "trained model with {} features over {} categories",
            model.feature_count(),
            model.category_count()
        ));
        self.model = Some(model);
        Ok(())
    }

    fn categorize(&self, document: &Document) -> Result<Vec<f64>> {
        let mut scores = self.model()?.score(document);
        if self.config.probability {
            scoring::softmax(&mut scores);
        }
        Ok(scores)
    }

    fn document(&self, tokens: Vec<String>) -> Result<Document> {
        Ok(self.model()?.document(tokens, None))
    }

    fn segment(&self, text: &str) -> Result<Vec<String>> {
        self.model()?.analyzer().segment(text)
    }

    fn catalog(&self) -> Result<&Catalog> {
        Ok(self.model()?.catalog())
    }

    fn name(&self) -> &str {
        "naive_bayes"
    }

    fn min_score(&self) -> f64 {
        self.config.min_score
    }
}

impl std::fmt::Debug for NaiveBayesClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaiveBayesClassifier")
            .field("config", &self.config)
            .field("model", &self.model)
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::SimpleAnalyzer;
    use crate::analysis::tokenizer::WhitespaceTokenizer;
    use crate::classification::dataset::MemoryDataSet;

    fn data() -> MemoryDataSet {
        let analyzer = Arc::new(SimpleAnalyzer::new(Arc::new(WhitespaceTokenizer::new())));
        let mut data = MemoryDataSet::new(analyzer);
        data.add("A", "x y").unwrap();
        data.add("A", "y x").unwrap();
        data.add("B", "z w").unwrap();
        data.add("B", "w z").unwrap();
        data
    }

    fn trained(config: ClassifierConfig) -> NaiveBayesClassifier {
        let mut classifier = NaiveBayesClassifier::new(config).unwrap();
        classifier.train(&data()).unwrap();
        classifier
    }

    #[test]
    fn test_untrained_classifier_is_invalid_state() {
        let classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
        assert!(!classifier.is_trained());
        assert!(matches!(
            classifier.classify("x"),
            Err(TextcatError::InvalidState(_))
        ));
        assert!(matches!(
            classifier.categorize(&Document::default()),
            Err(TextcatError::InvalidState(_))
        ));
    }

    #[test]
    fn test_own_vocabulary_wins() {
        let classifier = trained(ClassifierConfig::default());

        let ranking = classifier.label("x").unwrap();
        assert_eq!(ranking[0].0, "A");
        assert!(ranking[0].1 > ranking[1].1);
        assert_eq!(classifier.classify("w z").unwrap(), "B");
    }

    #[test]
    fn test_unseen_token_ties_on_priors() {
        let classifier = trained(ClassifierConfig {
            probability: false,
            ..ClassifierConfig::default()
        });

        let ranking = classifier.label("unseen").unwrap();
        assert_eq!(ranking[0].1, ranking[1].1);
        assert_eq!(ranking[0].1, 0.5f64.ln());
        assert_eq!(ranking[0].0, "A");
        assert_eq!(classifier.classify("unseen").unwrap(), "A");
    }

    #[test]
    fn test_normalized_predictions() {
        let classifier = trained(ClassifierConfig::default());

        let predictions = classifier.predict("x z z").unwrap();
        let sum: f64 = predictions.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(predictions["B"] > predictions["A"]);
    }

    #[test]
    fn test_predict_top() {
        let classifier = trained(ClassifierConfig::default());

        let top = classifier.predict_top("x x x", 1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, "A");

        assert!(classifier.predict_top_above("x", 2, 1.1).unwrap().is_empty());
        assert!(matches!(
            classifier.predict_top_above("x", 2, f64::NAN),
            Err(TextcatError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_dedicated_pool() {
        let classifier = trained(ClassifierConfig {
            num_threads: Some(2),
            ..ClassifierConfig::default()
        });
        assert_eq!(classifier.classify("y").unwrap(), "A");
    }

    #[test]
    fn test_scoring_is_reproducible() {
        let classifier = trained(ClassifierConfig::default());
        let document = classifier
            .document(vec!["x".to_string(), "w".to_string(), "x".to_string()])
            .unwrap();

        let first = classifier.categorize(&document).unwrap();
        let second = classifier.categorize(&document).unwrap();
        assert_eq!(first, second);
    }
}
