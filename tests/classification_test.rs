use std::fs;
use std::path::Path;
use std::sync::Arc;

use textcat::analysis::analyzer::{Analyzer, SimpleAnalyzer};
use textcat::analysis::tokenizer::WhitespaceTokenizer;
use textcat::classification::diagnostics::{
    FEATURES_BY_CATEGORY_FILE, MISCLASSIFIED_FILE, SELECTED_FEATURES_FILE,
};
use parking_lot::Mutex;
use textcat::classification::diagnostics::{FeatureDump, Misclassification};
use textcat::classification::{
    CHI_SQUARE_CRITICAL_P001, Classifier, ClassifierConfig, DataSet, DiagnosticSink,
    FeatureSelectionConfig, FileDataSet, FileSink, MemoryDataSet, NaiveBayesClassifier,
    Retention, evaluate,
};
use textcat::error::TextcatError;
use tempfile::tempdir;

fn whitespace() -> Arc<dyn Analyzer> {
    Arc::new(SimpleAnalyzer::new(Arc::new(WhitespaceTokenizer::new())))
}

fn write_corpus(root: &Path, categories: &[(&str, &[&str])]) {
    for (label, documents) in categories {
        let dir = root.join(label);
        fs::create_dir_all(&dir).unwrap();
        for (i, text) in documents.iter().enumerate() {
            fs::write(dir.join(format!("{i:04}.txt")), text).unwrap();
        }
    }
}

fn two_categories() -> MemoryDataSet {
    let mut data = MemoryDataSet::new(whitespace());
    data.add("A", "x y").unwrap();
    data.add("A", "y x x").unwrap();
    data.add("B", "z w").unwrap();
    data.add("B", "w w z").unwrap();
    data
}

#[test]
fn test_end_to_end_two_categories() {
    let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    classifier.train(&two_categories()).unwrap();

    let ranking = classifier.label("x").unwrap();
    assert_eq!(ranking[0].0, "A");
    assert_eq!(ranking[1].0, "B");

    // Equal priors and no known feature: the tie goes to the first category.
    let ranking = classifier.label("never-seen").unwrap();
    assert_eq!(ranking[0].1, ranking[1].1);
    assert_eq!(ranking[0].0, "A");
}

#[test]
fn test_zero_sample_category_is_data_error() {
    let mut data = two_categories();
    data.add_category("C");

    let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    let err = classifier.train(&data).unwrap_err();
    assert!(matches!(err, TextcatError::Data(_)));
    assert!(!classifier.is_trained());
}

#[test]
fn test_untrained_use_is_invalid_state() {
    let classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();

    assert!(matches!(classifier.predict("x"), Err(TextcatError::InvalidState(_))));
    assert!(matches!(
        classifier.evaluate(&two_categories(), 0.0),
        Err(TextcatError::InvalidState(_))
    ));
}

#[test]
fn test_load_dir_split_and_evaluate() {
    let dir = tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            (
                "finance",
                &["stock market", "bond market", "stock bond", "market yield"],
            ),
            ("sports", &["goal team", "team match", "goal match", "match team"]),
        ],
    );

    let mut train = MemoryDataSet::new(whitespace());
    assert_eq!(train.load_dir(dir.path(), 0.75).unwrap(), 6);
    let mut test = MemoryDataSet::new(whitespace());
    assert_eq!(test.load_dir(dir.path(), -0.25).unwrap(), 2);

    let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    classifier.train(&train).unwrap();

    let result = classifier.evaluate(&test, 0.0).unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(result.categories, vec!["finance", "sports"]);
    assert_eq!(result.overall_accuracy, 1.0);
    assert_eq!(result.macro_f1, 1.0);
}

#[test]
fn test_zero_threshold_accuracy_is_fraction_correct() {
    let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    classifier.train(&two_categories()).unwrap();

    let mut test = MemoryDataSet::new(whitespace());
    test.add("A", "x").unwrap();
    test.add("A", "w w").unwrap();
    test.add("B", "z").unwrap();
    test.add("B", "never-seen").unwrap();

    let mut correct = 0;
    for document in test.documents() {
        let label = test.catalog().label(document.category.unwrap()).unwrap();
        if classifier.classify(&document.text()).unwrap() == label {
            correct += 1;
        }
    }

    let result = classifier.evaluate(&test, 0.0).unwrap();
    assert_eq!(correct, 2);
    assert_eq!(result.overall_accuracy, correct as f64 / 4.0);
}

#[test]
fn test_unknown_held_out_label_is_data_error() {
    let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    classifier.train(&two_categories()).unwrap();

    let mut test = MemoryDataSet::new(whitespace());
    test.add("Z", "x").unwrap();
    assert!(matches!(
        classifier.evaluate(&test, 0.0),
        Err(TextcatError::Data(_))
    ));
}

#[test]
fn test_file_sink_dumps() {
    let dump = tempdir().unwrap();
    let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default())
        .unwrap()
        .with_sink(Arc::new(FileSink::new(dump.path())));
    classifier.train(&two_categories()).unwrap();

    let selected = fs::read_to_string(dump.path().join(SELECTED_FEATURES_FILE)).unwrap();
    assert_eq!(selected, "w\nx\ny\nz\n");
    let by_category = fs::read_to_string(dump.path().join(FEATURES_BY_CATEGORY_FILE)).unwrap();
    assert!(by_category.starts_with("A : \n"));

    let mut test = MemoryDataSet::new(whitespace());
    test.add("A", "w z").unwrap();
    test.add("B", "z").unwrap();
    classifier.evaluate(&test, 0.0).unwrap();

    let log = fs::read_to_string(dump.path().join(MISCLASSIFIED_FILE)).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "predict\tactual\ttext\tscore");
    assert!(lines[1].starts_with("B\tA\tw z\t"));
}

#[test]
fn test_file_backed_training_matches_memory() {
    let mut memory = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    memory.train(&two_categories()).unwrap();

    let mut data = FileDataSet::new(whitespace()).unwrap();
    data.add("A", "x y").unwrap();
    data.add("A", "y x x").unwrap();
    data.add("B", "z w").unwrap();
    data.add("B", "w w z").unwrap();
    let mut file = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    file.train(&data).unwrap();

    assert_eq!(
        memory.model().unwrap().log_likelihoods(),
        file.model().unwrap().log_likelihoods()
    );
    assert_eq!(memory.scores("x z w").unwrap(), file.scores("x z w").unwrap());
}

#[test]
fn test_saved_model_predicts_identically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");

    let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    classifier.train(&two_categories()).unwrap();
    classifier.save(&path).unwrap();

    let loaded = NaiveBayesClassifier::load(&path, whitespace(), ClassifierConfig::default()).unwrap();
    assert_eq!(loaded.scores("x w y").unwrap(), classifier.scores("x w y").unwrap());
    assert_eq!(loaded.classify("w").unwrap(), "B");
}

#[test]
fn test_load_dir_skips_category_with_empty_split() {
    let dir = tempdir().unwrap();
    let big: Vec<String> = (0..10).map(|i| format!("alpha beta{i}")).collect();
    let big: Vec<&str> = big.iter().map(String::as_str).collect();
    write_corpus(dir.path(), &[("big", big.as_slice()), ("small", &["gamma"][..])]);
    fs::create_dir_all(dir.path().join("empty")).unwrap();

    let mut train = MemoryDataSet::new(whitespace());
    assert_eq!(train.load_dir(dir.path(), 0.9).unwrap(), 9);
    assert_eq!(train.catalog().labels(), &["big".to_string()]);

    let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    classifier.train(&train).unwrap();
    assert_eq!(classifier.classify("alpha").unwrap(), "big");
}

#[test]
fn test_critical_min_score_keeps_separable_features() {
    let mut data = MemoryDataSet::new(whitespace());
    for _ in 0..4 {
        data.add("A", "x").unwrap();
        data.add("B", "z").unwrap();
    }

    let config = ClassifierConfig {
        feature_selection: FeatureSelectionConfig {
            min_score: CHI_SQUARE_CRITICAL_P001,
            retention: Retention::All,
        },
        ..ClassifierConfig::default()
    };
    let mut classifier = NaiveBayesClassifier::new(config).unwrap();
    classifier.train(&data).unwrap();

    assert_eq!(classifier.model().unwrap().lookup().len(), 2);
    let ranking = classifier.label("x").unwrap();
    assert_eq!(ranking[0].0, "A");
    assert!(ranking[0].1 > ranking[1].1);
}

#[derive(Default)]
struct RecordingSink {
    misclassified: Mutex<Vec<Vec<String>>>,
}

impl DiagnosticSink for RecordingSink {
    fn selected_features(&self, _dump: &FeatureDump) -> std::io::Result<()> {
        Ok(())
    }

    fn misclassified(&self, record: &Misclassification) -> std::io::Result<()> {
        self.misclassified.lock().push(record.tokens.clone());
        Ok(())
    }
}

#[test]
fn test_misclassifications_arrive_in_corpus_order() {
    let mut classifier = NaiveBayesClassifier::new(ClassifierConfig::default()).unwrap();
    classifier.train(&two_categories()).unwrap();

    let mut test = MemoryDataSet::new(whitespace());
    let mut expected = Vec::new();
    for i in 0..200 {
        let marker = format!("t{i}");
        test.add("A", &format!("z {marker}")).unwrap();
        expected.push(vec!["z".to_string(), marker]);
    }

    let sink = RecordingSink::default();
    let result = evaluate(&classifier, &test, 0.0, &sink).unwrap();
    assert_eq!(result.total, 200);
    assert_eq!(*sink.misclassified.lock(), expected);
}
