//! Command implementations for the textcat CLI.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::analysis::analyzer_by_name;
use crate::classification::{
    Classifier, ClassifierConfig, DataSet, FileDataSet, FileSink, MemoryDataSet,
    NaiveBayesClassifier, NaiveBayesModel,
};
use crate::cli::args::*;
use crate::cli::output::*;

/// Execute a CLI command.
pub fn execute_command(args: TextcatArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args, &args),
        Command::Predict(predict_args) => predict(predict_args, &args),
        Command::Evaluate(evaluate_args) => evaluate(evaluate_args, &args),
    }
}

fn load_config(path: Option<&Path>) -> Result<ClassifierConfig> {
    match path {
        Some(path) => ClassifierConfig::from_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => Ok(ClassifierConfig::default()),
    }
}

/// Load a model together with the analyzer it was trained with.
fn load_classifier(model: &Path, config: ClassifierConfig) -> Result<NaiveBayesClassifier> {
    let name = NaiveBayesModel::stored_analyzer_name(model)
        .with_context(|| format!("failed to read model {}", model.display()))?;
    let analyzer = analyzer_by_name(&name)
        .with_context(|| format!("model {} uses an unsupported analyzer", model.display()))?;

    NaiveBayesClassifier::load(model, analyzer, config)
        .with_context(|| format!("failed to load model {}", model.display()))
}

/// Train a model and save it.
fn train(args: &TrainArgs, cli_args: &TextcatArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(args.config.as_deref())?;
    let analyzer = analyzer_by_name(&args.analyzer)?;

    let mut data: Box<dyn DataSet> = if args.file_backed {
        Box::new(FileDataSet::new(analyzer).context("failed to create the document cache")?)
    } else {
        Box::new(MemoryDataSet::new(analyzer))
    };
    data.load_dir(&args.corpus, args.rate)
        .with_context(|| format!("failed to load corpus {}", args.corpus.display()))?;

    let mut classifier = NaiveBayesClassifier::new(config)?;
    if let Some(dir) = &args.dump_dir {
        classifier = classifier.with_sink(Arc::new(FileSink::new(dir)));
    }
    classifier.train(data.as_ref()).context("training failed")?;
    classifier
        .save(&args.model)
        .with_context(|| format!("failed to save model {}", args.model.display()))?;

    let model = classifier.model()?;
    output_result(
        &TrainingSummary {
            model: args.model.to_string_lossy().to_string(),
            analyzer: args.analyzer.clone(),
            documents: model.documents(),
            categories: model.catalog().labels().to_vec(),
            features: model.feature_count(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )?;
    Ok(())
}

/// Classify a text.
fn predict(args: &PredictArgs, cli_args: &TextcatArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let classifier = load_classifier(&args.model, config)?;

    let text = args.joined_text();
    let min_score = args.min_score.unwrap_or_else(|| classifier.min_score());
    let predictions = classifier
        .predict_top_above(&text, args.top, min_score)?
        .into_iter()
        .map(|(label, score)| ScoredLabel { label, score })
        .collect();

    output_result(&PredictionResults { text, predictions }, cli_args)?;
    Ok(())
}

/// Evaluate a model on a held-out corpus.
fn evaluate(args: &EvaluateArgs, cli_args: &TextcatArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut classifier = load_classifier(&args.model, config)?;
    if let Some(dir) = &args.dump_dir {
        classifier = classifier.with_sink(Arc::new(FileSink::new(dir)));
    }

    let mut data = MemoryDataSet::new(Arc::clone(classifier.model()?.analyzer()));
    data.load_dir(&args.corpus, args.rate)
        .with_context(|| format!("failed to load corpus {}", args.corpus.display()))?;

    let result = classifier
        .evaluate(&data, args.threshold)
        .context("evaluation failed")?;
    output_result(&result, cli_args)?;
    Ok(())
}
