//! Command line argument parsing for the textcat CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// textcat - naive Bayes text classification
#[derive(Parser, Debug, Clone)]
#[command(name = "textcat")]
#[command(about = "Train, apply and evaluate naive Bayes text classifiers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TextcatArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TextcatArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model from a corpus directory
    Train(TrainArgs),

    /// Classify a text with a trained model
    Predict(PredictArgs),

    /// Evaluate a trained model on a labeled corpus directory
    Evaluate(EvaluateArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Corpus directory: one sub-directory per category, one file per document
    #[arg(long, value_name = "DIR")]
    pub corpus: PathBuf,

    /// Output model file
    #[arg(long, value_name = "FILE")]
    pub model: PathBuf,

    /// Fraction of each category to load; negative takes the trailing part
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    pub rate: f64,

    /// Analyzer used to tokenize documents
    #[arg(long, default_value = "whitespace")]
    pub analyzer: String,

    /// Classifier configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory receiving the selected feature dumps
    #[arg(long, value_name = "DIR")]
    pub dump_dir: Option<PathBuf>,

    /// Cache documents on disk instead of in memory
    #[arg(long)]
    pub file_backed: bool,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Model file written by `train`
    #[arg(long, value_name = "FILE")]
    pub model: PathBuf,

    /// Maximum number of categories to show
    #[arg(short = 'n', long, default_value = "1")]
    pub top: usize,

    /// Minimum score of a shown category (default from the configuration)
    #[arg(long, allow_hyphen_values = true)]
    pub min_score: Option<f64>,

    /// Classifier configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Text to classify
    #[arg(value_name = "TEXT", required = true, num_args = 1..)]
    pub text: Vec<String>,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Model file written by `train`
    #[arg(long, value_name = "FILE")]
    pub model: PathBuf,

    /// Held-out corpus directory
    #[arg(long, value_name = "DIR")]
    pub corpus: PathBuf,

    /// Fraction of each category to load; negative takes the trailing part
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    pub rate: f64,

    /// Minimum score for a prediction to be accepted
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub threshold: f64,

    /// Classifier configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory receiving the misclassification log
    #[arg(long, value_name = "DIR")]
    pub dump_dir: Option<PathBuf>,
}

impl PredictArgs {
    /// The text arguments joined by spaces.
    pub fn joined_text(&self) -> String {
        self.text.join(" ")
    }
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train() {
        let args = TextcatArgs::parse_from([
            "textcat", "-vv", "train", "--corpus", "data", "--model", "m.json", "--rate", "-0.1",
        ]);
        assert_eq!(args.verbosity(), 2);
        match args.command {
            Command::Train(train) => {
                assert_eq!(train.rate, -0.1);
                assert_eq!(train.analyzer, "whitespace");
                assert!(!train.file_backed);
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_parse_predict() {
        let args = TextcatArgs::parse_from([
            "textcat", "-q", "--format", "json", "predict", "--model", "m.json", "-n", "3", "hello",
            "world",
        ]);
        assert_eq!(args.verbosity(), 0);
        assert_eq!(args.output_format, OutputFormat::Json);
        match args.command {
            Command::Predict(predict) => {
                assert_eq!(predict.top, 3);
                assert_eq!(predict.joined_text(), "hello world");
                assert_eq!(predict.min_score, None);
            }
            _ => panic!("expected predict"),
        }
    }
}
