//! Output formatting for CLI commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, TextcatArgs};
use crate::error::Result;

/// Result structure for training.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub model: String,
    pub analyzer: String,
    pub documents: usize,
    pub categories: Vec<String>,
    pub features: usize,
    pub duration_ms: u64,
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model:      {}", self.model)?;
        writeln!(f, "Analyzer:   {}", self.analyzer)?;
        writeln!(f, "Documents:  {}", self.documents)?;
        writeln!(f, "Categories: {}", self.categories.join(", "))?;
        writeln!(f, "Features:   {}", self.features)?;
        write!(f, "Duration:   {}ms", self.duration_ms)
    }
}

/// One scored category.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoredLabel {
    pub label: String,
    pub score: f64,
}

/// Result structure for prediction.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResults {
    pub text: String,
    pub predictions: Vec<ScoredLabel>,
}

impl fmt::Display for PredictionResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predictions.is_empty() {
            return write!(f, "No category scored above the threshold.");
        }
        for (i, prediction) in self.predictions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}. {} ({:.4})", i + 1, prediction.label, prediction.score)?;
        }
        Ok(())
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + fmt::Display>(result: &T, args: &TextcatArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            println!("{result}");
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &TextcatArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_display() {
        let results = PredictionResults {
            text: "x".to_string(),
            predictions: vec![
                ScoredLabel {
                    label: "A".to_string(),
                    score: 0.75,
                },
                ScoredLabel {
                    label: "B".to_string(),
                    score: 0.25,
                },
            ],
        };
        assert_eq!(results.to_string(), "1. A (0.7500)\n2. B (0.2500)");
    }
}
