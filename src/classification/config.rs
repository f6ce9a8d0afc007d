//! Classifier configuration.
//!
//! All settings have defaults; a JSON file only needs the fields it changes:
//!
//! ```json
//! {
//!   "probability": true,
//!   "feature_selection": {
//!     "min_score": 10.83,
//!     "retention": { "policy": "top_fraction", "value": 0.5 }
//!   }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextcatError};

/// Feature count cap used when no retention policy is configured.
pub const DEFAULT_MAX_FEATURES: usize = 1_000_000;

/// Default threshold of bounded ranking.
pub const DEFAULT_MIN_SCORE: f64 = 0.01;

/// How many features survive chi-square selection, after `min_score`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "value", rename_all = "snake_case")]
pub enum Retention {
    /// Keep every candidate.
    All,
    /// Keep the `k` best candidates.
    TopK(usize),
    /// Keep the best `ceil(fraction * candidates)` candidates,
    /// `0 < fraction <= 1`.
    TopFraction(f64),
}

impl Retention {
    /// Number of features kept out of `candidates` ranked ones.
    pub fn keep(&self, candidates: usize) -> usize {
        match *self {
            Retention::All => candidates,
            Retention::TopK(k) => k.min(candidates),
            Retention::TopFraction(fraction) => {
                ((candidates as f64 * fraction).ceil() as usize).min(candidates)
            }
        }
    }
}

impl Default for Retention {
    fn default() -> Self {
        Retention::TopK(DEFAULT_MAX_FEATURES)
    }
}

/// Chi-square feature selection settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSelectionConfig {
    /// Features whose best chi-square score is below this are dropped.
    /// [`CHI_SQUARE_CRITICAL_P001`](super::features::CHI_SQUARE_CRITICAL_P001)
    /// keeps only features dependent on some category at p < 0.001.
    pub min_score: f64,

    /// How many of the remaining features are kept.
    pub retention: Retention,
}

impl Default for FeatureSelectionConfig {
    fn default() -> Self {
        FeatureSelectionConfig {
            min_score: 0.0,
            retention: Retention::default(),
        }
    }
}

impl FeatureSelectionConfig {
    /// Check that the settings describe a usable selection.
    pub fn validate(&self) -> Result<()> {
        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(TextcatError::invalid_argument(format!(
                "feature_selection.min_score must be a finite non-negative number, got {}",
                self.min_score
            )));
        }
        if let Retention::TopFraction(fraction) = self.retention {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(TextcatError::invalid_argument(format!(
                    "retention fraction must be in (0, 1], got {fraction}"
                )));
            }
        }
        Ok(())
    }
}

/// Naive Bayes classifier settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Normalize category scores into a probability distribution.
    pub probability: bool,

    /// Default minimum score for bounded ranking.
    pub min_score: f64,

    /// Size of a dedicated worker pool; `None` uses the global rayon pool.
    pub num_threads: Option<usize>,

    /// Feature selection settings.
    pub feature_selection: FeatureSelectionConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            probability: true,
            min_score: DEFAULT_MIN_SCORE,
            num_threads: None,
            feature_selection: FeatureSelectionConfig::default(),
        }
    }
}

impl ClassifierConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: ClassifierConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting.
    pub fn validate(&self) -> Result<()> {
        if self.min_score.is_nan() {
            return Err(TextcatError::invalid_argument("min_score must not be NaN"));
        }
        if self.num_threads == Some(0) {
            return Err(TextcatError::invalid_argument(
                "num_threads must be at least 1",
            ));
        }
        self.feature_selection.validate()
    }
}
