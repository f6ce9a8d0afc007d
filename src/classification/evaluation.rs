//! Evaluation of a trained classifier on labeled held-out data.
//!
//! Every held-out document is classified and compared with its label. A
//! prediction is only accepted when its score reaches the decision
//! threshold, so the counts follow a reject option:
//!
//! - the true category always counts as an actual positive,
//! - the predicted category counts as a predicted positive if accepted,
//! - and as a true positive if accepted and correct.

use std::fmt;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::classifier::Classifier;
use super::dataset::DataSet;
use super::diagnostics::{DiagnosticSink, Misclassification, best_effort};
use super::scoring;
use crate::error::{Result, TextcatError};

/// Per-category confusion counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_positive: Vec<usize>,
    pub predicted_positive: Vec<usize>,
    pub actual_positive: Vec<usize>,
    pub total: usize,
}

impl ConfusionCounts {
    /// Zeroed counts for `categories` categories.
    pub fn new(categories: usize) -> Self {
        ConfusionCounts {
            true_positive: vec![0; categories],
            predicted_positive: vec![0; categories],
            actual_positive: vec![0; categories],
            total: 0,
        }
    }

    /// Count one prediction. Returns whether it was accepted.
    pub fn record(&mut self, actual: usize, predicted: usize, score: f64, threshold: f64) -> bool {
        self.total += 1;
        self.actual_positive[actual] += 1;

        let accepted = score >= threshold;
        if accepted {
            self.predicted_positive[predicted] += 1;
            if predicted == actual {
                self.true_positive[predicted] += 1;
            }
        }
        accepted
    }

    /// Add the counts of `other`.
    pub fn merge(mut self, other: ConfusionCounts) -> Self {
        self.total += other.total;
        for (count, added) in self.true_positive.iter_mut().zip(other.true_positive) {
            *count += added;
        }
        for (count, added) in self.predicted_positive.iter_mut().zip(other.predicted_positive) {
            *count += added;
        }
        for (count, added) in self.actual_positive.iter_mut().zip(other.actual_positive) {
            *count += added;
        }
        self
    }
}

/// `numerator / denominator`, or 0 when the numerator is 0.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if numerator == 0.0 || denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn harmonic_mean(x: f64, y: f64) -> f64 {
    ratio(2.0 * x * y, x + y)
}

/// Per-category and macro-averaged metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Category labels, indexing every per-category vector.
    pub categories: Vec<String>,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub f1: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub macro_precision: f64,
    pub macro_recall: f64,
    /// Harmonic mean of the macro precision and the macro recall.
    pub macro_f1: f64,
    /// Accepted correct predictions over all documents.
    pub overall_accuracy: f64,
    /// Number of evaluated documents.
    pub total: usize,
    /// Wall-clock evaluation time.
    pub seconds: f64,
    /// Documents per second.
    pub throughput: f64,
}

impl EvaluationResult {
    /// Compute the metrics from confusion counts.
    pub fn from_counts(categories: Vec<String>, counts: &ConfusionCounts, seconds: f64) -> Self {
        let c = categories.len();
        let total = counts.total as f64;

        let mut precision = Vec::with_capacity(c);
        let mut recall = Vec::with_capacity(c);
        let mut f1 = Vec::with_capacity(c);
        let mut accuracy = Vec::with_capacity(c);
        for i in 0..c {
            let tp = counts.true_positive[i] as f64;
            let pp = counts.predicted_positive[i] as f64;
            let ap = counts.actual_positive[i] as f64;
            let tn = total - pp - (ap - tp);

            let p = ratio(tp, pp);
            let r = ratio(tp, ap);
            precision.push(p);
            recall.push(r);
            f1.push(harmonic_mean(p, r));
            accuracy.push(ratio(tp + tn, total));
        }

        let mean = |values: &[f64]| ratio(values.iter().sum(), values.len() as f64);
        let macro_precision = mean(&precision);
        let macro_recall = mean(&recall);
        let correct: usize = counts.true_positive.iter().sum();

        EvaluationResult {
            categories,
            precision,
            recall,
            f1,
            accuracy,
            macro_precision,
            macro_recall,
            macro_f1: harmonic_mean(macro_precision, macro_recall),
            overall_accuracy: ratio(correct as f64, total),
            total: counts.total,
            seconds,
            throughput: ratio(total, seconds),
        }
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8}{:>8}{:>8}{:>8}", "P", "R", "F1", "A")?;
        for (i, label) in self.categories.iter().enumerate() {
            writeln!(
                f,
                "{:>8.2}{:>8.2}{:>8.2}{:>8.2}  {label}",
                self.precision[i] * 100.0,
                self.recall[i] * 100.0,
                self.f1[i] * 100.0,
                self.accuracy[i] * 100.0,
            )?;
        }
        writeln!(
            f,
            "{:>8.2}{:>8.2}{:>8.2}{:>8.2}  avg.",
            self.macro_precision * 100.0,
            self.macro_recall * 100.0,
            self.macro_f1 * 100.0,
            self.overall_accuracy * 100.0,
        )?;
        write!(
            f,
            "data size = {}, speed = {:.2} doc/s",
            self.total, self.throughput
        )
    }
}

/// Classify every document of `data` and measure the predictions.
///
/// Documents are re-encoded from their tokens with the classifier's feature
/// lookup and mapped to its categories by label, so `data` may come from a
/// different lexicon than the training set. A held-out label the classifier
/// does not know is a data error. Every accepted wrong prediction is sent to
/// `sink`, in corpus order.
pub fn evaluate(
    classifier: &dyn Classifier,
    data: &dyn DataSet,
    threshold: f64,
    sink: &dyn DiagnosticSink,
) -> Result<EvaluationResult> {
    if !threshold.is_finite() {
        return Err(TextcatError::invalid_argument(format!(
            "threshold must be finite, got {threshold}"
        )));
    }

    let catalog = classifier.catalog()?;
    let categories = catalog.len();
    let held_out: Vec<Option<usize>> = data
        .catalog()
        .labels()
        .iter()
        .map(|label| catalog.id_of(label))
        .collect();

    sink.progress(&format!(
        "evaluating {} documents with {} (threshold {threshold})",
        data.len(),
        classifier.name()
    ));
    let start = Instant::now();

    // Misclassifications are buffered with their corpus position so that the
    // sink sees them in document order.
    let empty = || (ConfusionCounts::new(categories), Vec::<(usize, Misclassification)>::new());
    let (counts, mut misclassified) = data
        .iter()?
        .enumerate()
        .par_bridge()
        .try_fold(empty, |(mut counts, mut misclassified), (position, document)| {
            let document = document?;
            let held_out_id = document
                .category
                .ok_or_else(|| TextcatError::data("held-out document has no category"))?;
            let actual = held_out
                .get(held_out_id)
                .copied()
                .flatten()
                .ok_or_else(|| {
                    TextcatError::data(format!(
                        "held-out category '{}' is unknown to the classifier",
                        data.catalog().label(held_out_id).unwrap_or("?")
                    ))
                })?;

            let document = classifier.document(document.tokens)?;
            let scores = classifier.categorize(&document)?;
            let (predicted, score) = scoring::best(&scores)
                .ok_or_else(|| TextcatError::invalid_state("classifier has no category"))?;

            let accepted = counts.record(actual, predicted, score, threshold);
            if accepted && predicted != actual {
                misclassified.push((
                    position,
                    Misclassification {
                        predicted: catalog.label(predicted).unwrap_or("?").to_string(),
                        actual: catalog.label(actual).unwrap_or("?").to_string(),
                        tokens: document.tokens,
                        score,
                    },
                ));
            }
            Ok::<_, TextcatError>((counts, misclassified))
        })
        .try_reduce(empty, |(left, mut left_records), (right, right_records)| {
            left_records.extend(right_records);
            Ok((left.merge(right), left_records))
        })?;

    misclassified.sort_unstable_by_key(|(position, _)| *position);
    for (_, record) in &misclassified {
        best_effort("misclassification", sink.misclassified(record));
    }

    best_effort("diagnostics", sink.flush());
    let seconds = start.elapsed().as_secs_f64();

    let result = EvaluationResult::from_counts(catalog.labels().to_vec(), &counts, seconds);
    sink.progress(&format!(
        "evaluated {} documents: accuracy {:.4}, macro F1 {:.4}",
        result.total, result.overall_accuracy, result.macro_f1
    ));
    Ok(result)
}
