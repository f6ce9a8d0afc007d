//! Best-effort diagnostic side channel.
//!
//! Training and evaluation report progress, the selected vocabulary, and
//! misclassified documents through a [`DiagnosticSink`]. Every write is best
//! effort: a failing sink is logged at `warn` and never aborts the training
//! or evaluation that produced the record.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// File name of the sorted selected vocabulary written by [`FileSink`].
pub const SELECTED_FEATURES_FILE: &str = "selected_features.txt";

/// File name of the per-category vocabulary written by [`FileSink`].
pub const FEATURES_BY_CATEGORY_FILE: &str = "selected_features_by_category.txt";

/// File name of the misclassification log written by [`FileSink`].
pub const MISCLASSIFIED_FILE: &str = "misclassified.tsv";

/// The vocabulary retained by feature selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureDump {
    /// Every selected feature, sorted.
    pub selected: Vec<String>,

    /// For each category label, the selected features observed in at least
    /// one of its training documents, in selection order.
    pub by_category: Vec<(String, Vec<String>)>,
}

/// A held-out document whose accepted prediction was wrong.
#[derive(Clone, Debug, PartialEq)]
pub struct Misclassification {
    /// Label of the predicted category.
    pub predicted: String,
    /// Label of the true category.
    pub actual: String,
    /// The document's tokens.
    pub tokens: Vec<String>,
    /// Score of the predicted category.
    pub score: f64,
}

impl fmt::Display for Misclassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{:.6}",
            self.predicted,
            self.actual,
            self.tokens.join(" "),
            self.score
        )
    }
}

/// Receiver of progress messages and diagnostic records.
pub trait DiagnosticSink: Send + Sync {
    /// Report a pipeline milestone.
    fn progress(&self, message: &str) {
        log::info!("{message}");
    }

    /// Receive the vocabulary kept by feature selection.
    fn selected_features(&self, dump: &FeatureDump) -> io::Result<()>;

    /// Receive one misclassified document.
    fn misclassified(&self, record: &Misclassification) -> io::Result<()>;

    /// Flush buffered records.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Log a failed diagnostic write and carry on.
pub(crate) fn best_effort(what: &str, result: io::Result<()>) {
    if let Err(e) = result {
        log::warn!("failed to write {what}: {e}");
    }
}

/// A sink forwarding everything to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Create a new log sink.
    pub fn new() -> Self {
        LogSink
    }
}

impl DiagnosticSink for LogSink {
    fn selected_features(&self, dump: &FeatureDump) -> io::Result<()> {
        for (label, features) in &dump.by_category {
            log::debug!("category '{label}' uses {} selected features", features.len());
        }
        Ok(())
    }

    fn misclassified(&self, record: &Misclassification) -> io::Result<()> {
        log::info!("misclassified: {record}");
        Ok(())
    }
}

/// A sink writing feature dumps and the misclassification log into a
/// directory.
///
/// The misclassification log is a tab-separated file with a
/// `predict  actual  text  score` header, opened on the first record.
pub struct FileSink {
    dir: PathBuf,
    misclassified: Mutex<Option<BufWriter<File>>>,
}

impl FileSink {
    /// Create a sink writing into `dir`. The directory is created on the
    /// first write.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        FileSink {
            dir: dir.into(),
            misclassified: Mutex::new(None),
        }
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn create(&self, name: &str) -> io::Result<BufWriter<File>> {
        fs::create_dir_all(&self.dir)?;
        Ok(BufWriter::new(File::create(self.dir.join(name))?))
    }
}

impl DiagnosticSink for FileSink {
    fn selected_features(&self, dump: &FeatureDump) -> io::Result<()> {
        let mut writer = self.create(SELECTED_FEATURES_FILE)?;
        for word in &dump.selected {
            writeln!(writer, "{word}")?;
        }
        writer.flush()?;

        let mut writer = self.create(FEATURES_BY_CATEGORY_FILE)?;
        for (label, features) in &dump.by_category {
            writeln!(writer, "{label} : \n{}\n", features.join("\n"))?;
        }
        writer.flush()
    }

    fn misclassified(&self, record: &Misclassification) -> io::Result<()> {
        let mut guard = self.misclassified.lock();
        if guard.is_none() {
            let mut writer = self.create(MISCLASSIFIED_FILE)?;
            writeln!(writer, "predict\tactual\ttext\tscore")?;
            *guard = Some(writer);
        }
        match guard.as_mut() {
            Some(writer) => writeln!(writer, "{record}"),
            None => Ok(()),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.misclassified.lock().as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink").field("dir", &self.dir).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misclassification_line() {
        let record = Misclassification {
            predicted: "sports".to_string(),
            actual: "finance".to_string(),
            tokens: vec!["stock".to_string(), "rally".to_string()],
            score: 0.5,
        };
        assert_eq!(record.to_string(), "sports\tfinance\tstock rally\t0.500000");
    }

    #[test]
    fn test_best_effort_swallows_errors() {
        best_effort("nothing", Err(io::Error::other("disk full")));
        best_effort("nothing", Ok(()));
    }
}
