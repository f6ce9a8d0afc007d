//! Labeled corpora.
//!
//! A [`DataSet`] owns the documents of a corpus together with the catalog of
//! category labels, the lexicon of raw token ids, and the analyzer used to
//! tokenize the raw text. Two implementations are provided:
//!
//! - [`MemoryDataSet`] keeps every document in memory.
//! - [`FileDataSet`] spills documents to a JSON-lines cache file and streams
//!   them back, for corpora that do not fit in memory. The cache file is
//!   removed when the data set is dropped.
//!
//! # Directory layout
//!
//! [`DataSet::load_dir`] reads a corpus laid out as one sub-directory per
//! category, one UTF-8 text file per document:
//!
//! ```text
//! corpus/
//! ├── finance/
//! │   ├── 0001.txt
//! │   └── 0002.txt
//! └── sports/
//!     └── 0001.txt
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::document::Document;
use super::vocabulary::{Catalog, Lexicon};
use crate::analysis::analyzer::Analyzer;
use crate::error::{Result, TextcatError};

/// A stream of documents read from a data set.
pub type DocumentIter<'a> = Box<dyn Iterator<Item = Result<Document>> + Send + 'a>;

/// A labeled corpus.
pub trait DataSet: Send + Sync {
    /// Number of documents.
    fn len(&self) -> usize;

    /// Check if the data set holds no document.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The ordered, de-duplicated category labels.
    fn catalog(&self) -> &Catalog;

    /// The lexicon assigning raw ids to every token seen so far.
    fn lexicon(&self) -> &Lexicon;

    /// The analyzer used to tokenize documents added to this data set.
    fn analyzer(&self) -> &Arc<dyn Analyzer>;

    /// Stream the documents in insertion order.
    fn iter(&self) -> Result<DocumentIter<'_>>;

    /// Declare a category, returning its id. Declaring a category that never
    /// receives a document makes training fail.
    fn add_category(&mut self, label: &str) -> usize;

    /// Tokenize `text` and add it as a document of `category`.
    fn add(&mut self, category: &str, text: &str) -> Result<()>;

    /// Load a corpus directory, keeping a fraction of each category's files.
    ///
    /// Files are taken in file-name order. A positive `rate` keeps the
    /// leading `rate` fraction of each category, a negative `rate` keeps the
    /// trailing `|rate|` fraction, so `0.9` and `-0.1` give complementary
    /// training and test splits. A category whose selection is empty is
    /// skipped. Returns the number of documents loaded.
    fn load_dir(&mut self, path: &Path, rate: f64) -> Result<usize> {
        if !rate.is_finite() || rate == 0.0 || rate.abs() > 1.0 {
            return Err(TextcatError::invalid_argument(format!(
                "split rate must be in [-1, 0) or (0, 1], got {rate}"
            )));
        }
        if !path.is_dir() {
            return Err(TextcatError::data(format!(
                "corpus path {} is not a directory",
                path.display()
            )));
        }

        let mut loaded = 0;
        for category_dir in sorted_entries(path, |p| p.is_dir())? {
            let label = category_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    TextcatError::data(format!(
                        "invalid category directory {}",
                        category_dir.display()
                    ))
                })?;
            let files = sorted_entries(&category_dir, |p| p.is_file())?;
            let (begin, end) = split_range(files.len(), rate);
            if begin == end {
                log::warn!(
                    "skipping category '{label}': no document selected from {} files",
                    files.len()
                );
                continue;
            }
            for file in &files[begin..end] {
                let text = fs::read_to_string(file)?;
                self.add(&label, &text)?;
            }

            log::debug!(
                "loaded {} of {} documents for category '{label}'",
                end - begin,
                files.len()
            );
            loaded += end - begin;
        }

        log::info!(
            "loaded {loaded} documents in {} categories from {}",
            self.catalog().len(),
            path.display()
        );
        Ok(loaded)
    }
}

/// Entries of `dir` accepted by `keep`, sorted by path.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// The `[begin, end)` slice of `len` files selected by a split rate.
fn split_range(len: usize, rate: f64) -> (usize, usize) {
    if rate > 0.0 {
        (0, (len as f64 * rate) as usize)
    } else {
        ((len as f64 * (1.0 + rate)) as usize, len)
    }
}

/// State shared by the data set implementations.
struct CorpusState {
    catalog: Catalog,
    lexicon: Lexicon,
    analyzer: Arc<dyn Analyzer>,
}

impl CorpusState {
    fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        CorpusState {
            catalog: Catalog::new(),
            lexicon: Lexicon::new(),
            analyzer,
        }
    }

    fn encode(&mut self, category: &str, text: &str) -> Result<Document> {
        let category = self.catalog.add_category(category);
        let tokens = self.analyzer.segment(text)?;
        for token in &tokens {
            self.lexicon.add_word(token);
        }
        Ok(Document::new(tokens, &self.lexicon, Some(category)))
    }
}

/// A data set holding its documents in memory.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use textcat::analysis::analyzer::SimpleAnalyzer;
/// use textcat::analysis::tokenizer::WhitespaceTokenizer;
/// use textcat::classification::{DataSet, MemoryDataSet};
///
/// let analyzer = Arc::new(SimpleAnalyzer::new(Arc::new(WhitespaceTokenizer::new())));
/// let mut data = MemoryDataSet::new(analyzer);
/// data.add("fruit", "apple banana").unwrap();
/// data.add("vehicle", "car truck").unwrap();
///
/// assert_eq!(data.len(), 2);
/// assert_eq!(data.catalog().len(), 2);
/// assert_eq!(data.lexicon().len(), 4);
/// ```
pub struct MemoryDataSet {
    state: CorpusState,
    documents: Vec<Document>,
}

impl MemoryDataSet {
    /// Create an empty in-memory data set tokenizing with `analyzer`.
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        MemoryDataSet {
            state: CorpusState::new(analyzer),
            documents: Vec::new(),
        }
    }

    /// The documents, in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl DataSet for MemoryDataSet {
    fn len(&self) -> usize {
        self.documents.len()
    }

    fn catalog(&self) -> &Catalog {
        &self.state.catalog
    }

    fn lexicon(&self) -> &Lexicon {
        &self.state.lexicon
    }

    fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.state.analyzer
    }

    fn iter(&self) -> Result<DocumentIter<'_>> {
        Ok(Box::new(
            self.documents.iter().cloned().map(Ok::<Document, TextcatError>),
        ))
    }

    fn add_category(&mut self, label: &str) -> usize {
        self.state.catalog.add_category(label)
    }

    fn add(&mut self, category: &str, text: &str) -> Result<()> {
        let document = self.state.encode(category, text)?;
        self.documents.push(document);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryDataSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDataSet")
            .field("documents", &self.documents.len())
            .field("categories", &self.state.catalog.len())
            .field("lexicon", &self.state.lexicon.len())
            .field("analyzer", &self.state.analyzer.name())
            .finish()
    }
}

/// A data set that keeps its documents in a JSON-lines cache file.
pub struct FileDataSet {
    state: CorpusState,
    cache_path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
    len: usize,
}

impl FileDataSet {
    /// Create a data set caching documents in a fresh file under the system
    /// temporary directory.
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        let path = std::env::temp_dir().join(format!("textcat-{}.jsonl", Uuid::new_v4()));
        Self::with_cache_path(analyzer, path)
    }

    /// Create a data set caching documents in `path`. The file is truncated
    /// now and removed when the data set is dropped.
    pub fn with_cache_path<P: Into<PathBuf>>(analyzer: Arc<dyn Analyzer>, path: P) -> Result<Self> {
        let cache_path = path.into();
        let file = File::create(&cache_path)?;
        log::debug!("caching documents in {}", cache_path.display());

        Ok(FileDataSet {
            state: CorpusState::new(analyzer),
            cache_path,
            writer: Mutex::new(Some(BufWriter::new(file))),
            len: 0,
        })
    }

    /// The path of the cache file.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }
}

impl DataSet for FileDataSet {
    fn len(&self) -> usize {
        self.len
    }

    fn catalog(&self) -> &Catalog {
        &self.state.catalog
    }

    fn lexicon(&self) -> &Lexicon {
        &self.state.lexicon
    }

    fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.state.analyzer
    }

    fn iter(&self) -> Result<DocumentIter<'_>> {
        if let Some(writer) = self.writer.lock().as_mut() {
            writer.flush()?;
        }

        let reader = BufReader::new(File::open(&self.cache_path)?);
        Ok(Box::new(reader.lines().map(|line| -> Result<Document> {
            let document = serde_json::from_str(&line?)?;
            Ok(document)
        })))
    }

    fn add_category(&mut self, label: &str) -> usize {
        self.state.catalog.add_category(label)
    }

    fn add(&mut self, category: &str, text: &str) -> Result<()> {
        let document = self.state.encode(category, text)?;

        let mut guard = self.writer.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| TextcatError::invalid_state("document cache is closed"))?;
        serde_json::to_writer(&mut *writer, &document)?;
        writer.write_all(b"\n")?;
        self.len += 1;
        Ok(())
    }
}

impl Drop for FileDataSet {
    fn drop(&mut self) {
        // The handle must be closed before the file can be removed on Windows.
        drop(self.writer.get_mut().take());
        if let Err(e) = fs::remove_file(&self.cache_path) {
            log::debug!("could not remove cache file {}: {e}", self.cache_path.display());
        }
    }
}

impl std::fmt::Debug for FileDataSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDataSet")
            .field("documents", &self.len)
            .field("cache_path", &self.cache_path)
            .field("categories", &self.state.catalog.len())
            .field("analyzer", &self.state.analyzer.name())
            .finish()
    }
}
