//! Interned string tables: the category catalog and the raw-token lexicon.
//!
//! Both assign dense ids in first-seen order and never reassign an id, so
//! ids can index plain vectors everywhere else in the pipeline.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Lookup from a token to a feature id.
///
/// Implemented by the raw [`Lexicon`] used while collecting training counts
/// and by the frozen [`FeatureLookup`](super::features::FeatureLookup) of a
/// trained model.
pub trait TermIndex: Send + Sync {
    /// Get the id of `term`, or `None` if the index does not know it.
    fn term_id(&self, term: &str) -> Option<usize>;
}

/// Ordered set of strings with dense ids.
#[derive(Clone, Debug, Default)]
pub(crate) struct SymbolTable {
    symbols: Vec<String>,
    ids: AHashMap<String, usize>,
}

impl SymbolTable {
    pub(crate) fn intern(&mut self, symbol: &str) -> usize {
        if let Some(&id) = self.ids.get(symbol) {
            return id;
        }
        let id = self.symbols.len();
        self.symbols.push(symbol.to_string());
        self.ids.insert(symbol.to_string(), id);
        id
    }

    pub(crate) fn id(&self, symbol: &str) -> Option<usize> {
        self.ids.get(symbol).copied()
    }

    pub(crate) fn symbol(&self, id: usize) -> Option<&str> {
        self.symbols.get(id).map(String::as_str)
    }

    pub(crate) fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub(crate) fn len(&self) -> usize {
        self.symbols.len()
    }
}

impl From<Vec<String>> for SymbolTable {
    fn from(symbols: Vec<String>) -> Self {
        let mut table = SymbolTable::default();
        for symbol in &symbols {
            table.intern(symbol);
        }
        table
    }
}

impl PartialEq for SymbolTable {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols
    }
}

/// The ordered catalog of category labels. A category id is its position.
///
/// # Examples
///
/// ```
/// use textcat::classification::Catalog;
///
/// let mut catalog = Catalog::new();
/// assert_eq!(catalog.add_category("sports"), 0);
/// assert_eq!(catalog.add_category("finance"), 1);
/// assert_eq!(catalog.add_category("sports"), 0);
/// assert_eq!(catalog.label(1), Some("finance"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Catalog {
    table: SymbolTable,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category, returning its id. Existing labels keep their id.
    pub fn add_category(&mut self, label: &str) -> usize {
        self.table.intern(label)
    }

    /// Get the id of a category label.
    pub fn id_of(&self, label: &str) -> Option<usize> {
        self.table.id(label)
    }

    /// Get the label of a category id.
    pub fn label(&self, id: usize) -> Option<&str> {
        self.table.symbol(id)
    }

    /// All labels in id order.
    pub fn labels(&self) -> &[String] {
        self.table.symbols()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the catalog has no categories.
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}

impl From<Vec<String>> for Catalog {
    fn from(labels: Vec<String>) -> Self {
        Catalog {
            table: SymbolTable::from(labels),
        }
    }
}

impl From<Catalog> for Vec<String> {
    fn from(catalog: Catalog) -> Self {
        catalog.table.symbols
    }
}

/// Assigns stable raw feature ids to token strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lexicon {
    table: SymbolTable,
}

impl Lexicon {
    /// Create an empty lexicon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a word, returning its id. Known words keep their id.
    pub fn add_word(&mut self, word: &str) -> usize {
        self.table.intern(word)
    }

    /// Get the word with the given id.
    pub fn word(&self, id: usize) -> Option<&str> {
        self.table.symbol(id)
    }

    /// All words in id order.
    pub fn words(&self) -> &[String] {
        self.table.symbols()
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the lexicon is empty.
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}

impl TermIndex for Lexicon {
    fn term_id(&self, term: &str) -> Option<usize> {
        self.table.id(term)
    }
}
