//! Tokenized documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::vocabulary::TermIndex;

/// A tokenized instance, ready to be counted or scored.
///
/// `term_frequencies` maps each known feature id to its number of
/// occurrences. It is ordered by feature id, which fixes the summation order
/// when the document is scored and keeps scores bit-for-bit reproducible.
///
/// # Examples
///
/// ```
/// use textcat::classification::{Document, Lexicon};
///
/// let mut lexicon = Lexicon::new();
/// lexicon.add_word("red");
/// lexicon.add_word("blue");
///
/// let tokens = vec!["blue".to_string(), "green".to_string(), "blue".to_string()];
/// let document = Document::new(tokens, &lexicon, Some(0));
///
/// assert_eq!(document.frequency(1), 2);
/// assert_eq!(document.frequency(0), 0);
/// assert_eq!(document.tokens.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The raw tokens, in order, including tokens unknown to the index.
    pub tokens: Vec<String>,

    /// Feature id to occurrence count, for tokens known to the index.
    pub term_frequencies: BTreeMap<usize, u32>,

    /// The true category id, if the document is labeled.
    pub category: Option<usize>,
}

impl Document {
    /// Build a document by mapping every token through `index`.
    ///
    /// Tokens the index does not know are kept in `tokens` but contribute no
    /// feature.
    pub fn new(tokens: Vec<String>, index: &dyn TermIndex, category: Option<usize>) -> Self {
        let mut term_frequencies = BTreeMap::new();
        for token in &tokens {
            if let Some(id) = index.term_id(token) {
                *term_frequencies.entry(id).or_insert(0) += 1;
            }
        }

        Document {
            tokens,
            term_frequencies,
            category,
        }
    }

    /// Occurrences of feature `id` in this document.
    pub fn frequency(&self, id: usize) -> u32 {
        self.term_frequencies.get(&id).copied().unwrap_or(0)
    }

    /// Iterate over `(feature id, occurrences)` in ascending feature id order.
    pub fn features(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.term_frequencies.iter().map(|(&id, &count)| (id, count))
    }

    /// The tokens joined by single spaces, for diagnostics.
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}
