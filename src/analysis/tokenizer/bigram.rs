//! Character bigram tokenizer for unsegmented CJK text.
//!
//! The text is first split into atoms: every CJK ideograph, kana or hangul
//! syllable is an atom of its own, a run of other alphanumeric characters
//! (a latin word, a number) forms one atom, and whitespace or punctuation
//! only separates atoms. Tokens are then the overlapping pairs of adjacent
//! atoms. A text with a single atom yields that atom as its only token.
//!
//! Bigrams make a good classification vocabulary for Chinese and Japanese
//! text without a dictionary-based word segmenter.
//!
//! # Examples
//!
//! ```
//! use textcat::analysis::tokenizer::Tokenizer;
//! use textcat::analysis::tokenizer::bigram::BigramTokenizer;
//!
//! let tokenizer = BigramTokenizer::new();
//! let tokens: Vec<_> = tokenizer
//!     .tokenize("華碩螢幕")
//!     .unwrap()
//!     .map(|t| t.text)
//!     .collect();
//! assert_eq!(tokens, vec!["華碩", "碩螢", "螢幕"]);
//! ```

use super::Tokenizer;

use crate::analysis::token::{Token, TokenStream};
use crate::error::Result;

/// A tokenizer emitting overlapping bigrams of character atoms.
#[derive(Clone, Debug, Default)]
pub struct BigramTokenizer;

impl BigramTokenizer {
    /// Create a new bigram tokenizer.
    pub fn new() -> Self {
        BigramTokenizer
    }

    /// Whether `c` is written without spaces between words and must stand alone.
    fn is_ideographic(c: char) -> bool {
        matches!(c,
            '\u{4E00}'..='\u{9FFF}' |   // CJK Unified Ideographs
            '\u{3400}'..='\u{4DBF}' |   // CJK Extension A
            '\u{F900}'..='\u{FAFF}' |   // CJK Compatibility Ideographs
            '\u{20000}'..='\u{2A6DF}' | // CJK Extension B
            '\u{3040}'..='\u{309F}' |   // Hiragana
            '\u{30A0}'..='\u{30FF}' |   // Katakana
            '\u{AC00}'..='\u{D7AF}'     // Hangul syllables
        )
    }

    /// Split `text` into `(start, end)` byte ranges of atoms.
    fn atoms(text: &str) -> Vec<(usize, usize)> {
        let mut atoms = Vec::new();
        let mut run: Option<usize> = None;

        for (offset, c) in text.char_indices() {
            if Self::is_ideographic(c) {
                if let Some(begin) = run.take() {
                    atoms.push((begin, offset));
                }
                atoms.push((offset, offset + c.len_utf8()));
            } else if c.is_alphanumeric() {
                run.get_or_insert(offset);
            } else if let Some(begin) = run.take() {
                atoms.push((begin, offset));
            }
        }

        if let Some(begin) = run {
            atoms.push((begin, text.len()));
        }

        atoms
    }
}

impl Tokenizer for BigramTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let atoms = Self::atoms(text);

        let tokens: Vec<Token> = match atoms.as_slice() {
            [] => Vec::new(),
            [(start, end)] => vec![Token::with_offsets(&text[*start..*end], 0, *start, *end)],
            _ => atoms
                .windows(2)
                .enumerate()
                .map(|(position, pair)| {
                    let (first_start, first_end) = pair[0];
                    let (second_start, second_end) = pair[1];
                    let mut bigram = String::with_capacity(
                        first_end - first_start + second_end - second_start,
                    );
                    bigram.push_str(&text[first_start..first_end]);
                    bigram.push_str(&text[second_start..second_end]);
                    Token::with_offsets(bigram, position, first_start, second_end)
                })
                .collect(),
        };

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "bigram"
    }
}
