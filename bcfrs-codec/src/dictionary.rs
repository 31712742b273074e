use std::collections::HashMap;

use bcfrs_core::models::{Header, HeaderLine};
use bcfrs_core::{BcfError, Result};

use crate::consts::PASS_FILTER;

///
/// The header dictionary: maps the small integer indices that records carry
/// back to FILTER/INFO/FORMAT identifiers.
///
/// Slot 0 is always `PASS`. The remaining slots follow header declaration
/// order across FILTER, INFO and FORMAT lines combined; the first
/// occurrence of an identifier wins. Built once when a stream is opened and
/// immutable afterwards.
///
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl Dictionary {
    /// Build the dictionary for a parsed header. Fails when the header
    /// declares no contigs, since records encode their contig as a
    /// dictionary index.
    pub fn from_header(header: &Header) -> Result<Self> {
        if header.contigs().is_empty() {
            return Err(BcfError::MissingContigs);
        }

        let mut dictionary = Dictionary {
            words: Vec::new(),
            index: HashMap::new(),
        };
        dictionary.push(PASS_FILTER);

        for line in header.lines() {
            let id = match line {
                HeaderLine::Filter { id, .. } => id,
                HeaderLine::Info(decl) => &decl.id,
                HeaderLine::Format(decl) => &decl.id,
                _ => continue,
            };
            dictionary.push(id);
        }

        Ok(dictionary)
    }

    fn push(&mut self, word: &str) {
        if !self.index.contains_key(word) {
            self.index.insert(word.to_string(), self.words.len());
            self.words.push(word.to_string());
        }
    }

    /// Resolve an index from a record back to its identifier.
    pub fn word(&self, index: i32) -> Result<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.words.get(i))
            .map(String::as_str)
            .ok_or(BcfError::InvalidDictionaryIndex(index))
    }

    /// Index of an identifier, if present.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
