//! Word-Level Tokenizer
//!
//! Turns raw documents into sequences of integer word indices, the first step
//! of every model in this crate.
//!
//! ## How It Works
//!
//! 1. **Normalize**: lowercase the text and replace punctuation (the filter
//!    characters) with spaces
//! 2. **Split**: break on whitespace into word tokens
//! 3. **Fit**: count how often every word appears in the *training* corpus
//! 4. **Rank**: sort words by descending frequency; the most frequent word gets
//!    index 1, the next index 2, and so on
//! 5. **Encode**: map each word of a document to its index
//!
//! ## Example
//!
//! ```text
//! Corpus: "the cat sat", "the dog sat on the mat"
//!
//! Counts: the=3, sat=2, cat=1, dog=1, on=1, mat=1
//! Index:  the=1, sat=2, cat=3, dog=4, on=5, mat=6
//!
//! "the cat sat on a mat" -> [1, 3, 2, 5, 6]     ("a" was never seen: dropped)
//! ```
//!
//! ## Index 0 Is Reserved
//!
//! Ranks start at 1 because index 0 is the padding value used by
//! [`pad_sequences`](crate::padding::pad_sequences). A real word never maps to
//! 0, so padding can't be confused with a word during embedding lookup.
//!
//! ## Vocabulary Cap
//!
//! With `num_words = Some(n)` only indices `1..n` are emitted: the `n - 1`
//! most frequent words. Rarer words are dropped from encoded sequences exactly
//! like unseen words. There is no out-of-vocabulary token.
//!
//! ## Avoiding Leakage
//!
//! Fit on the training split only. The test split is encoded with the
//! vocabulary learned from training text.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Punctuation stripped before splitting
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Documents below this count are encoded sequentially
const PARALLEL_ENCODE_MIN_DOCS: usize = 64;

/// A frequency-ranked word tokenizer
///
/// Holds the word counts accumulated by [`fit_on_texts`](Self::fit_on_texts)
/// and the index derived from them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WordTokenizer {
    /// Maximum number of indices to emit (index 0 included), `None` = unlimited
    num_words: Option<usize>,

    /// Characters replaced by spaces before splitting
    filters: String,

    /// Lowercase text before splitting
    lower: bool,

    /// Word counts in first-seen order (the tie-break for equal counts)
    word_counts: Vec<(String, usize)>,

    /// Position of each word in `word_counts`
    count_slot: HashMap<String, usize>,

    /// Word -> index (1-based, frequency-ranked)
    word_index: HashMap<String, usize>,

    /// Index -> word; slot 0 is the empty padding entry
    index_word: Vec<String>,

    /// Number of documents seen by `fit_on_texts`
    document_count: usize,
}

impl Default for WordTokenizer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl WordTokenizer {
    /// Create an empty tokenizer
    ///
    /// # Arguments
    ///
    /// * `num_words` - Vocabulary cap including the reserved index 0 (the
    ///   notebook uses 20 000); `None` keeps every word
    pub fn new(num_words: Option<usize>) -> Self {
        Self {
            num_words,
            filters: DEFAULT_FILTERS.to_string(),
            lower: true,
            word_counts: Vec::new(),
            count_slot: HashMap::new(),
            word_index: HashMap::new(),
            index_word: vec![String::new()],
            document_count: 0,
        }
    }

    /// Replace the punctuation filter set
    pub fn with_filters(mut self, filters: &str) -> Self {
        self.filters = filters.to_string();
        self
    }

    /// Enable or disable lowercasing
    pub fn with_lowercase(mut self, lower: bool) -> Self {
        self.lower = lower;
        self
    }

    /// Split text into normalized word tokens
    ///
    /// ```rust
    /// # use wordbag::WordTokenizer;
    /// let tokenizer = WordTokenizer::new(None);
    /// let words = tokenizer.text_to_word_sequence("Hello, World! It's 4:30.");
    /// assert_eq!(words, vec!["hello", "world", "it's", "4", "30"]);
    /// ```
    pub fn text_to_word_sequence(&self, text: &str) -> Vec<String> {
        let normalized: String = text
            .chars()
            .map(|c| if self.filters.contains(c) { ' ' } else { c })
            .collect();
        let normalized = if self.lower {
            normalized.to_lowercase()
        } else {
            normalized
        };
        normalized.split_whitespace().map(str::to_string).collect()
    }

    /// Learn word frequencies from a training corpus
    ///
    /// May be called several times; counts accumulate and the index is
    /// rebuilt after every call.
    pub fn fit_on_texts<S: AsRef<str>>(&mut self, texts: &[S]) {
        for text in texts {
            self.document_count += 1;
            for word in self.text_to_word_sequence(text.as_ref()) {
                match self.count_slot.get(&word) {
                    Some(&slot) => self.word_counts[slot].1 += 1,
                    None => {
                        self.count_slot.insert(word.clone(), self.word_counts.len());
                        self.word_counts.push((word, 1));
                    }
                }
            }
        }
        self.rebuild_index();

        log::info!(
            "Fitted tokenizer on {} documents: {} distinct words, vocab size {}",
            self.document_count,
            self.word_counts.len(),
            self.vocab_size()
        );
    }

    /// Rank words by count (descending), keeping first-seen order on ties
    fn rebuild_index(&mut self) {
        let mut ranked: Vec<&(String, usize)> = self.word_counts.iter().collect();
        // sort_by is stable, so equal counts keep first-seen order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        self.word_index.clear();
        self.index_word.clear();
        self.index_word.push(String::new());
        for (rank, (word, _)) in ranked.into_iter().enumerate() {
            self.word_index.insert(word.clone(), rank + 1);
            self.index_word.push(word.clone());
        }
    }

    /// Whether an index is emitted under the vocabulary cap
    fn in_vocab(&self, index: usize) -> bool {
        index != 0 && index < self.vocab_size()
    }

    /// Encode one document, dropping unknown and capped words
    pub fn text_to_sequence(&self, text: &str) -> Vec<usize> {
        self.text_to_word_sequence(text)
            .iter()
            .filter_map(|word| self.word_index.get(word).copied())
            .filter(|&idx| self.in_vocab(idx))
            .collect()
    }

    /// Encode many documents
    ///
    /// Large corpora are encoded in parallel across documents; the output
    /// order always matches the input order.
    pub fn texts_to_sequences<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Vec<usize>> {
        if texts.len() >= PARALLEL_ENCODE_MIN_DOCS {
            texts
                .par_iter()
                .map(|t| self.text_to_sequence(t.as_ref()))
                .collect()
        } else {
            texts
                .iter()
                .map(|t| self.text_to_sequence(t.as_ref()))
                .collect()
        }
    }

    /// Decode index sequences back to space-joined words
    ///
    /// Padding (0) and indices outside the capped vocabulary are skipped.
    pub fn sequences_to_texts(&self, sequences: &[Vec<usize>]) -> Vec<String> {
        sequences
            .iter()
            .map(|seq| {
                seq.iter()
                    .filter(|&&idx| self.in_vocab(idx))
                    .filter_map(|&idx| self.index_word(idx))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Full word -> index map (uncapped; filter with `index < vocab_size()`)
    pub fn word_index(&self) -> &HashMap<String, usize> {
        &self.word_index
    }

    /// Word for an index, `None` for 0 or unknown indices
    pub fn index_word(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.index_word.get(index).map(String::as_str)
    }

    /// Number of rows an embedding table needs for this tokenizer
    ///
    /// Equals `min(num_words, distinct_words + 1)`, counting padding row 0.
    pub fn vocab_size(&self) -> usize {
        let full = self.word_counts.len() + 1;
        match self.num_words {
            Some(cap) => cap.min(full),
            None => full,
        }
    }

    /// The configured vocabulary cap
    pub fn num_words(&self) -> Option<usize> {
        self.num_words
    }

    /// Number of documents the tokenizer was fitted on
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// How many times `word` appeared in the fitted corpus
    pub fn word_count(&self, word: &str) -> usize {
        self.count_slot
            .get(word)
            .map_or(0, |&slot| self.word_counts[slot].1)
    }

    /// Save the tokenizer as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a tokenizer saved with [`save`](Self::save)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Summary statistics about the fitted vocabulary
    pub fn stats(&self) -> TokenizerStats {
        TokenizerStats {
            distinct_words: self.word_counts.len(),
            vocab_size: self.vocab_size(),
            documents: self.document_count,
            total_words: self.word_counts.iter().map(|(_, c)| c).sum(),
        }
    }
}

/// Statistics about a fitted tokenizer
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerStats {
    /// Distinct words seen during fitting
    pub distinct_words: usize,
    /// Rows in the embedding table (capped, includes padding row)
    pub vocab_size: usize,
    /// Documents seen during fitting
    pub documents: usize,
    /// Total word occurrences seen during fitting
    pub total_words: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(num_words: Option<usize>) -> WordTokenizer {
        let mut tokenizer = WordTokenizer::new(num_words);
        tokenizer.fit_on_texts(&["the cat sat", "the dog sat on the mat"]);
        tokenizer
    }

    #[test]
    fn test_text_to_word_sequence_strips_filters() {
        let tokenizer = WordTokenizer::new(None);
        assert_eq!(
            tokenizer.text_to_word_sequence("From: john@example.com\n\tRe: (GPU)"),
            vec!["from", "john", "example", "com", "re", "gpu"]
        );
    }

    #[test]
    fn test_frequency_ranking() {
        let tokenizer = fitted(None);
        let idx = tokenizer.word_index();
        assert_eq!(idx["the"], 1);
        assert_eq!(idx["sat"], 2);
        // Ties keep first-seen order
        assert_eq!(idx["cat"], 3);
        assert_eq!(idx["dog"], 4);
        assert_eq!(idx["on"], 5);
        assert_eq!(idx["mat"], 6);
    }

    #[test]
    fn test_index_zero_never_assigned() {
        let tokenizer = fitted(None);
        assert!(tokenizer.word_index().values().all(|&i| i != 0));
        assert_eq!(tokenizer.index_word(0), None);
    }

    #[test]
    fn test_unknown_words_are_dropped() {
        let tokenizer = fitted(None);
        let seqs = tokenizer.texts_to_sequences(&["the zebra sat on a mat"]);
        assert_eq!(seqs, vec![vec![1, 2, 5, 6]]);
    }

    #[test]
    fn test_num_words_caps_indices() {
        // num_words = 3 keeps indices 1 and 2 only
        let tokenizer = fitted(Some(3));
        assert_eq!(tokenizer.vocab_size(), 3);
        let seqs = tokenizer.texts_to_sequences(&["the cat sat on the mat"]);
        assert_eq!(seqs, vec![vec![1, 2, 1]]);
    }

    #[test]
    fn test_vocab_size_uncapped() {
        let tokenizer = fitted(Some(100));
        assert_eq!(tokenizer.vocab_size(), 7);
    }

    #[test]
    fn test_sequences_to_texts() {
        let tokenizer = fitted(None);
        let texts = tokenizer.sequences_to_texts(&[vec![1, 3, 2, 0, 0]]);
        assert_eq!(texts, vec!["the cat sat"]);
    }

    #[test]
    fn test_fit_accumulates() {
        let mut tokenizer = fitted(None);
        tokenizer.fit_on_texts(&["mat mat mat mat"]);
        assert_eq!(tokenizer.word_count("mat"), 5);
        assert_eq!(tokenizer.word_index()["mat"], 1);
        assert_eq!(tokenizer.document_count(), 3);
    }

    #[test]
    fn test_parallel_encoding_preserves_order() {
        let tokenizer = fitted(None);
        let docs: Vec<String> = (0..200)
            .map(|i| if i % 2 == 0 { "the cat".into() } else { "dog".into() })
            .collect();
        let seqs = tokenizer.texts_to_sequences(&docs);
        for (i, seq) in seqs.iter().enumerate() {
            let expected = if i % 2 == 0 { vec![1, 3] } else { vec![4] };
            assert_eq!(seq, &expected);
        }
    }

    #[test]
    fn test_stats() {
        let stats = fitted(None).stats();
        assert_eq!(stats.distinct_words, 6);
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.total_words, 9);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tokenizer = fitted(Some(5));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        tokenizer.save(&path).unwrap();
        let loaded = WordTokenizer::load(&path).unwrap();
        assert_eq!(
            loaded.texts_to_sequences(&["the cat sat on the mat"]),
            tokenizer.texts_to_sequences(&["the cat sat on the mat"])
        );
        assert_eq!(loaded.num_words(), Some(5));
    }
}
