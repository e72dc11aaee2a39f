//! Transfer Learning: Embedding Matrix from Pre-trained Vectors
//!
//! Builds the first layer of the classifier from GloVe vectors instead of
//! random noise. Row `i` of the matrix is the pre-trained vector of the word
//! the tokenizer mapped to index `i`:
//!
//! ```text
//! tokenizer: the=1, cat=2, xyzzy=3          glove: the, cat (no xyzzy)
//!
//! row 0  [0.0, 0.0, ...]    padding, never written
//! row 1  glove["the"]
//! row 2  glove["cat"]
//! row 3  [0.0, 0.0, ...]    not in GloVe: left at zero
//! ```
//!
//! Words missing from the pre-trained table keep an all-zero row. That is
//! expected, not an error. The number of words that did get a vector is
//! reported so coverage can be checked.

use crate::embeddings::PretrainedEmbeddings;
use crate::tensor::Tensor;
use crate::tokenizer::WordTokenizer;

/// Embedding matrix initialized from pre-trained vectors
#[derive(Debug, Clone)]
pub struct TransferMatrix {
    /// `[max_words, dim]` matrix, row 0 is padding
    pub matrix: Tensor,
    /// How many vocabulary rows received a pre-trained vector
    pub words_found: usize,
}

impl TransferMatrix {
    /// Fraction of word rows (row 0 excluded) that received a vector
    pub fn coverage(&self) -> f32 {
        let word_rows = self.matrix.shape[0].saturating_sub(1);
        if word_rows == 0 {
            0.0
        } else {
            self.words_found as f32 / word_rows as f32
        }
    }
}

/// Copy pre-trained vectors into a `[max_words, dim]` matrix
///
/// Only words with tokenizer index `< max_words` are considered, so
/// nothing is ever written outside the matrix and `words_found < max_words`.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use wordbag::{build_embedding_matrix, PretrainedEmbeddings, WordTokenizer};
///
/// let glove = PretrainedEmbeddings::from_reader(Cursor::new("cat 1.0 2.0\n"), None)?;
/// let mut tokenizer = WordTokenizer::new(None);
/// tokenizer.fit_on_texts(&["cat cat dog"]);
///
/// let transfer = build_embedding_matrix(&tokenizer, &glove, 3);
/// assert_eq!(transfer.words_found, 1);
/// assert_eq!(transfer.matrix.row(1), &[1.0, 2.0]);  // cat
/// assert_eq!(transfer.matrix.row(2), &[0.0, 0.0]);  // dog: not in GloVe
/// # Ok::<(), wordbag::WordbagError>(())
/// ```
pub fn build_embedding_matrix(
    tokenizer: &WordTokenizer,
    pretrained: &PretrainedEmbeddings,
    max_words: usize,
) -> TransferMatrix {
    let dim = pretrained.dim();
    let mut matrix = Tensor::zeros(vec![max_words, dim]);
    let mut words_found = 0;

    for (word, &index) in tokenizer.word_index() {
        if index == 0 || index >= max_words {
            continue;
        }
        if let Some(vector) = pretrained.get(word) {
            matrix.row_mut(index).copy_from_slice(vector);
            words_found += 1;
        }
    }

    let transfer = TransferMatrix {
        matrix,
        words_found,
    };
    log::info!(
        "Embedding matrix {:?}: {} words found in pre-trained table ({:.1}% coverage)",
        transfer.matrix.shape,
        words_found,
        transfer.coverage() * 100.0
    );
    transfer
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn glove() -> PretrainedEmbeddings {
        let text = "the 1.0 0.0\ncat 0.0 1.0\nsat 0.5 0.5\nmat 0.2 0.8\n";
        PretrainedEmbeddings::from_reader(Cursor::new(text), None).unwrap()
    }

    fn tokenizer() -> WordTokenizer {
        let mut t = WordTokenizer::new(None);
        // the=1, sat=2, cat=3, xyzzy=4, mat=5
        t.fit_on_texts(&["the the the sat sat cat xyzzy mat"]);
        t
    }

    #[test]
    fn test_rows_copied_by_index() {
        let transfer = build_embedding_matrix(&tokenizer(), &glove(), 10);
        assert_eq!(transfer.matrix.shape, vec![10, 2]);
        assert_eq!(transfer.matrix.row(1), &[1.0, 0.0]);
        assert_eq!(transfer.matrix.row(2), &[0.5, 0.5]);
        assert_eq!(transfer.matrix.row(3), &[0.0, 1.0]);
        assert_eq!(transfer.matrix.row(5), &[0.2, 0.8]);
        assert_eq!(transfer.words_found, 4);
    }

    #[test]
    fn test_oov_and_padding_rows_stay_zero() {
        let transfer = build_embedding_matrix(&tokenizer(), &glove(), 10);
        assert_eq!(transfer.matrix.row(0), &[0.0, 0.0]);
        assert_eq!(transfer.matrix.row(4), &[0.0, 0.0]);
        for row in 6..10 {
            assert_eq!(transfer.matrix.row(row), &[0.0, 0.0]);
        }
    }

    #[test]
    fn test_cap_limits_rows_and_count() {
        let transfer = build_embedding_matrix(&tokenizer(), &glove(), 3);
        assert_eq!(transfer.matrix.shape, vec![3, 2]);
        assert_eq!(transfer.words_found, 2);
        assert!(transfer.words_found < 3);
        assert!((transfer.coverage() - 1.0).abs() < 1e-6);
    }
}
