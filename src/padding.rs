//! Sequence Padding and Truncation
//!
//! Models consume fixed-length rows, but documents come in every length. After
//! tokenization each sequence is brought to exactly `maxlen` entries:
//!
//! ```text
//! maxlen = 5, padding value 0
//!
//! [4, 8, 15]               -> [4, 8, 15, 0, 0]        (trailing zeros)
//! [4, 8, 15, 16, 23, 42]   -> [8, 15, 16, 23, 42]     (Truncating::Pre)
//!                          -> [4, 8, 15, 16, 23]      (Truncating::Post)
//! ```
//!
//! Padding always goes at the end. Truncation removes tokens from the front
//! (`Pre`, the default) or the back (`Post`).

use serde::{Deserialize, Serialize};

/// Index used for padding; never assigned to a real word
pub const PAD_INDEX: usize = 0;

/// Which end of an over-long sequence gets cut
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Truncating {
    /// Drop tokens from the front, keep the end of the document
    #[default]
    Pre,
    /// Drop tokens from the back, keep the start of the document
    Post,
}

/// Pad or truncate one sequence to exactly `maxlen` entries
pub fn pad_sequence(sequence: &[usize], maxlen: usize, truncating: Truncating) -> Vec<usize> {
    let kept = if sequence.len() > maxlen {
        match truncating {
            Truncating::Pre => &sequence[sequence.len() - maxlen..],
            Truncating::Post => &sequence[..maxlen],
        }
    } else {
        sequence
    };

    let mut padded = Vec::with_capacity(maxlen);
    padded.extend_from_slice(kept);
    padded.resize(maxlen, PAD_INDEX);
    padded
}

/// Pad or truncate every sequence to exactly `maxlen` entries
///
/// # Example
///
/// ```rust
/// use wordbag::padding::{pad_sequences, Truncating};
///
/// let padded = pad_sequences(&[vec![1, 2], vec![1, 2, 3, 4]], 3, Truncating::Pre);
/// assert_eq!(padded, vec![vec![1, 2, 0], vec![2, 3, 4]]);
/// ```
pub fn pad_sequences(
    sequences: &[Vec<usize>],
    maxlen: usize,
    truncating: Truncating,
) -> Vec<Vec<usize>> {
    sequences
        .iter()
        .map(|s| pad_sequence(s, maxlen, truncating))
        .collect()
}

/// Length of the longest sequence (0 for an empty list)
pub fn max_sequence_len(sequences: &[Vec<usize>]) -> usize {
    sequences.iter().map(Vec::len).max().unwrap_or(0)
}

/// Length statistics used to pick a `maxlen`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthStats {
    pub mean: f32,
    pub max: usize,
    /// Fraction of sequences that would be truncated at the given `maxlen`
    pub truncated_fraction: f32,
}

/// Summarize sequence lengths relative to a candidate `maxlen`
pub fn sequence_length_stats(sequences: &[Vec<usize>], maxlen: usize) -> LengthStats {
    if sequences.is_empty() {
        return LengthStats {
            mean: 0.0,
            max: 0,
            truncated_fraction: 0.0,
        };
    }
    let total: usize = sequences.iter().map(Vec::len).sum();
    let truncated = sequences.iter().filter(|s| s.len() > maxlen).count();
    LengthStats {
        mean: total as f32 / sequences.len() as f32,
        max: max_sequence_len(sequences),
        truncated_fraction: truncated as f32 / sequences.len() as f32,
    }
}
