//! Embedding Layer
//!
//! Maps every word index of a padded batch to a dense vector:
//!
//! ```text
//! Input:  [batch, seq_len]          word indices
//! Weight: [vocab_size, dim]         one row per index (row 0 = padding)
//! Output: [batch, seq_len, dim]
//! ```
//!
//! ## Backward Pass
//!
//! A lookup copies rows, so the gradient of a row is the sum of the output
//! gradients at every position that used it (a scatter-add).
//!
//! ## Frozen Embeddings
//!
//! A table built from pre-trained vectors can be frozen. A frozen layer
//! produces no gradient and the optimizer never touches it.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::linear::uniform_init;
use crate::tensor::Tensor;

/// Half-width of the uniform range for random initialization
const INIT_LIMIT: f32 = 0.05;

/// Lookup table from word index to vector
pub struct TrainableEmbedding {
    /// `[vocab_size, dim]`
    pub weight: Tensor,
    /// Whether training updates the table
    pub trainable: bool,
}

impl TrainableEmbedding {
    /// Random `U(-0.05, 0.05)` table
    pub fn new(vocab_size: usize, dim: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            weight: Tensor::new(
                uniform_init(vocab_size * dim, INIT_LIMIT, &mut rng),
                vec![vocab_size, dim],
            ),
            trainable: true,
        }
    }

    /// Table initialized from an existing `[vocab_size, dim]` matrix
    pub fn from_matrix(matrix: Tensor, trainable: bool) -> Self {
        assert_eq!(matrix.shape.len(), 2, "Embedding matrix must be 2D");
        Self {
            weight: matrix,
            trainable,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.weight.shape[0]
    }

    pub fn dim(&self) -> usize {
        self.weight.shape[1]
    }

    /// Forward pass: gather one row per index
    ///
    /// # Panics
    ///
    /// Panics on ragged batches or indices `>= vocab_size`
    pub fn forward(&self, ids: &[Vec<usize>]) -> Tensor {
        let batch = ids.len();
        let seq_len = ids.first().map_or(0, Vec::len);
        let dim = self.dim();

        let mut output = Vec::with_capacity(batch * seq_len * dim);
        for row in ids {
            assert_eq!(row.len(), seq_len, "All sequences in a batch must have the same length");
            for &id in row {
                assert!(
                    id < self.vocab_size(),
                    "Word index {} out of range (vocab_size = {})",
                    id,
                    self.vocab_size()
                );
                output.extend_from_slice(self.weight.row(id));
            }
        }
        Tensor::new(output, vec![batch, seq_len, dim])
    }

    /// Backward pass: scatter-add output gradients into table rows
    ///
    /// Returns `None` for a frozen table.
    pub fn backward(&self, grad_out: &Tensor, ids: &[Vec<usize>]) -> Option<Tensor> {
        if !self.trainable {
            return None;
        }
        let mut grad = Tensor::zeros(self.weight.shape.clone());
        let positions = ids.iter().flat_map(|row| row.iter());
        for (pos, &id) in positions.enumerate() {
            for (g, &go) in grad.row_mut(id).iter_mut().zip(grad_out.row(pos)) {
                *g += go;
            }
        }
        Some(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> TrainableEmbedding {
        let matrix = Tensor::new(vec![0.0, 0.0, 1.0, 2.0, 3.0, 4.0], vec![3, 2]);
        TrainableEmbedding::from_matrix(matrix, true)
    }

    #[test]
    fn test_forward_gathers_rows() {
        let out = layer().forward(&[vec![2, 1, 0]]);
        assert_eq!(out.shape, vec![1, 3, 2]);
        assert_eq!(out.data, vec![3.0, 4.0, 1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_backward_accumulates_repeated_ids() {
        let ids = vec![vec![1, 1], vec![2, 1]];
        let grad_out = Tensor::new(vec![1.0, 1.0, 2.0, 2.0, 5.0, 5.0, 3.0, 3.0], vec![2, 2, 2]);
        let grad = layer().backward(&grad_out, &ids).unwrap();
        assert_eq!(grad.row(0), &[0.0, 0.0]);
        assert_eq!(grad.row(1), &[6.0, 6.0]);
        assert_eq!(grad.row(2), &[5.0, 5.0]);
    }

    #[test]
    fn test_frozen_layer_has_no_gradient() {
        let mut frozen = layer();
        frozen.trainable = false;
        let grad_out = Tensor::zeros(vec![1, 1, 2]);
        assert!(frozen.backward(&grad_out, &[vec![1]]).is_none());
    }

    #[test]
    fn test_random_init_is_small() {
        let layer = TrainableEmbedding::new(100, 8, 3);
        assert!(layer.weight.data.iter().all(|w| w.abs() <= INIT_LIMIT));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_id_panics() {
        layer().forward(&[vec![3]]);
    }
}
