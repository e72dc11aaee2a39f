//! 1-D Convolution over Word Embeddings
//!
//! A convolution slides a window of `kernel_size` consecutive word vectors
//! along the document and applies the same dense layer to every window. Each
//! output filter acts as an n-gram detector.
//!
//! ## Unfold, Then Multiply
//!
//! ```text
//! x:        [batch, seq_len, dim]
//! windows:  [batch * out_len, kernel_size * dim]    out_len = seq_len - kernel_size + 1
//! output:   windows @ W + b -> [batch, out_len, filters]
//! ```
//!
//! Unfolding the windows into rows turns the convolution into one matrix
//! multiplication, so the forward and backward passes reuse
//! [`TrainableLinear`]. Backward folds the window gradients back onto the
//! positions they came from, summing where windows overlap.
//!
//! Valid padding, stride 1.

use super::linear::{LinearCache, LinearGradients, TrainableLinear};
use crate::tensor::Tensor;

/// 1-D convolution implemented as unfold + dense layer
pub struct TrainableConv1d {
    pub kernel_size: usize,
    /// Dense layer over unfolded windows: `[kernel_size * in_dim, filters]`
    pub linear: TrainableLinear,
}

impl TrainableConv1d {
    pub fn new(in_dim: usize, filters: usize, kernel_size: usize, seed: u64) -> Self {
        assert!(kernel_size > 0, "Kernel size must be positive");
        Self {
            kernel_size,
            linear: TrainableLinear::new(kernel_size * in_dim, filters, seed),
        }
    }

    pub fn filters(&self) -> usize {
        self.linear.out_features()
    }

    /// Output length for an input of `seq_len` positions
    pub fn output_len(&self, seq_len: usize) -> usize {
        (seq_len + 1).saturating_sub(self.kernel_size)
    }

    /// Unfold `[batch, seq_len, dim]` into one row per window
    fn unfold(&self, x: &Tensor) -> Tensor {
        let (batch, seq_len, dim) = (x.shape[0], x.shape[1], x.shape[2]);
        let out_len = self.output_len(seq_len);
        let width = self.kernel_size * dim;
        let mut windows = Vec::with_capacity(batch * out_len * width);
        for b in 0..batch {
            for t in 0..out_len {
                let start = (b * seq_len + t) * dim;
                windows.extend_from_slice(&x.data[start..start + width]);
            }
        }
        Tensor::new(windows, vec![batch * out_len, width])
    }

    /// Forward pass: `[batch, seq_len, dim] -> [batch, out_len, filters]`
    ///
    /// # Panics
    ///
    /// Panics if `seq_len < kernel_size`
    pub fn forward(&self, x: &Tensor) -> (Tensor, Conv1dCache) {
        let (batch, seq_len) = (x.shape[0], x.shape[1]);
        assert!(
            seq_len >= self.kernel_size,
            "Sequence length {} shorter than kernel size {}",
            seq_len,
            self.kernel_size
        );
        let out_len = self.output_len(seq_len);
        let (y, linear) = self.linear.forward(&self.unfold(x));
        let cache = Conv1dCache {
            linear,
            input_shape: x.shape.clone(),
        };
        (y.reshape(&[batch, out_len, self.filters()]), cache)
    }

    /// Backward pass
    ///
    /// `grad_out` has shape `[batch, out_len, filters]`. The returned `x`
    /// gradient has the input shape.
    pub fn backward(&self, grad_out: &Tensor, cache: &Conv1dCache) -> Conv1dGradients {
        let flat = grad_out.reshape(&[grad_out.rows(), self.filters()]);
        let LinearGradients { weight, bias, x } = self.linear.backward(&flat, &cache.linear);

        let (batch, seq_len, dim) = (
            cache.input_shape[0],
            cache.input_shape[1],
            cache.input_shape[2],
        );
        let out_len = self.output_len(seq_len);
        let width = self.kernel_size * dim;
        let mut grad_x = Tensor::zeros(cache.input_shape.clone());
        for b in 0..batch {
            for t in 0..out_len {
                let window = x.row(b * out_len + t);
                let start = (b * seq_len + t) * dim;
                for (g, &w) in grad_x.data[start..start + width].iter_mut().zip(window) {
                    *g += w;
                }
            }
        }

        Conv1dGradients {
            weight,
            bias,
            x: grad_x,
        }
    }
}

/// Cache for the convolution backward pass
pub struct Conv1dCache {
    pub linear: LinearCache,
    pub input_shape: Vec<usize>,
}

/// Gradients for a convolution layer
pub struct Conv1dGradients {
    pub weight: Tensor,
    pub bias: Tensor,
    pub x: Tensor,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summing_conv() -> TrainableConv1d {
        // One filter that sums a 2-word window of 1-d vectors
        let mut conv = TrainableConv1d::new(1, 1, 2, 0);
        conv.linear.weight = Tensor::new(vec![1.0, 1.0], vec![2, 1]);
        conv
    }

    #[test]
    fn test_forward_sums_windows() {
        let conv = summing_conv();
        let x = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![1, 4, 1]);
        let (y, _) = conv.forward(&x);
        assert_eq!(y.shape, vec![1, 3, 1]);
        assert_eq!(y.data, vec![3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_backward_folds_overlapping_windows() {
        let conv = summing_conv();
        let x = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![1, 4, 1]);
        let (_, cache) = conv.forward(&x);
        let grads = conv.backward(&Tensor::new(vec![1.0, 1.0, 1.0], vec![1, 3, 1]), &cache);
        // Inner positions belong to two windows each
        assert_eq!(grads.x.data, vec![1.0, 2.0, 2.0, 1.0]);
        assert_eq!(grads.bias.data, vec![3.0]);
        assert_eq!(grads.weight.data, vec![6.0, 9.0]);
    }

    #[test]
    fn test_output_len() {
        let conv = TrainableConv1d::new(4, 8, 5, 0);
        assert_eq!(conv.output_len(20), 16);
        assert_eq!(conv.output_len(5), 1);
    }
}
