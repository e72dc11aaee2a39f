//! Global Pooling over the Sequence Dimension
//!
//! Pooling collapses `[batch, seq_len, dim]` into one `[batch, dim]` vector
//! per document, whatever the document length.
//!
//! ## Average Pooling
//!
//! ```text
//! out[b, d] = Σ_t x[b, t, d] / count
//! ```
//!
//! `count` is `seq_len` for a plain average, so padding positions pull the
//! average toward the padding row. With masking, `count` is the number of
//! non-padding positions and padding is skipped entirely. A document that is
//! all padding pools to zeros.
//!
//! ## Max Pooling
//!
//! ```text
//! out[b, d] = max_t x[b, t, d]
//! ```
//!
//! The gradient flows only to the position that held the maximum.

use crate::padding::PAD_INDEX;
use crate::tensor::Tensor;

/// Global average pooling, optionally ignoring padding positions
pub struct AveragePooling {
    pub mask_padding: bool,
}

impl AveragePooling {
    pub fn new(mask_padding: bool) -> Self {
        Self { mask_padding }
    }

    /// Forward pass
    ///
    /// `ids` are the word indices that produced `x`; they are only read when
    /// masking.
    pub fn forward(&self, x: &Tensor, ids: &[Vec<usize>]) -> (Tensor, AveragePoolingCache) {
        let (batch, seq_len, dim) = (x.shape[0], x.shape[1], x.shape[2]);
        let mut output = Tensor::zeros(vec![batch, dim]);
        let mut weights = Vec::with_capacity(batch * seq_len);

        for b in 0..batch {
            let row_weights: Vec<f32> = if self.mask_padding {
                let count = ids[b].iter().filter(|&&id| id != PAD_INDEX).count();
                ids[b]
                    .iter()
                    .map(|&id| {
                        if id == PAD_INDEX || count == 0 {
                            0.0
                        } else {
                            1.0 / count as f32
                        }
                    })
                    .collect()
            } else {
                vec![1.0 / seq_len.max(1) as f32; seq_len]
            };

            let out_row = output.row_mut(b);
            for (t, &w) in row_weights.iter().enumerate() {
                if w == 0.0 {
                    continue;
                }
                for (o, &v) in out_row.iter_mut().zip(x.row(b * seq_len + t)) {
                    *o += w * v;
                }
            }
            weights.extend(row_weights);
        }

        (output, AveragePoolingCache { weights, seq_len })
    }

    /// Backward pass: spread each pooled gradient over the positions it averaged
    pub fn backward(&self, grad_out: &Tensor, cache: &AveragePoolingCache) -> Tensor {
        let (batch, dim) = (grad_out.shape[0], grad_out.shape[1]);
        let mut grad = Tensor::zeros(vec![batch, cache.seq_len, dim]);
        for b in 0..batch {
            for t in 0..cache.seq_len {
                let w = cache.weights[b * cache.seq_len + t];
                if w == 0.0 {
                    continue;
                }
                let row = grad.row_mut(b * cache.seq_len + t);
                for (g, &go) in row.iter_mut().zip(grad_out.row(b)) {
                    *g = w * go;
                }
            }
        }
        grad
    }
}

/// Per-position averaging weights from the forward pass
pub struct AveragePoolingCache {
    pub weights: Vec<f32>,
    pub seq_len: usize,
}

/// Global max pooling over the sequence dimension
pub struct MaxPooling;

impl MaxPooling {
    /// Forward pass, remembering which position won for every feature
    pub fn forward(&self, x: &Tensor) -> (Tensor, MaxPoolingCache) {
        let (batch, seq_len, dim) = (x.shape[0], x.shape[1], x.shape[2]);
        let mut output = Tensor::zeros(vec![batch, dim]);
        let mut argmax = vec![0usize; batch * dim];

        for b in 0..batch {
            for d in 0..dim {
                let mut best_t = 0;
                let mut best = f32::NEG_INFINITY;
                for t in 0..seq_len {
                    let v = x.data[(b * seq_len + t) * dim + d];
                    if v > best {
                        best = v;
                        best_t = t;
                    }
                }
                output.data[b * dim + d] = if seq_len == 0 { 0.0 } else { best };
                argmax[b * dim + d] = best_t;
            }
        }

        (output, MaxPoolingCache { argmax, seq_len })
    }

    /// Backward pass: each gradient goes to the winning position only
    pub fn backward(&self, grad_out: &Tensor, cache: &MaxPoolingCache) -> Tensor {
        let (batch, dim) = (grad_out.shape[0], grad_out.shape[1]);
        let mut grad = Tensor::zeros(vec![batch, cache.seq_len, dim]);
        if cache.seq_len == 0 {
            return grad;
        }
        for b in 0..batch {
            for d in 0..dim {
                let t = cache.argmax[b * dim + d];
                grad.data[(b * cache.seq_len + t) * dim + d] = grad_out.data[b * dim + d];
            }
        }
        grad
    }
}

/// Winning positions from the max pooling forward pass
pub struct MaxPoolingCache {
    pub argmax: Vec<usize>,
    pub seq_len: usize,
}
