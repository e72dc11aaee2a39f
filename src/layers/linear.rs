//! Linear Layer (Fully Connected)
//!
//! Performs an affine transformation: y = x @ W + b
//!
//! ## Forward Pass
//!
//! ```text
//! Input:  x [rows, in_features]
//! Weight: W [in_features, out_features]
//! Bias:   b [out_features]
//! Output: y = x @ W + b [rows, out_features]
//! ```
//!
//! ## Backward Pass
//!
//! ```text
//! grad_W = x^T @ grad_y
//! grad_b = sum(grad_y, axis=0)
//! grad_x = grad_y @ W^T
//! ```
//!
//! The same layer is the classification head, the optional hidden layer, and
//! (applied to unfolded windows) the convolution.
//!
//! ## Initialization
//!
//! Glorot uniform: `W ~ U(-l, l)` with `l = √(6 / (in + out))`. Bias starts at
//! zero. The generator is seeded so a config always builds the same model.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

use crate::tensor::Tensor;

/// Draw `size` values uniformly from `[-limit, limit]`
pub fn uniform_init(size: usize, limit: f32, rng: &mut StdRng) -> Vec<f32> {
    match Uniform::new_inclusive(-limit, limit) {
        Ok(dist) => (0..size).map(|_| dist.sample(rng)).collect(),
        Err(_) => vec![0.0; size],
    }
}

/// Fully connected layer
pub struct TrainableLinear {
    pub weight: Tensor,
    pub bias: Tensor,
}

impl TrainableLinear {
    /// Create a layer with Glorot-uniform weights
    pub fn new(in_features: usize, out_features: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let limit = (6.0 / (in_features + out_features).max(1) as f32).sqrt();
        Self {
            weight: Tensor::new(
                uniform_init(in_features * out_features, limit, &mut rng),
                vec![in_features, out_features],
            ),
            bias: Tensor::zeros(vec![out_features]),
        }
    }

    pub fn in_features(&self) -> usize {
        self.weight.shape[0]
    }

    pub fn out_features(&self) -> usize {
        self.weight.shape[1]
    }

    /// Number of trainable values
    pub fn num_parameters(&self) -> usize {
        self.weight.numel() + self.bias.numel()
    }

    /// Forward pass, caching the input for backward
    pub fn forward(&self, x: &Tensor) -> (Tensor, LinearCache) {
        let y = x.matmul(&self.weight).add_row(&self.bias);
        (y, LinearCache { x: x.clone() })
    }

    /// Backward pass
    pub fn backward(&self, grad_out: &Tensor, cache: &LinearCache) -> LinearGradients {
        LinearGradients {
            weight: cache.x.transpose().matmul(grad_out),
            bias: grad_out.sum_rows(),
            x: grad_out.matmul(&self.weight.transpose()),
        }
    }
}

/// Cache for the linear backward pass
pub struct LinearCache {
    pub x: Tensor,
}

/// Gradients for a linear layer
pub struct LinearGradients {
    pub weight: Tensor,
    pub bias: Tensor,
    pub x: Tensor, // passed on to the previous layer
}
