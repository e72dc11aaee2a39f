//! Gradient Utilities
//!
//! Global-norm gradient clipping for the classifier.
//!
//! ## Algorithm
//!
//! ```text
//! norm = √(Σ gradient²)            over every trainable tensor
//! if norm > max_norm:
//!     gradients *= max_norm / norm
//! ```
//!
//! Every tensor is scaled by the same factor, so the update direction is
//! unchanged and only its length is limited. Averaged-embedding models rarely
//! need this; the convolutional encoder with a high learning rate can.

use rayon::prelude::*;

use crate::model::ClassifierGradients;

/// L2 norm over all gradient values
pub fn compute_grad_norm(grads: &ClassifierGradients) -> f32 {
    grads
        .tensors()
        .iter()
        .map(|t| t.data.par_iter().map(|&g| g * g).sum::<f32>())
        .sum::<f32>()
        .sqrt()
}

/// Scale all gradients so their global norm is at most `max_norm`
///
/// Returns the norm before clipping.
pub fn clip_gradients(grads: &mut ClassifierGradients, max_norm: f32) -> f32 {
    let norm = compute_grad_norm(grads);
    if norm > max_norm && norm > 0.0 {
        let scale = max_norm / norm;
        for tensor in grads.tensors_mut() {
            tensor.data.par_iter_mut().for_each(|g| *g *= scale);
        }
    }
    norm
}
