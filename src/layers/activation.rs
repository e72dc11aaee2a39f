//! Activations and the Classification Loss
//!
//! ## ReLU
//!
//! ```text
//! relu(x)  = max(0, x)
//! relu'(x) = 1 if x > 0 else 0
//! ```
//!
//! Used after the convolution and after the optional hidden dense layer.
//!
//! ## Softmax Cross-Entropy
//!
//! The output layer produces one logit per class. Softmax turns them into a
//! probability distribution and cross-entropy scores it against the true
//! label:
//!
//! ```text
//! p     = softmax(logits)
//! loss  = -mean(log p[label])
//! dloss/dlogits = (p - onehot(label)) / batch
//! ```
//!
//! Fusing the two gives that simple gradient. Labels are class indices,
//! which is the same as comparing against one-hot target rows.

use rayon::prelude::*;

use crate::tensor::Tensor;

/// Probabilities are clamped to this floor before taking the log
const LOG_EPSILON: f32 = 1e-7;

/// ReLU (forward pass)
pub fn relu_forward(x: &Tensor) -> Tensor {
    let result = x.data.par_iter().map(|&v| v.max(0.0)).collect();
    Tensor::new(result, x.shape.clone())
}

/// ReLU (backward pass)
///
/// `x` is the pre-activation input from the forward pass.
pub fn relu_backward(grad_out: &Tensor, x: &Tensor) -> Tensor {
    let result = grad_out
        .data
        .par_iter()
        .zip(&x.data)
        .map(|(&g, &v)| if v > 0.0 { g } else { 0.0 })
        .collect();
    Tensor::new(result, x.shape.clone())
}

/// Mean cross-entropy of softmax probabilities against integer labels
///
/// `probs` has shape `[batch, classes]`.
pub fn cross_entropy(probs: &Tensor, labels: &[usize]) -> f32 {
    assert_eq!(probs.rows(), labels.len(), "One label per row expected");
    if labels.is_empty() {
        return 0.0;
    }
    let total: f32 = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| -probs.row(i)[label].max(LOG_EPSILON).ln())
        .sum();
    total / labels.len() as f32
}

/// Gradient of the mean cross-entropy with respect to the logits
pub fn softmax_cross_entropy_backward(probs: &Tensor, labels: &[usize]) -> Tensor {
    let batch = labels.len().max(1) as f32;
    let mut grad = probs.clone();
    for (i, &label) in labels.iter().enumerate() {
        let row = grad.row_mut(i);
        row[label] -= 1.0;
        for g in row.iter_mut() {
            *g /= batch;
        }
    }
    grad
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu() {
        let x = Tensor::new(vec![-1.0, 0.0, 2.0], vec![3]);
        assert_eq!(relu_forward(&x).data, vec![0.0, 0.0, 2.0]);
        let g = relu_backward(&Tensor::new(vec![5.0, 5.0, 5.0], vec![3]), &x);
        assert_eq!(g.data, vec![0.0, 0.0, 5.0]);
    }

    #[test]
    fn test_uniform_prediction_loss_is_log_classes() {
        let probs = Tensor::new(vec![0.25; 8], vec![2, 4]);
        let loss = cross_entropy(&probs, &[0, 3]);
        assert!((loss - 4.0f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_backward_rows_sum_to_zero() {
        let probs = Tensor::new(vec![0.7, 0.2, 0.1, 0.3, 0.3, 0.4], vec![2, 3]);
        let grad = softmax_cross_entropy_backward(&probs, &[0, 2]);
        for i in 0..2 {
            let sum: f32 = grad.row(i).iter().sum();
            assert!(sum.abs() < 1e-6);
        }
        assert!((grad.row(0)[0] - (-0.15)).abs() < 1e-6);
    }
}
