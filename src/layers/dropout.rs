//! Dropout Layer
//!
//! Dropout zeros a random fraction of the pooled document features during
//! training so the classification head can't lean on any single feature.
//! Kept values are scaled by `1 / (1 - rate)` so the expected activation is
//! unchanged, which means inference is a plain pass-through.

use rand::rngs::StdRng;
use rand::Rng;

use crate::tensor::Tensor;

/// Inverted dropout
pub struct TrainableDropout {
    pub rate: f32,
}

impl TrainableDropout {
    /// Create a dropout layer
    ///
    /// # Panics
    ///
    /// Panics unless `0.0 <= rate < 1.0`
    pub fn new(rate: f32) -> Self {
        assert!(
            (0.0..1.0).contains(&rate),
            "Dropout rate must be in [0.0, 1.0), got {}",
            rate
        );
        Self { rate }
    }

    /// Forward pass
    ///
    /// Dropout is only applied when a random generator is supplied; `None`
    /// means inference and the input passes through unchanged.
    pub fn forward(&self, x: &Tensor, rng: Option<&mut StdRng>) -> (Tensor, DropoutCache) {
        let rng = match rng {
            Some(rng) if self.rate > 0.0 => rng,
            _ => {
                let cache = DropoutCache {
                    mask: None,
                    scale: 1.0,
                };
                return (x.clone(), cache);
            }
        };

        let scale = 1.0 / (1.0 - self.rate);
        let mask: Vec<bool> = (0..x.numel())
            .map(|_| rng.random::<f32>() >= self.rate)
            .collect();
        let output = x
            .data
            .iter()
            .zip(&mask)
            .map(|(&v, &keep)| if keep { v * scale } else { 0.0 })
            .collect();

        (
            Tensor::new(output, x.shape.clone()),
            DropoutCache {
                mask: Some(mask),
                scale,
            },
        )
    }

    /// Backward pass: route gradients through the kept positions only
    pub fn backward(&self, grad_out: &Tensor, cache: &DropoutCache) -> Tensor {
        match &cache.mask {
            Some(mask) => {
                let grad = grad_out
                    .data
                    .iter()
                    .zip(mask)
                    .map(|(&g, &keep)| if keep { g * cache.scale } else { 0.0 })
                    .collect();
                Tensor::new(grad, grad_out.shape.clone())
            }
            None => grad_out.clone(),
        }
    }
}

/// Cache for the dropout backward pass
pub struct DropoutCache {
    /// `true` = kept; `None` when dropout was not applied
    pub mask: Option<Vec<bool>>,
    pub scale: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_inference_is_identity() {
        let layer = TrainableDropout::new(0.5);
        let x = Tensor::new(vec![1.0, 2.0, 3.0], vec![1, 3]);
        let (y, cache) = layer.forward(&x, None);
        assert_eq!(y, x);
        assert!(cache.mask.is_none());
    }

    #[test]
    fn test_training_drops_and_scales() {
        let layer = TrainableDropout::new(0.5);
        let mut rng = StdRng::seed_from_u64(7);
        let x = Tensor::new(vec![1.0; 1000], vec![10, 100]);
        let (y, cache) = layer.forward(&x, Some(&mut rng));
        let kept = y.data.iter().filter(|&&v| v != 0.0).count();
        assert!(kept > 350 && kept < 650, "kept {}", kept);
        assert!(y.data.iter().all(|&v| v == 0.0 || (v - 2.0).abs() < 1e-6));

        let grad = layer.backward(&Tensor::new(vec![1.0; 1000], vec![10, 100]), &cache);
        assert_eq!(grad, y);
    }
}
