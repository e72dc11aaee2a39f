//! Adam Optimizer
//!
//! ## Algorithm
//!
//! For each parameter θ with gradient g:
//!
//! ```text
//! θ = θ * (1 - α * λ)              # decoupled weight decay (matrices only, λ > 0)
//! m = β₁ * m + (1 - β₁) * g        # first moment
//! v = β₂ * v + (1 - β₂) * g²       # second moment
//! m_hat = m / (1 - β₁^t)           # bias correction
//! v_hat = v / (1 - β₂^t)
//! θ = θ - α * m_hat / (√v_hat + ε)
//! ```
//!
//! with β₁ = 0.9, β₂ = 0.999 and ε = 1e-7. With `weight_decay = 0` this is
//! plain Adam.
//!
//! Weight decay only touches 2D tensors (dense and convolution weights). The
//! embedding table is 2D too but is excluded: most rows get no gradient on a
//! given step and decaying them would shrink rare words toward zero.
//!
//! ## State Layout
//!
//! One `m` and one `v` tensor per trainable parameter, in the order of
//! [`TextClassifier::trainable_parameters_mut`]. A frozen embedding table has
//! no optimizer state at all.

use rayon::prelude::*;

use crate::model::{ClassifierGradients, TextClassifier};
use crate::tensor::Tensor;

/// Tensors with more elements than this are updated in parallel
const PARALLEL_THRESHOLD: usize = 1000;

/// Adam optimizer state
pub struct AdamOptimizer {
    /// First moment per trainable parameter
    pub m: Vec<Tensor>,
    /// Second moment per trainable parameter
    pub v: Vec<Tensor>,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// Number of updates applied so far (for bias correction)
    pub step: usize,
    /// Whether the first trainable parameter is the embedding table
    embedding_first: bool,
}

impl AdamOptimizer {
    /// Zero-initialized state for every trainable parameter of `model`
    pub fn new(model: &TextClassifier) -> Self {
        let zeros = |t: &&Tensor| Tensor::zeros(t.shape.clone());
        let params = model.trainable_parameters();
        Self {
            m: params.iter().map(zeros).collect(),
            v: params.iter().map(zeros).collect(),
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            embedding_first: model.embeddings_trainable(),
        }
    }

    /// Apply one Adam update to every trainable parameter
    ///
    /// # Panics
    ///
    /// Panics if `grads` does not have one tensor per trainable parameter
    pub fn update(
        &mut self,
        model: &mut TextClassifier,
        grads: &ClassifierGradients,
        lr: f32,
        weight_decay: f32,
    ) {
        self.step += 1;
        let step = self.step as f32;
        let bias_correction1 = 1.0 - self.beta1.powf(step);
        let bias_correction2 = 1.0 - self.beta2.powf(step);
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let embedding_first = self.embedding_first;

        let params = model.trainable_parameters_mut();
        let grads = grads.tensors();
        assert_eq!(params.len(), grads.len(), "One gradient per trainable parameter expected");
        assert_eq!(params.len(), self.m.len(), "Optimizer state does not match the model");

        let update = |theta: &mut f32, g: f32, m: &mut f32, v: &mut f32, decay: bool| {
            if decay {
                *theta *= 1.0 - lr * weight_decay;
            }
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / bias_correction1;
            let v_hat = *v / bias_correction2;
            *theta -= lr * m_hat / (v_hat.sqrt() + epsilon);
        };

        for (i, ((param, grad), (m, v))) in params
            .into_iter()
            .zip(grads)
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
            .enumerate()
        {
            let is_embedding = i == 0 && embedding_first;
            let decay = weight_decay > 0.0 && param.shape.len() == 2 && !is_embedding;

            if param.data.len() > PARALLEL_THRESHOLD {
                param
                    .data
                    .par_iter_mut()
                    .zip(grad.data.par_iter())
                    .zip(m.data.par_iter_mut().zip(v.data.par_iter_mut()))
                    .for_each(|((theta, &g), (m, v))| update(theta, g, m, v, decay));
            } else {
                for ((theta, &g), (m, v)) in param
                    .data
                    .iter_mut()
                    .zip(&grad.data)
                    .zip(m.data.iter_mut().zip(v.data.iter_mut()))
                {
                    update(theta, g, m, v, decay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassifierConfig, EncoderConfig};

    fn model(trainable_embeddings: bool) -> TextClassifier {
        TextClassifier::new(ClassifierConfig {
            vocab_size: 12,
            embedding_dim: 4,
            max_len: 5,
            num_classes: 2,
            encoder: EncoderConfig::Average,
            trainable_embeddings,
            ..ClassifierConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_state_matches_trainable_parameters() {
        assert_eq!(AdamOptimizer::new(&model(true)).m.len(), 3);
        assert_eq!(AdamOptimizer::new(&model(false)).v.len(), 2);
    }

    #[test]
    fn test_first_step_moves_each_weight_by_lr() {
        // With bias correction the first step is lr * g / (|g| + ε) ≈ lr * sign(g)
        let mut model = model(true);
        let mut optimizer = AdamOptimizer::new(&model);
        let ids = vec![vec![1, 2, 3, 0, 0]];
        let (_, cache) = model.forward(&ids, None).unwrap();
        let grads = model.backward(&[1], &cache);

        let before = model.trainable_parameters()[2].clone();
        let g = grads.output.bias.clone();
        optimizer.update(&mut model, &grads, 0.01, 0.0);
        let after = model.trainable_parameters()[2].clone();

        for ((b, a), g) in before.data.iter().zip(&after.data).zip(&g.data) {
            let expected = b - 0.01 * g.signum();
            assert!((a - expected).abs() < 1e-4);
        }
        assert_eq!(optimizer.step, 1);
    }

    #[test]
    fn test_frozen_embedding_untouched() {
        let mut model = model(false);
        let mut optimizer = AdamOptimizer::new(&model);
        let table = model.embedding_weights().clone();
        let ids = vec![vec![4, 5, 6, 7, 8]];
        for _ in 0..3 {
            let (_, cache) = model.forward(&ids, None).unwrap();
            let grads = model.backward(&[0], &cache);
            optimizer.update(&mut model, &grads, 0.1, 0.01);
        }
        assert_eq!(model.embedding_weights(), &table);
    }
}
