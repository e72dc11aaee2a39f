//! Training Loop
//!
//! Mini-batch training of a [`TextClassifier`] on padded sequences and
//! integer labels.
//!
//! ## One Epoch
//!
//! ```text
//! shuffle training indices (seeded)
//! for each batch of batch_size examples:
//!     probs  = model.forward(batch, dropout on)
//!     loss   = cross_entropy(probs, labels)
//!     grads  = model.backward(labels)
//!     clip grads (optional)
//!     adam.update(model, grads)
//! evaluate on the validation split (if any)
//! ```
//!
//! The validation split is the tail of the data, taken before shuffling.
//! Only the training part is shuffled.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wordbag::model::{ClassifierConfig, TextClassifier};
//! use wordbag::train::{fit, TrainingConfig};
//!
//! # let (x, y): (Vec<Vec<usize>>, Vec<usize>) = (vec![], vec![]);
//! let mut model = TextClassifier::new(ClassifierConfig::default())?;
//! let history = fit(&mut model, &x, &y, &TrainingConfig::default())?;
//! println!("final val accuracy: {:?}", history.last().and_then(|e| e.val_accuracy));
//! # Ok::<(), wordbag::WordbagError>(())
//! ```

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Result, WordbagError};
use crate::gradients::clip_gradients;
use crate::model::TextClassifier;
use crate::optimizer::AdamOptimizer;
use crate::tensor::Tensor;
use crate::training_logger::format_epoch;
pub use crate::training_logger::{train_val_split, EpochMetrics, TrainingLogger};

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Number of passes through the training data
    pub epochs: usize,
    /// Examples per gradient step
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Fraction of the examples held out for validation (the last ones)
    pub validation_split: f32,
    /// Shuffle the training examples every epoch
    pub shuffle: bool,
    /// Seed for shuffling and dropout
    pub seed: u64,
    /// Clip gradients to this global L2 norm
    pub grad_clip: Option<f32>,
    /// Decoupled weight decay for dense and convolution weights
    pub weight_decay: f32,
    /// Write per-epoch metrics to this CSV file
    pub log_path: Option<String>,
    /// Print one line per epoch
    pub verbose: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 1e-3,
            validation_split: 0.1,
            shuffle: true,
            seed: 42,
            grad_clip: None,
            weight_decay: 0.0,
            log_path: None,
            verbose: true,
        }
    }
}

impl TrainingConfig {
    /// A few epochs with a higher learning rate, for smoke runs
    pub fn quick() -> Self {
        Self {
            epochs: 3,
            batch_size: 64,
            learning_rate: 5e-3,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(WordbagError::InvalidConfig("epochs must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(WordbagError::InvalidConfig("batch_size must be positive".to_string()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(WordbagError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(WordbagError::InvalidConfig(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if matches!(self.grad_clip, Some(c) if c <= 0.0) {
            return Err(WordbagError::InvalidConfig("grad_clip must be positive".to_string()));
        }
        if self.weight_decay < 0.0 {
            return Err(WordbagError::InvalidConfig("weight_decay must be >= 0".to_string()));
        }
        Ok(())
    }
}

/// Per-epoch metrics of one `fit` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub epochs: Vec<EpochMetrics>,
}

impl History {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn losses(&self) -> Vec<f32> {
        self.epochs.iter().map(|e| e.loss).collect()
    }

    pub fn accuracies(&self) -> Vec<f32> {
        self.epochs.iter().map(|e| e.accuracy).collect()
    }

    /// Validation accuracies (empty when training ran without a split)
    pub fn val_accuracies(&self) -> Vec<f32> {
        self.epochs.iter().filter_map(|e| e.val_accuracy).collect()
    }

    /// Wall-clock seconds spent in epoch `i` (0-based)
    ///
    /// The difference between its `elapsed_secs` and the previous epoch's.
    pub fn epoch_secs(&self, i: usize) -> f32 {
        let elapsed = |j: usize| self.epochs.get(j).map_or(0.0, |e| e.elapsed_secs);
        match i {
            0 => elapsed(0),
            _ => elapsed(i) - elapsed(i - 1),
        }
    }

    /// Epoch with the lowest validation loss
    pub fn best_epoch(&self) -> Option<&EpochMetrics> {
        self.epochs
            .iter()
            .filter(|e| e.val_loss.is_some())
            .min_by(|a, b| {
                let a = a.val_loss.unwrap_or(f32::INFINITY);
                a.total_cmp(&b.val_loss.unwrap_or(f32::INFINITY))
            })
    }
}

/// Loss and accuracy over a labelled set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: f32,
}

fn check_labels(model: &TextClassifier, x: &[Vec<usize>], y: &[usize]) -> Result<()> {
    if x.len() != y.len() {
        return Err(WordbagError::InvalidInput(format!(
            "{} sequences but {} labels",
            x.len(),
            y.len()
        )));
    }
    let classes = model.config().num_classes;
    if let Some(&label) = y.iter().find(|&&label| label >= classes) {
        return Err(WordbagError::InvalidInput(format!(
            "label {} out of range for {} classes",
            label, classes
        )));
    }
    Ok(())
}

fn count_correct(probs: &Tensor, labels: &[usize]) -> usize {
    probs
        .argmax_rows()
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count()
}

/// Train `model` in place and return per-epoch metrics
///
/// `x` holds padded sequences, `y` their class labels.
pub fn fit(
    model: &mut TextClassifier,
    x: &[Vec<usize>],
    y: &[usize],
    config: &TrainingConfig,
) -> Result<History> {
    config.validate()?;
    check_labels(model, x, y)?;

    let ((train_x, train_y), (val_x, val_y)) = train_val_split(x, y, config.validation_split);
    if train_x.is_empty() {
        return Err(WordbagError::InvalidInput("no training examples".to_string()));
    }
    log::info!(
        "Training on {} examples, validating on {} ({} epochs, batch {})",
        train_x.len(),
        val_x.len(),
        config.epochs,
        config.batch_size
    );

    let mut logger = match &config.log_path {
        Some(path) => {
            let logger = TrainingLogger::new(path)?;
            Some(if config.verbose { logger } else { logger.quiet() })
        }
        None => None,
    };

    let mut optimizer = AdamOptimizer::new(model);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..train_x.len()).collect();
    let mut history = History::default();
    let start = Instant::now();

    for epoch in 1..=config.epochs {
        if config.shuffle {
            order.shuffle(&mut rng);
        }

        let mut loss_sum = 0.0;
        let mut correct = 0;
        for chunk in order.chunks(config.batch_size) {
            let batch_x: Vec<Vec<usize>> = chunk.iter().map(|&i| train_x[i].clone()).collect();
            let batch_y: Vec<usize> = chunk.iter().map(|&i| train_y[i]).collect();

            let (probs, cache) = model.forward(&batch_x, Some(&mut rng))?;
            loss_sum += model.compute_loss(&probs, &batch_y) * chunk.len() as f32;
            correct += count_correct(&probs, &batch_y);

            let mut grads = model.backward(&batch_y, &cache);
            if let Some(max_norm) = config.grad_clip {
                let norm = clip_gradients(&mut grads, max_norm);
                if norm > max_norm {
                    log::debug!("Clipped gradient norm {:.3} to {}", norm, max_norm);
                }
            }
            optimizer.update(model, &grads, config.learning_rate, config.weight_decay);
        }

        let (val_loss, val_accuracy) = if val_x.is_empty() {
            (None, None)
        } else {
            let eval = evaluate(model, val_x, val_y, config.batch_size)?;
            (Some(eval.loss), Some(eval.accuracy))
        };

        let metrics = EpochMetrics {
            epoch,
            loss: loss_sum / train_x.len() as f32,
            accuracy: correct as f32 / train_x.len() as f32,
            val_loss,
            val_accuracy,
            elapsed_secs: start.elapsed().as_secs_f32(),
        };
        log::debug!("{:?}", metrics);
        history.epochs.push(metrics);
        match logger.as_mut() {
            Some(logger) => logger.log(&metrics, config.learning_rate)?,
            None if config.verbose => {
                let epoch_secs = history.epoch_secs(history.epochs.len() - 1);
                println!("{}", format_epoch(&metrics, epoch_secs));
            }
            None => {}
        }
    }

    Ok(history)
}

/// Mean loss and accuracy of `model` on a labelled set (no dropout)
pub fn evaluate(
    model: &TextClassifier,
    x: &[Vec<usize>],
    y: &[usize],
    batch_size: usize,
) -> Result<Evaluation> {
    check_labels(model, x, y)?;
    if x.is_empty() {
        return Err(WordbagError::InvalidInput("nothing to evaluate".to_string()));
    }

    let mut loss_sum = 0.0;
    let mut correct = 0;
    for (batch_x, batch_y) in x.chunks(batch_size.max(1)).zip(y.chunks(batch_size.max(1))) {
        let (probs, _) = model.forward(batch_x, None)?;
        loss_sum += model.compute_loss(&probs, batch_y) * batch_y.len() as f32;
        correct += count_correct(&probs, batch_y);
    }

    Ok(Evaluation {
        loss: loss_sum / x.len() as f32,
        accuracy: correct as f32 / x.len() as f32,
    })
}
