//! Training Logger and Utilities
//!
//! Per-epoch metrics, a CSV logger for them, and the validation split.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wordbag::training_logger::{EpochMetrics, TrainingLogger};
//!
//! let mut logger = TrainingLogger::new("training_log.csv")?;
//! let metrics = EpochMetrics {
//!     epoch: 1,
//!     loss: 2.1,
//!     accuracy: 0.41,
//!     val_loss: Some(1.9),
//!     val_accuracy: Some(0.47),
//!     elapsed_secs: 12.5,
//! };
//! logger.log(&metrics, 1e-3)?;
//! # Ok::<(), wordbag::WordbagError>(())
//! ```
//!
//! ## CSV Format
//!
//! - `epoch`: Epoch number, starting at 1
//! - `elapsed_seconds`: Time since training started
//! - `learning_rate`: Learning rate used for the epoch
//! - `train_loss`, `train_accuracy`: Mean over the epoch's batches
//! - `val_loss`, `val_accuracy`: On the held-out split (empty without one)
//!
//! Loss is categorical cross-entropy. Guessing uniformly among 20 classes
//! gives `ln 20 ≈ 3.0`, a useful reference for the first epoch.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use crate::error::Result;

/// Metrics for one training epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    pub val_loss: Option<f32>,
    pub val_accuracy: Option<f32>,
    /// Seconds since training started, at the end of this epoch
    pub elapsed_secs: f32,
}

/// Writes one CSV row per epoch and echoes it to the console
pub struct TrainingLogger {
    log_file: File,
    echo: bool,
    last_log_time: Instant,
}

impl TrainingLogger {
    /// Create the CSV file and write its header
    pub fn new<P: AsRef<Path>>(log_path: P) -> Result<Self> {
        let mut log_file = File::create(log_path)?;
        writeln!(
            log_file,
            "epoch,elapsed_seconds,learning_rate,train_loss,train_accuracy,val_loss,val_accuracy"
        )?;
        Ok(Self {
            log_file,
            echo: true,
            last_log_time: Instant::now(),
        })
    }

    /// Turn the console line off (the CSV is still written)
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Append one epoch to the CSV
    pub fn log(&mut self, metrics: &EpochMetrics, learning_rate: f32) -> Result<()> {
        let opt = |v: Option<f32>| v.map(|v| format!("{:.4}", v)).unwrap_or_default();
        writeln!(
            self.log_file,
            "{},{:.2},{:.6},{:.4},{:.4},{},{}",
            metrics.epoch,
            metrics.elapsed_secs,
            learning_rate,
            metrics.loss,
            metrics.accuracy,
            opt(metrics.val_loss),
            opt(metrics.val_accuracy)
        )?;
        // Flushed every epoch so a crashed run still leaves its history
        self.log_file.flush()?;

        if self.echo {
            let epoch_time = self.last_log_time.elapsed().as_secs_f32();
            println!("{}", format_epoch(metrics, epoch_time));
        }
        self.last_log_time = Instant::now();
        Ok(())
    }
}

/// One-line console summary of an epoch
pub fn format_epoch(metrics: &EpochMetrics, epoch_secs: f32) -> String {
    let mut line = format!(
        "Epoch {:3} | {:6.1}s (+{:.1}s) | loss: {:.4} | acc: {:.4}",
        metrics.epoch, metrics.elapsed_secs, epoch_secs, metrics.loss, metrics.accuracy
    );
    if let (Some(loss), Some(acc)) = (metrics.val_loss, metrics.val_accuracy) {
        line.push_str(&format!(" | val_loss: {:.4} | val_acc: {:.4}", loss, acc));
    }
    line
}

/// Hold out the last `val_fraction` of the examples
///
/// The split happens before any shuffling, so the validation set is the tail
/// of the data in its given order.
///
/// ```rust
/// # use wordbag::training_logger::train_val_split;
/// let x = vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
/// let y = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
/// let ((train_x, _), (val_x, val_y)) = train_val_split(&x, &y, 0.2);
/// assert_eq!(train_x.len(), 8);
/// assert_eq!(val_x, &[90, 100]);
/// assert_eq!(val_y, &[0, 1]);
/// ```
#[allow(clippy::type_complexity)]
pub fn train_val_split<'a, X, Y>(
    x: &'a [X],
    y: &'a [Y],
    val_fraction: f32,
) -> ((&'a [X], &'a [Y]), (&'a [X], &'a [Y])) {
    let n = x.len().min(y.len());
    let split_idx = ((n as f32) * (1.0 - val_fraction)) as usize;
    let split_idx = split_idx.min(n);
    (
        (&x[..split_idx], &y[..split_idx]),
        (&x[split_idx..n], &y[split_idx..n]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut logger = TrainingLogger::new(&path).unwrap().quiet();
        let mut metrics = EpochMetrics {
            epoch: 1,
            loss: 1.5,
            accuracy: 0.5,
            val_loss: None,
            val_accuracy: None,
            elapsed_secs: 1.0,
        };
        logger.log(&metrics, 0.001).unwrap();
        metrics.epoch = 2;
        metrics.val_loss = Some(1.25);
        metrics.val_accuracy = Some(0.75);
        logger.log(&metrics, 0.001).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epoch,elapsed_seconds"));
        assert_eq!(lines[1], "1,1.00,0.001000,1.5000,0.5000,,");
        assert_eq!(lines[2], "2,1.00,0.001000,1.5000,0.5000,1.2500,0.7500");
    }

    #[test]
    fn test_split_zero_fraction_keeps_everything() {
        let x = [1, 2, 3];
        let ((tx, ty), (vx, _)) = train_val_split(&x, &x, 0.0);
        assert_eq!(tx.len(), 3);
        assert_eq!(ty.len(), 3);
        assert!(vx.is_empty());
    }

    #[test]
    fn test_format_epoch_includes_validation() {
        let metrics = EpochMetrics {
            epoch: 3,
            loss: 0.5,
            accuracy: 0.9,
            val_loss: Some(0.6),
            val_accuracy: Some(0.8),
            elapsed_secs: 3.0,
        };
        let line = format_epoch(&metrics, 1.0);
        assert!(line.contains("val_acc: 0.8000"));
    }
}
