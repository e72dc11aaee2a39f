//! Classification Metrics
//!
//! Accuracy and a confusion matrix with per-class precision and recall.
//!
//! ```text
//!                predicted
//!              c0   c1   c2
//! actual  c0 [ 50    2    0 ]     recall(c0)    = 50 / 52
//!         c1 [  3   41    6 ]     precision(c1) = 41 / 45
//!         c2 [  1    2   47 ]
//! ```

/// Fraction of predictions equal to their label (0 for empty input)
pub fn accuracy(predictions: &[usize], labels: &[usize]) -> f32 {
    let n = predictions.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count();
    correct as f32 / n as f32
}

/// Counts of (actual, predicted) class pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    num_classes: usize,
    /// Row-major `[actual][predicted]`
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    /// Tally predictions against labels
    ///
    /// Pairs with a class `>= num_classes` are ignored.
    pub fn new(predictions: &[usize], labels: &[usize], num_classes: usize) -> Self {
        let mut counts = vec![0; num_classes * num_classes];
        for (&p, &l) in predictions.iter().zip(labels) {
            if p < num_classes && l < num_classes {
                counts[l * num_classes + p] += 1;
            }
        }
        Self {
            num_classes,
            counts,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Number of examples of class `actual` predicted as `predicted`
    pub fn count(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual * self.num_classes + predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let diagonal: usize = (0..self.num_classes).map(|c| self.count(c, c)).sum();
        diagonal as f32 / total as f32
    }

    /// Correct predictions of `class` over all predictions of `class`
    ///
    /// 0 when the class was never predicted.
    pub fn precision(&self, class: usize) -> f32 {
        let predicted: usize = (0..self.num_classes).map(|a| self.count(a, class)).sum();
        ratio(self.count(class, class), predicted)
    }

    /// Correct predictions of `class` over all examples of `class`
    ///
    /// 0 when the class never occurs.
    pub fn recall(&self, class: usize) -> f32 {
        let actual: usize = (0..self.num_classes).map(|p| self.count(class, p)).sum();
        ratio(self.count(class, class), actual)
    }

    pub fn f1(&self, class: usize) -> f32 {
        let (p, r) = (self.precision(class), self.recall(class));
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Per-class precision, recall, F1 and support as a text table
    ///
    /// Classes without a name in `class_names` are shown by index.
    pub fn report(&self, class_names: &[String]) -> String {
        let name = |c: usize| class_names.get(c).cloned().unwrap_or_else(|| c.to_string());
        let width = (0..self.num_classes)
            .map(|c| name(c).len())
            .max()
            .unwrap_or(0)
            .max(8);

        let mut out = format!(
            "{:<width$} {:>9} {:>9} {:>9} {:>9}\n",
            "class", "precision", "recall", "f1", "support"
        );
        for c in 0..self.num_classes {
            let support: usize = (0..self.num_classes).map(|p| self.count(c, p)).sum();
            out.push_str(&format!(
                "{:<width$} {:>9.3} {:>9.3} {:>9.3} {:>9}\n",
                name(c),
                self.precision(c),
                self.recall(c),
                self.f1(c),
                support
            ));
        }
        out.push_str(&format!(
            "{:<width$} {:>29.3} {:>9}\n",
            "accuracy",
            self.accuracy(),
            self.total()
        ));
        out
    }
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}
