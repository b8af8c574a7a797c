//! Confusion matrix and per-class classification metrics.

use std::fmt;

use serde::Serialize;

use crate::error::RfError;

/// A confusion matrix for multi-class classification.
///
/// Entry `matrix[true_class][predicted_class]` counts how many samples
/// with true label `true_class` were predicted as `predicted_class`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

/// Per-class precision, recall, and F1 score.
///
/// Ratios whose denominator is zero are reported as 0.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// The class index.
    pub class: usize,
    /// TP / (TP + FP).
    pub precision: f64,
    /// TP / (TP + FN).
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

/// Precision, recall, and F1 averaged across classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Total number of samples the average covers.
    pub support: usize,
}

/// Per-class metrics plus overall accuracy and the two standard averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    /// Unweighted mean over classes.
    pub macro_avg: AveragedMetrics,
    /// Mean over classes weighted by support.
    pub weighted_avg: AveragedMetrics,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted labels.
    ///
    /// The matrix is at least `n_classes` wide and grows to cover any larger
    /// label that appears in either sequence.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyHoldout`] | Zero labels provided |
    /// | [`RfError::PredictionCountMismatch`] | Sequences differ in length |
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, RfError> {
        if true_labels.is_empty() {
            return Err(RfError::EmptyHoldout);
        }
        if true_labels.len() != predicted.len() {
            return Err(RfError::PredictionCountMismatch {
                n_true: true_labels.len(),
                n_predicted: predicted.len(),
            });
        }
        let n_classes = true_labels
            .iter()
            .chain(predicted)
            .map(|&c| c + 1)
            .fold(n_classes, usize::max);
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (&t, &p) in true_labels.iter().zip(predicted) {
            matrix[t][p] += 1;
        }
        Ok(Self { matrix, n_classes })
    }

    /// Total number of samples counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Number of correctly classified samples (the diagonal).
    #[must_use]
    pub fn correct(&self) -> usize {
        (0..self.n_classes).map(|i| self.matrix[i][i]).sum()
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64,
        }
    }

    /// Per-class precision, recall, F1, and support.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes)
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted: usize = (0..self.n_classes).map(|i| self.matrix[i][c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: c,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Build the full classification report.
    #[must_use]
    pub fn report(&self) -> ClassificationReport {
        let classes = self.class_metrics();
        let support = self.total();
        let k = classes.len().max(1) as f64;
        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|m| m.precision).sum::<f64>() / k,
            recall: classes.iter().map(|m| m.recall).sum::<f64>() / k,
            f1: classes.iter().map(|m| m.f1).sum::<f64>() / k,
            support,
        };
        let weighted = |metric: fn(&ClassMetrics) -> f64| -> f64 {
            if support == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|m| metric(m) * m.support as f64)
                .sum::<f64>()
                / support as f64
        };
        let weighted_avg = AveragedMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support,
        };
        ClassificationReport {
            accuracy: self.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
        }
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for j in 0..self.n_classes {
            write!(f, " pred_{j:>3}")?;
        }
        writeln!(f)?;
        for (i, row) in self.matrix.iter().enumerate() {
            write!(f, "true_{i:>3}")?;
            for val in row {
                write!(f, " {val:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_are_diagonal() {
        let labels = vec![0, 1, 1, 0, 1];
        let cm = ConfusionMatrix::from_labels(&labels, &labels, 2).unwrap();
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        assert_eq!(cm.as_rows(), &[vec![2usize, 0], vec![0, 3]]);
        for m in cm.class_metrics() {
            assert!((m.f1 - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn known_binary_matrix() {
        // TN=3 FP=1 FN=2 TP=4
        let truth = vec![0, 0, 0, 0, 1, 1, 1, 1, 1, 1];
        let pred = vec![0, 0, 0, 1, 0, 0, 1, 1, 1, 1];
        let cm = ConfusionMatrix::from_labels(&truth, &pred, 2).unwrap();
        assert_eq!(cm.as_rows(), &[vec![3usize, 1], vec![2, 4]]);
        assert_eq!(cm.total(), 10);
        assert_eq!(cm.correct(), 7);

        let metrics = cm.class_metrics();
        assert!((metrics[1].precision - 0.8).abs() < 1e-12);
        assert!((metrics[1].recall - 4.0 / 6.0).abs() < 1e-12);
        assert!((metrics[0].precision - 0.6).abs() < 1e-12);
        assert!((metrics[0].recall - 0.75).abs() < 1e-12);
        assert_eq!(metrics[0].support, 4);
        assert_eq!(metrics[1].support, 6);
    }

    #[test]
    fn report_averages() {
        let truth = vec![0, 0, 0, 0, 1, 1, 1, 1, 1, 1];
        let pred = vec![0, 0, 0, 1, 0, 0, 1, 1, 1, 1];
        let report = ConfusionMatrix::from_labels(&truth, &pred, 2)
            .unwrap()
            .report();
        assert!((report.accuracy - 0.7).abs() < 1e-12);
        assert!((report.macro_avg.precision - 0.7).abs() < 1e-12);
        // (0.6 * 4 + 0.8 * 6) / 10
        assert!((report.weighted_avg.precision - 0.72).abs() < 1e-12);
        assert_eq!(report.weighted_avg.support, 10);
    }

    #[test]
    fn absent_class_reports_zero() {
        let cm = ConfusionMatrix::from_labels(&[0, 0], &[0, 0], 2).unwrap();
        let metrics = cm.class_metrics();
        assert_eq!(metrics[1].support, 0);
        assert_eq!(metrics[1].precision, 0.0);
        assert_eq!(metrics[1].recall, 0.0);
        assert_eq!(metrics[1].f1, 0.0);
    }

    #[test]
    fn grows_to_cover_unseen_labels() {
        let cm = ConfusionMatrix::from_labels(&[0, 2], &[0, 1], 2).unwrap();
        assert_eq!(cm.n_classes(), 3);
    }

    #[test]
    fn empty_labels_error() {
        let err = ConfusionMatrix::from_labels(&[], &[], 2).unwrap_err();
        assert!(matches!(err, RfError::EmptyHoldout));
    }

    #[test]
    fn length_mismatch_error() {
        let err = ConfusionMatrix::from_labels(&[0, 1], &[0], 2).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionCountMismatch {
                n_true: 2,
                n_predicted: 1
            }
        ));
    }

    #[test]
    fn display_formatting() {
        let cm = ConfusionMatrix::from_labels(&[0, 1], &[0, 1], 2).unwrap();
        let output = cm.to_string();
        assert!(output.contains("pred_"));
        assert!(output.contains("true_"));
    }
}
