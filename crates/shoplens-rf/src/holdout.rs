//! Scoring a fitted model against the holdout partition.

use serde::Serialize;
use tracing::{info, instrument};

use crate::classifier::Classifier;
use crate::confusion::{ClassificationReport, ConfusionMatrix};
use crate::error::RfError;

/// Binary labels always get a full 2x2 matrix, even if one class is absent.
const MIN_CLASSES: usize = 2;

/// Everything computed from one pass over the holdout set.
#[derive(Debug, Clone, Serialize)]
pub struct HoldoutEvaluation {
    /// Holdout labels, in holdout row order.
    pub true_labels: Vec<usize>,
    /// Predicted labels, aligned with `true_labels`.
    pub predicted: Vec<usize>,
    /// Proportion of correct predictions, in [0, 1].
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
}

impl HoldoutEvaluation {
    /// Accuracy as a percentage with three decimals, e.g. `"85.333%"`.
    #[must_use]
    pub fn accuracy_percent(&self) -> String {
        format!("{:.3}%", self.accuracy * 100.0)
    }

    /// Number of holdout rows scored.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.true_labels.len()
    }
}

/// Predict every holdout row with `model` and score the predictions.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::EmptyHoldout`] | Zero holdout rows |
/// | [`RfError::LabelCountMismatch`] | Row and label counts differ |
/// | [`RfError::PredictionFeatureMismatch`] | A row has the wrong width |
#[instrument(skip_all, fields(n_holdout = features.len()))]
pub fn evaluate<C: Classifier>(
    classifier: &C,
    model: &C::Model,
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<HoldoutEvaluation, RfError> {
    if features.is_empty() {
        return Err(RfError::EmptyHoldout);
    }
    if features.len() != labels.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }

    let predicted = classifier.predict(model, features)?;
    let confusion = ConfusionMatrix::from_labels(labels, &predicted, MIN_CLASSES)?;
    let report = confusion.report();
    let accuracy = confusion.accuracy();

    info!(
        accuracy,
        correct = confusion.correct(),
        total = confusion.total(),
        "holdout evaluation complete"
    );

    Ok(HoldoutEvaluation {
        true_labels: labels.to_vec(),
        predicted,
        accuracy,
        report,
        confusion,
    })
}
