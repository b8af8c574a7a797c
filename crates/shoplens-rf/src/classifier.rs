//! The classifier capability the trainer and evaluator depend on.

use tracing::{info, instrument};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::importance::RankedFeature;
use crate::result::RandomForestResult;
use crate::validate;

/// Something that can be fitted to labelled rows and then predict labels.
///
/// The configuration value is the classifier; fitting produces an
/// immutable `Model` that the evaluator reads.
pub trait Classifier {
    /// The fitted model.
    type Model;

    /// Fit a model to row-major `features` and zero-based `labels`.
    ///
    /// # Errors
    ///
    /// Implementations return [`RfError`] for degenerate inputs.
    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<Self::Model, RfError>;

    /// Predict one label per row, preserving row order.
    ///
    /// # Errors
    ///
    /// Implementations return [`RfError::PredictionFeatureMismatch`] when a
    /// row has the wrong width.
    fn predict(&self, model: &Self::Model, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError>;

    /// Ranked feature importances of a fitted model.
    fn importances(&self, model: &Self::Model) -> Vec<RankedFeature>;
}

impl Classifier for RandomForestConfig {
    type Model = RandomForestResult;

    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<RandomForestResult, RfError> {
        RandomForestConfig::fit(self, features, labels, feature_names)
    }

    fn predict(
        &self,
        model: &RandomForestResult,
        features: &[Vec<f64>],
    ) -> Result<Vec<usize>, RfError> {
        model.forest().predict_batch(features)
    }

    fn importances(&self, model: &RandomForestResult) -> Vec<RankedFeature> {
        model.importances().to_vec()
    }
}

/// Validate a training partition and fit `classifier` to it.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::EmptyDataset`] | Zero training rows |
/// | [`RfError::SingleClass`] | Every training label is the same class |
/// | [`RfError::LabelCountMismatch`] | Row and label counts differ |
/// | Other variants | From the classifier's own validation |
#[instrument(skip_all, fields(n_samples = features.len()))]
pub fn train<C: Classifier>(
    classifier: &C,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<C::Model, RfError> {
    validate::check_matrix(features, labels)?;
    validate::check_classes(labels)?;
    let model = classifier.fit(features, labels, feature_names)?;
    info!("classifier trained");
    Ok(model)
}
