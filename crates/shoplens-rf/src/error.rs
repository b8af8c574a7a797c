/// Errors from partitioning, training, and evaluating a classifier.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when the holdout fraction is not strictly between 0 and 1.
    #[error("holdout fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidHoldoutFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Returned when the training set has zero samples.
    #[error("training set has zero samples")]
    EmptyDataset,

    /// Returned when the training set has zero feature columns.
    #[error("training set has zero feature columns")]
    ZeroFeatures,

    /// Returned when every training label belongs to the same class.
    #[error("training set contains a single class ({class}); at least two are required")]
    SingleClass {
        /// The only class label present.
        class: usize,
    },

    /// Returned when the number of labels differs from the number of samples.
    #[error("{n_labels} labels supplied for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when the holdout set has zero rows.
    #[error("holdout set is empty; nothing to evaluate")]
    EmptyHoldout,

    /// Returned when true and predicted label sequences differ in length.
    #[error("{n_true} true labels but {n_predicted} predictions")]
    PredictionCountMismatch {
        /// Number of true labels.
        n_true: usize,
        /// Number of predicted labels.
        n_predicted: usize,
    },
}
