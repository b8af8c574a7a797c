//! The startup pipeline: load, split, train, evaluate.

use shoplens_io::{Dataset, DatasetError, DatasetReader, LabeledData};
use shoplens_rf::{
    Classifier, HoldoutEvaluation, Partition, RandomForestConfig, RandomForestResult,
    RankedFeature, RfError, TrainTestSplit, evaluate, train,
};
use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::stats::DescriptiveStats;

/// Startup failures, one variant per pipeline stage. Each is fatal.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// Numeric pipeline settings were rejected.
    #[error("invalid pipeline configuration")]
    Config(#[source] RfError),

    /// The dataset could not be read, lacked a column, or had a bad label.
    #[error("failed to load dataset")]
    Dataset(#[source] DatasetError),

    /// A feature column holds text and encoding was not requested.
    #[error("training failed: feature columns must be numeric")]
    UnencodedFeature(#[source] DatasetError),

    /// The training partition was degenerate.
    #[error("training failed")]
    Training(#[source] RfError),

    /// The holdout partition could not be scored.
    #[error("evaluation failed")]
    Evaluation(#[source] RfError),
}

impl InitError {
    /// Name of the pipeline stage that failed.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Dataset(_) => "dataset",
            Self::UnencodedFeature(_) | Self::Training(_) => "training",
            Self::Evaluation(_) => "evaluation",
        }
    }
}

/// Everything the dashboard serves, computed once at startup.
#[derive(Debug)]
pub struct Context {
    pub dataset: Dataset,
    pub data: LabeledData,
    pub partition: Partition,
    pub model: RandomForestResult,
    /// Ranked importances, most important first.
    pub importances: Vec<RankedFeature>,
    pub evaluation: HoldoutEvaluation,
    pub stats: DescriptiveStats,
    /// Columns that were ordinal-encoded before training.
    pub encoded_columns: Vec<String>,
}

impl Context {
    /// Importance of each feature in column order.
    #[must_use]
    pub fn importances_by_column(&self) -> Vec<(String, f64)> {
        self.data
            .feature_names
            .iter()
            .map(|name| {
                let importance = self
                    .importances
                    .iter()
                    .find(|f| &f.name == name)
                    .map_or(0.0, |f| f.importance);
                (name.clone(), importance)
            })
            .collect()
    }
}

/// Run the whole pipeline once and return the immutable [`Context`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`InitError::Config`] | Holdout fraction outside (0, 1) or zero trees |
/// | [`InitError::Dataset`] | File, CSV, required-column, or label problems |
/// | [`InitError::UnencodedFeature`] | Text feature column without encoding |
/// | [`InitError::Training`] | Empty or single-class training partition |
/// | [`InitError::Evaluation`] | Empty holdout partition |
#[instrument(skip_all, fields(path = %config.data_path().display()))]
pub fn initialize(config: &PipelineConfig) -> Result<Context, InitError> {
    let splitter = TrainTestSplit::new(config.holdout_fraction())
        .map_err(InitError::Config)?
        .with_seed(config.seed());
    let forest = RandomForestConfig::new(config.n_trees())
        .map_err(InitError::Config)?
        .with_seed(config.seed());

    let mut dataset = DatasetReader::new(config.data_path())
        .read()
        .map_err(InitError::Dataset)?;
    let encoded_columns = if config.encode_categoricals() {
        dataset
            .encode_all_categoricals(config.label())
            .map_err(InitError::Dataset)?
    } else {
        Vec::new()
    };

    let data = dataset
        .split_features(config.label())
        .map_err(|e| match e {
            DatasetError::NonNumericFeature { .. } => InitError::UnencodedFeature(e),
            other => InitError::Dataset(other),
        })?;
    let stats = DescriptiveStats::compute(&dataset).map_err(InitError::Dataset)?;

    let partition = splitter.split(data.n_samples());
    let (train_x, train_y) = data.select(&partition.train);
    let (holdout_x, holdout_y) = data.select(&partition.holdout);

    let model = train(&forest, &train_x, &train_y, &data.feature_names)
        .map_err(InitError::Training)?;
    let evaluation =
        evaluate(&forest, &model, &holdout_x, &holdout_y).map_err(InitError::Evaluation)?;
    let importances = forest.importances(&model);

    info!(
        n_rows = dataset.n_rows(),
        n_train = partition.train.len(),
        n_holdout = partition.holdout.len(),
        accuracy = %evaluation.accuracy_percent(),
        "pipeline initialized"
    );

    Ok(Context {
        dataset,
        data,
        partition,
        model,
        importances,
        evaluation,
        stats,
        encoded_columns,
    })
}
