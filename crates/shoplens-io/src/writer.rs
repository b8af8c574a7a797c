//! JSON report writer for holdout evaluations.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use shoplens_rf::{AveragedMetrics, ClassMetrics, HoldoutEvaluation, RankedFeature};
use tracing::{debug, info, instrument};

use crate::DatasetError;
use crate::domain::ExperimentName;

/// Row counts of the train/holdout partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitSizes {
    pub n_train: usize,
    pub n_holdout: usize,
}

/// Writes evaluation reports to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Reports are named `{experiment}_evaluate.json`.
pub struct ReportWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    accuracy: f64,
    accuracy_percent: String,
    split: SplitSizes,
    class_metrics: &'a [ClassMetrics],
    macro_avg: AveragedMetrics,
    weighted_avg: AveragedMetrics,
    confusion_matrix: &'a [Vec<usize>],
    feature_importances: &'a [RankedFeature],
}

impl ReportWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, DatasetError> {
        fs::create_dir_all(output_dir).map_err(|e| DatasetError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path the evaluation report is written to.
    #[must_use]
    pub fn evaluation_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_evaluate.json", self.experiment.as_str()))
    }

    /// Write a holdout evaluation to `{experiment}_evaluate.json`.
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DatasetError::Serialize`] | The report cannot be encoded |
    /// | [`DatasetError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        evaluation: &HoldoutEvaluation,
        importances: &[RankedFeature],
        split: SplitSizes,
    ) -> Result<PathBuf, DatasetError> {
        let path = self.evaluation_path();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            accuracy: evaluation.accuracy,
            accuracy_percent: evaluation.accuracy_percent(),
            split,
            class_metrics: &evaluation.report.classes,
            macro_avg: evaluation.report.macro_avg,
            weighted_avg: evaluation.report.weighted_avg,
            confusion_matrix: evaluation.confusion.as_rows(),
            feature_importances: importances,
        };

        let json =
            serde_json::to_string_pretty(&artifact).map_err(|e| DatasetError::Serialize {
                path: path.clone(),
                source: e,
            })?;
        fs::write(&path, &json).map_err(|e| DatasetError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "evaluation report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoplens_rf::{RandomForestConfig, evaluate, train};
    use tempfile::TempDir;

    fn small_evaluation() -> (HoldoutEvaluation, Vec<RankedFeature>) {
        let features: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![f64::from(i), f64::from(i % 3)])
            .collect();
        let labels: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();
        let names = vec!["Age".to_string(), "ProductCategory".to_string()];
        let config = RandomForestConfig::new(5).unwrap();
        let model = train(&config, &features, &labels, &names).unwrap();
        let eval = evaluate(&config, &model, &features, &labels).unwrap();
        (eval, model.importances().to_vec())
    }

    #[test]
    fn writes_named_report() {
        let dir = TempDir::new().unwrap();
        let writer =
            ReportWriter::new(dir.path(), ExperimentName::new("unit".into()).unwrap()).unwrap();
        let (eval, importances) = small_evaluation();
        let split = SplitSizes {
            n_train: 40,
            n_holdout: 40,
        };
        let path = writer.write_evaluation(&eval, &importances, split).unwrap();
        assert_eq!(path, dir.path().join("unit_evaluate.json"));

        let content: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["experiment"], "unit");
        assert_eq!(content["split"]["n_holdout"], 40);
        assert_eq!(content["confusion_matrix"].as_array().unwrap().len(), 2);
        assert_eq!(content["feature_importances"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ReportWriter::new(&nested, ExperimentName::new("x".into()).unwrap()).unwrap();
        assert!(nested.is_dir());
    }
}
