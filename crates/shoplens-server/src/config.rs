//! Configuration for the startup pipeline.

use std::path::{Path, PathBuf};

use shoplens_io::LABEL_COLUMN;

/// Inputs to [`initialize`](crate::initialize).
///
/// Construct via [`PipelineConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter             | Default          |
/// |-----------------------|------------------|
/// | `label`               | `PurchaseStatus` |
/// | `holdout_fraction`    | 0.2              |
/// | `seed`                | 42               |
/// | `n_trees`             | 100              |
/// | `encode_categoricals` | `false`          |
///
/// Numeric parameters are validated when the pipeline runs, by the
/// partitioner and the forest config.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    data_path: PathBuf,
    label: String,
    holdout_fraction: f64,
    seed: u64,
    n_trees: usize,
    encode_categoricals: bool,
}

impl PipelineConfig {
    /// Create a config reading the dataset at `data_path`.
    pub fn new(data_path: &Path) -> Self {
        Self {
            data_path: data_path.to_path_buf(),
            label: LABEL_COLUMN.to_string(),
            holdout_fraction: 0.2,
            seed: 42,
            n_trees: 100,
            encode_categoricals: false,
        }
    }

    /// Set the label column.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the fraction of rows withheld for evaluation.
    #[must_use]
    pub fn with_holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = fraction;
        self
    }

    /// Set the seed shared by the partitioner and the forest.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of trees.
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Ordinal-encode text feature columns instead of rejecting them.
    #[must_use]
    pub fn with_encode_categoricals(mut self, encode: bool) -> Self {
        self.encode_categoricals = encode;
        self
    }

    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn holdout_fraction(&self) -> f64 {
        self.holdout_fraction
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    #[must_use]
    pub fn encode_categoricals(&self) -> bool {
        self.encode_categoricals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard() {
        let config = PipelineConfig::new(Path::new("dataset.csv"));
        assert_eq!(config.label(), "PurchaseStatus");
        assert_eq!(config.holdout_fraction(), 0.2);
        assert_eq!(config.seed(), 42);
        assert_eq!(config.n_trees(), 100);
        assert!(!config.encode_categoricals());
    }

    #[test]
    fn setters_chain() {
        let config = PipelineConfig::new(Path::new("x.csv"))
            .with_label("Bought")
            .with_holdout_fraction(0.25)
            .with_seed(7)
            .with_n_trees(10)
            .with_encode_categoricals(true);
        assert_eq!(config.label(), "Bought");
        assert_eq!(config.holdout_fraction(), 0.25);
        assert_eq!(config.seed(), 7);
        assert_eq!(config.n_trees(), 10);
        assert!(config.encode_categoricals());
        assert_eq!(config.data_path(), Path::new("x.csv"));
    }
}
