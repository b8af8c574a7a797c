//! Random Forest classification: partition, train, evaluate.
//!
//! Provides a CART-based Random Forest with Gini/Entropy split criteria,
//! parallel tree training via rayon, mean-decrease-in-impurity feature
//! importance, a seeded train/holdout partitioner, and holdout evaluation
//! (accuracy, per-class report, confusion matrix). Training and evaluation
//! go through the [`Classifier`] trait so the ensemble can be swapped out.

mod classifier;
mod config;
mod confusion;
mod error;
mod forest;
mod holdout;
mod importance;
mod node;
mod partition;
mod predict;
mod result;
mod split;
mod tree;
mod validate;

pub use classifier::{Classifier, train};
pub use config::{MaxFeatures, RandomForestConfig};
pub use confusion::{AveragedMetrics, ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use error::RfError;
pub use forest::RandomForest;
pub use holdout::{HoldoutEvaluation, evaluate};
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use partition::{Partition, TrainTestSplit};
pub use predict::ClassDistribution;
pub use result::{RandomForestResult, TrainingMetadata};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
