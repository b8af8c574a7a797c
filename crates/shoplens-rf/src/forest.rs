//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{MaxFeatures, RandomForestConfig};
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::node::Node;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, DecisionTreeConfig};
use crate::validate;

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

/// Resolve `MaxFeatures` to a concrete count.
pub(crate) fn resolve_max_features(
    max_features: MaxFeatures,
    n_features: usize,
) -> Result<usize, RfError> {
    let resolved = match max_features {
        MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
        MaxFeatures::Log2 => (n_features as f64).log2().ceil().max(1.0) as usize,
        MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
        MaxFeatures::Fixed(n) => n,
        MaxFeatures::All => n_features,
    };
    if resolved == 0 || resolved > n_features {
        return Err(RfError::InvalidMaxFeatures {
            max_features: resolved,
            n_features,
        });
    }
    Ok(resolved)
}

/// Draw `n_samples` row indices with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, RfError> {
    let n_features = validate::check_matrix(features, labels)?;
    validate::check_classes(labels)?;
    let max_features = resolve_max_features(config.max_features, n_features)?;

    let n_samples = features.len();
    let n_classes = validate::n_classes(labels);

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        "training random forest"
    );

    // Per-tree seeds come from one master stream so results do not depend
    // on how rayon schedules the trees.
    let mut master = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master.r#gen()).collect();

    let tree_config = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features));

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| -> Result<DecisionTree, RfError> {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let rows = bootstrap_sample(n_samples, &mut rng);
            let boot_features: Vec<Vec<f64>> = rows.iter().map(|&i| features[i].clone()).collect();
            let boot_labels: Vec<usize> = rows.iter().map(|&i| labels[i]).collect();
            let mut tree = tree_config
                .clone()
                .with_seed(rng.r#gen())
                .fit(&boot_features, &boot_labels)?;
            // A bootstrap sample can miss the highest class entirely.
            tree.n_classes = n_classes;
            for node in &mut tree.nodes {
                if let Node::Leaf { distribution, .. } = node {
                    distribution.resize(n_classes, 0.0);
                }
            }
            Ok(tree)
        })
        .collect::<Result<_, RfError>>()?;

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree, feature_names);

    debug!(
        n_nodes = trees.iter().map(DecisionTree::n_nodes).sum::<usize>(),
        "tree training complete"
    );

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
    };
    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved: max_features,
    };

    info!("random forest training complete");
    Ok(RandomForestResult::new(forest, importances, metadata))
}

#[cfg(test)]
mod tests {
    use crate::config::{MaxFeatures, RandomForestConfig};
    use crate::error::RfError;

    /// Two well-separated classes along `x`; `y` is constant noise.
    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            features.push(vec![i as f64 * 0.1, 0.5]);
            labels.push(0);
        }
        for i in 0..30 {
            features.push(vec![10.0 + i as f64 * 0.1, 0.5]);
            labels.push(1);
        }
        (features, labels, vec!["x".to_string(), "y".to_string()])
    }

    #[test]
    fn separable_training_accuracy() {
        let (features, labels, names) = make_separable_data();
        let result = RandomForestConfig::new(25)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &names)
            .unwrap();
        let predictions = result.forest().predict_batch(&features).unwrap();
        assert_eq!(predictions, labels);
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let (features, labels, names) = make_separable_data();
        let result = RandomForestConfig::new(20)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        let total: f64 = result.importances().iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        assert!(result.importances().iter().all(|f| f.importance >= 0.0));
        assert_eq!(result.importances()[0].name, "x");
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels, names) = make_separable_data();
        let fit = || {
            RandomForestConfig::new(10)
                .unwrap()
                .with_seed(99)
                .fit(&features, &labels, &names)
                .unwrap()
        };
        let a = fit().forest().predict_proba_batch(&features).unwrap();
        let b = fit().forest().predict_proba_batch(&features).unwrap();
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa.as_slice(), pb.as_slice());
        }
    }

    #[test]
    fn empty_dataset_error() {
        let err = RandomForestConfig::new(10)
            .unwrap()
            .fit(&[], &[], &[])
            .unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn single_class_error() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let err = RandomForestConfig::new(10)
            .unwrap()
            .fit(&features, &[0, 0, 0], &["x".to_string()])
            .unwrap_err();
        assert!(matches!(err, RfError::SingleClass { class: 0 }));
    }

    #[test]
    fn metadata_reflects_training_set() {
        let (features, labels, names) = make_separable_data();
        let result = RandomForestConfig::new(3)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        let meta = result.metadata();
        assert_eq!(meta.n_trees, 3);
        assert_eq!(meta.n_samples, 60);
        assert_eq!(meta.n_features, 2);
        assert_eq!(meta.n_classes, 2);
        assert_eq!(meta.max_features_resolved, 2);
    }

    #[test]
    fn leaf_distributions_cover_all_classes() {
        let (features, labels, names) = make_separable_data();
        let result = RandomForestConfig::new(15)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        for dist in result.forest().predict_proba_batch(&features).unwrap() {
            assert_eq!(dist.as_slice().len(), 2);
        }
    }
}
