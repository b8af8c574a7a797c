use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// An empty node is pure.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            SplitCriterion::Gini => {
                1.0 - class_counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum::<f64>()
            }
            SplitCriterion::Entropy => -class_counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        };
        Impurity::new(value)
    }
}

impl std::str::FromStr for SplitCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gini" => Ok(Self::Gini),
            "entropy" => Ok(Self::Entropy),
            other => Err(format!("unknown criterion: {other} (expected gini or entropy)")),
        }
    }
}

/// The best split found for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·parent - n_l·left - n_r·right`, the unnormalized MDI contribution.
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Node-level inputs shared by every candidate feature.
pub(crate) struct SplitContext<'a> {
    /// Column-major: `columns[feature_idx][sample_idx]`.
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

impl SplitContext<'_> {
    /// Find the best threshold split among `max_features` randomly drawn features.
    ///
    /// Each candidate feature is sorted once and scanned left to right with
    /// incremental class counts. Thresholds sit halfway between adjacent
    /// distinct values. Returns `None` when no split satisfies
    /// `min_samples_leaf` or every candidate feature is constant.
    pub(crate) fn best_split(
        &self,
        sample_indices: &[usize],
        rng: &mut impl Rng,
    ) -> Option<SplitResult> {
        let n_features = self.columns.len();
        let n_samples = sample_indices.len();
        if n_samples < 2 || n_features == 0 {
            return None;
        }

        let mut parent_counts = vec![0usize; self.n_classes];
        for &si in sample_indices {
            parent_counts[self.labels[si]] += 1;
        }
        let parent = self.criterion.impurity(&parent_counts, n_samples).value();

        // Partial Fisher-Yates over the feature indices.
        let take = self.max_features.min(n_features);
        let mut order: Vec<usize> = (0..n_features).collect();
        for i in 0..take {
            let j = rng.gen_range(i..n_features);
            order.swap(i, j);
        }

        let mut best_decrease = f64::NEG_INFINITY;
        let mut best: Option<(usize, f64)> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n_samples);

        for &feat_idx in &order[..take] {
            let column = &self.columns[feat_idx];
            sorted.clear();
            sorted.extend(sample_indices.iter().map(|&si| (column[si], si)));
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent_counts.clone();

            for i in 0..n_samples - 1 {
                let (value, si) = sorted[i];
                let class = self.labels[si];
                left[class] += 1;
                right[class] -= 1;

                let next = sorted[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n_samples - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let decrease = n_samples as f64 * parent
                    - n_left as f64 * self.criterion.impurity(&left, n_left).value()
                    - n_right as f64 * self.criterion.impurity(&right, n_right).value();

                if decrease > best_decrease {
                    best_decrease = decrease;
                    best = Some((feat_idx, (value + next) / 2.0));
                }
            }
        }

        let (feature, threshold) = best?;
        let column = &self.columns[feature];
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
            .iter()
            .partition(|&&si| column[si] <= threshold);

        Some(SplitResult {
            feature: FeatureIndex::new(feature),
            threshold,
            impurity_decrease: best_decrease,
            left_indices,
            right_indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{SplitContext, SplitCriterion};

    fn context<'a>(
        columns: &'a [Vec<f64>],
        labels: &'a [usize],
        min_samples_leaf: usize,
    ) -> SplitContext<'a> {
        SplitContext {
            columns,
            labels,
            n_classes: 2,
            criterion: SplitCriterion::Gini,
            max_features: columns.len(),
            min_samples_leaf,
        }
    }

    #[test]
    fn gini_binary_balanced() {
        let imp = SplitCriterion::Gini.impurity(&[5, 5], 10);
        assert!((imp.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn gini_pure() {
        let imp = SplitCriterion::Gini.impurity(&[0, 7], 7);
        assert!(imp.value().abs() < f64::EPSILON);
    }

    #[test]
    fn entropy_binary_balanced() {
        let imp = SplitCriterion::Entropy.impurity(&[5, 5], 10);
        assert!((imp.value() - 2.0_f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn criterion_from_str() {
        assert_eq!("gini".parse::<SplitCriterion>(), Ok(SplitCriterion::Gini));
        assert_eq!(
            "entropy".parse::<SplitCriterion>(),
            Ok(SplitCriterion::Entropy)
        );
        assert!("variance".parse::<SplitCriterion>().is_err());
    }

    #[test]
    fn separable_data_splits_between_groups() {
        let columns = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split = context(&columns, &labels, 1)
            .best_split(&indices, &mut rng)
            .expect("should find a split");

        assert_eq!(split.feature.index(), 0);
        assert!(split.threshold > 3.0 && split.threshold < 10.0);
        assert_eq!(split.left_indices, vec![0, 1, 2]);
        assert_eq!(split.right_indices, vec![3, 4, 5]);
        // 6 * 0.5 - 0 - 0
        assert!((split.impurity_decrease - 3.0).abs() < 1e-10);
    }

    #[test]
    fn constant_feature_has_no_split() {
        let columns = vec![vec![5.0; 4]];
        let labels = vec![0, 0, 1, 1];
        let indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(context(&columns, &labels, 1)
            .best_split(&indices, &mut rng)
            .is_none());
    }

    #[test]
    fn min_samples_leaf_blocks_split() {
        let columns = vec![vec![1.0, 10.0]];
        let labels = vec![0, 1];
        let indices = vec![0, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(context(&columns, &labels, 2)
            .best_split(&indices, &mut rng)
            .is_none());
    }
}
