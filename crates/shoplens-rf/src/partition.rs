//! Deterministic train/holdout partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::RfError;

/// Seeded train/holdout splitter.
///
/// Row indices `0..n` are shuffled with a Fisher-Yates shuffle driven by
/// `ChaCha8Rng::seed_from_u64(seed)`; the first `floor(n * holdout_fraction)`
/// shuffled indices form the holdout set and the rest the training set.
/// The same `(n, fraction, seed)` always yields the same partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainTestSplit {
    holdout_fraction: f64,
    seed: u64,
}

/// Disjoint training and holdout row indices covering `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Training row indices, in shuffled order.
    pub train: Vec<usize>,
    /// Holdout row indices, in shuffled order.
    pub holdout: Vec<usize>,
}

impl TrainTestSplit {
    /// Create a splitter withholding `holdout_fraction` of the rows.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidHoldoutFraction`] unless `0 < fraction < 1`.
    pub fn new(holdout_fraction: f64) -> Result<Self, RfError> {
        if !(holdout_fraction > 0.0 && holdout_fraction < 1.0) {
            return Err(RfError::InvalidHoldoutFraction {
                fraction: holdout_fraction,
            });
        }
        Ok(Self {
            holdout_fraction,
            seed: 42,
        })
    }

    /// Set the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the holdout fraction.
    #[must_use]
    pub fn holdout_fraction(&self) -> f64 {
        self.holdout_fraction
    }

    /// Return the shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of holdout rows for a dataset of `n_rows`.
    #[must_use]
    pub fn holdout_size(&self, n_rows: usize) -> usize {
        // Absorb float error in N·f before flooring.
        let exact = n_rows as f64 * self.holdout_fraction;
        (exact + exact * f64::EPSILON * 4.0 + 1e-9).floor() as usize
    }

    /// Partition `0..n_rows` into training and holdout indices.
    #[must_use]
    pub fn split(&self, n_rows: usize) -> Partition {
        let mut order: Vec<usize> = (0..n_rows).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);

        let train = order.split_off(self.holdout_size(n_rows));
        debug!(
            n_rows,
            n_train = train.len(),
            n_holdout = order.len(),
            "rows partitioned"
        );
        Partition {
            train,
            holdout: order,
        }
    }
}

impl Partition {
    /// Gather the rows selected by `indices` from `items`.
    #[must_use]
    pub fn take<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
        indices.iter().map(|&i| items[i].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn hundred_rows_gives_twenty_holdout() {
        let p = TrainTestSplit::new(0.2).unwrap().split(100);
        assert_eq!(p.holdout.len(), 20);
        assert_eq!(p.train.len(), 80);
    }

    #[test]
    fn holdout_size_floors() {
        let split = TrainTestSplit::new(0.2).unwrap();
        assert_eq!(split.holdout_size(9), 1);
        assert_eq!(split.holdout_size(4), 0);
        assert_eq!(split.holdout_size(101), 20);

        let split = TrainTestSplit::new(0.29).unwrap();
        assert_eq!(split.holdout_size(100), 29);
        assert_eq!(split.holdout_size(99), 28);
        assert_eq!(TrainTestSplit::new(0.7).unwrap().holdout_size(10), 7);
    }

    #[test]
    fn sets_are_disjoint_and_cover_all_rows() {
        let p = TrainTestSplit::new(0.3).unwrap().with_seed(7).split(57);
        let train: HashSet<usize> = p.train.iter().copied().collect();
        let holdout: HashSet<usize> = p.holdout.iter().copied().collect();
        assert!(train.is_disjoint(&holdout));
        assert_eq!(train.len() + holdout.len(), 57);
        assert_eq!(
            train.union(&holdout).copied().collect::<HashSet<_>>(),
            (0..57).collect()
        );
    }

    #[test]
    fn same_seed_same_partition() {
        let split = TrainTestSplit::new(0.2).unwrap().with_seed(42);
        assert_eq!(split.split(250), split.split(250));
    }

    #[test]
    fn different_seed_different_partition() {
        let a = TrainTestSplit::new(0.2).unwrap().with_seed(1).split(250);
        let b = TrainTestSplit::new(0.2).unwrap().with_seed(2).split(250);
        assert_ne!(a.holdout, b.holdout);
    }

    #[test]
    fn invalid_fractions_rejected() {
        for f in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(
                matches!(
                    TrainTestSplit::new(f),
                    Err(RfError::InvalidHoldoutFraction { .. })
                ),
                "fraction {f} accepted"
            );
        }
    }

    #[test]
    fn take_gathers_in_index_order() {
        let items = vec!['a', 'b', 'c', 'd'];
        assert_eq!(Partition::take(&items, &[3, 0]), vec!['d', 'a']);
    }
}
