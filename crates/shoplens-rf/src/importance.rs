//! Feature importance aggregation across trees.

use serde::Serialize;

/// A ranked feature with name, importance score, and rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Normalized importance score (sums to 1.0 across all features).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Sum per-tree importances, normalize to 1.0, and rank descending.
///
/// Ties keep column order. If no tree ever split, every feature gets an
/// equal share so the vector still sums to 1.0.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    if names.is_empty() {
        return vec![];
    }

    let mut totals = vec![0.0f64; names.len()];
    for tree in per_tree {
        for (total, &value) in totals.iter_mut().zip(tree) {
            *total += value;
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    } else {
        let share = 1.0 / names.len() as f64;
        totals.iter_mut().for_each(|v| *v = share);
    }

    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();

    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn normalizes_and_ranks() {
        let per_tree = vec![vec![0.2, 0.8, 0.0], vec![0.6, 0.4, 0.0]];
        let ranked = aggregate_importances(&per_tree, &names(3));
        assert_eq!(ranked[0].name, "f1");
        assert_eq!(ranked[0].rank, 1);
        assert!((ranked[0].importance - 0.6).abs() < 1e-12);
        assert_eq!(ranked[2].name, "f2");
        let total: f64 = ranked.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_splits_gives_uniform_importance() {
        let per_tree = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        let ranked = aggregate_importances(&per_tree, &names(2));
        assert!(ranked.iter().all(|f| (f.importance - 0.5).abs() < 1e-12));
    }

    #[test]
    fn empty_names_yield_empty_ranking() {
        assert!(aggregate_importances(&[vec![1.0]], &[]).is_empty());
    }
}
