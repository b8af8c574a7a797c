//! Input checks shared by tree fitting, forest fitting, and the trainer.

use crate::error::RfError;

/// Validate a row-major feature matrix and its labels.
///
/// Returns the number of feature columns.
pub(crate) fn check_matrix(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, RfError> {
    if features.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    if labels.len() != features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Reject label sets with fewer than two distinct classes.
pub(crate) fn check_classes(labels: &[usize]) -> Result<(), RfError> {
    let Some(&first) = labels.first() else {
        return Err(RfError::EmptyDataset);
    };
    if labels.iter().all(|&l| l == first) {
        return Err(RfError::SingleClass { class: first });
    }
    Ok(())
}

/// Number of classes implied by zero-based labels.
pub(crate) fn n_classes(labels: &[usize]) -> usize {
    labels.iter().max().map_or(0, |&m| m + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_consistent_matrix() {
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(check_matrix(&features, &[0, 1]).unwrap(), 2);
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let features = vec![vec![1.0], vec![2.0]];
        let err = check_matrix(&features, &[0]).unwrap_err();
        assert!(matches!(
            err,
            RfError::LabelCountMismatch {
                n_samples: 2,
                n_labels: 1
            }
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let features = vec![vec![1.0, 2.0], vec![3.0]];
        let err = check_matrix(&features, &[0, 1]).unwrap_err();
        assert!(matches!(err, RfError::FeatureCountMismatch { sample_index: 1, .. }));
    }

    #[test]
    fn rejects_infinite_value() {
        let features = vec![vec![1.0, f64::INFINITY]];
        let err = check_matrix(&features, &[0]).unwrap_err();
        assert!(matches!(
            err,
            RfError::NonFiniteValue {
                sample_index: 0,
                feature_index: 1
            }
        ));
    }

    #[test]
    fn single_class_rejected() {
        let err = check_classes(&[1, 1, 1]).unwrap_err();
        assert!(matches!(err, RfError::SingleClass { class: 1 }));
        assert!(check_classes(&[0, 1]).is_ok());
    }

    #[test]
    fn n_classes_from_max_label() {
        assert_eq!(n_classes(&[0, 2, 1]), 3);
        assert_eq!(n_classes(&[]), 0);
    }
}
