//! Entropy weighting.
//!
//! Each oriented column is treated as a distribution over subjects. Low
//! entropy (values concentrated on few subjects) means more discriminative
//! information, so diversity `d = max(0, 1 - e)` becomes the weight.

use crate::normalise::normalise_distribution;
use crate::orient::OrientedMatrix;
use crate::weights::WeightVector;

/// Additive floor inside the logarithm.
pub const ENTROPY_EPS: f64 = 1e-12;

/// Normalised Shannon entropy of a column across `n_subjects` subjects.
/// Missing cells carry no mass. Below two subjects the entropy is 1.
pub fn column_entropy(column: &[Option<f64>], n_subjects: usize) -> f64 {
    if n_subjects < 2 {
        return 1.0;
    }
    let mass: Vec<f64> = column.iter().map(|c| c.unwrap_or(0.0)).collect();
    let p = normalise_distribution(&mass, false);
    let h: f64 = p.iter().map(|&pi| pi * (pi + ENTROPY_EPS).ln()).sum();
    -h / (n_subjects as f64).ln()
}

/// Diversity score `max(0, 1 - e)` per metric.
pub fn diversity_scores(oriented: &OrientedMatrix) -> Vec<f64> {
    let n = oriented.n_subjects();
    oriented
        .columns()
        .map(|col| (1.0 - column_entropy(col, n)).max(0.0))
        .collect()
}

pub fn entropy_weights(oriented: &OrientedMatrix) -> WeightVector {
    let d = diversity_scores(oriented);
    tracing::debug!(?d, "Entropy diversity scores");
    WeightVector::from_trusted(oriented.metrics().to_vec(), normalise_distribution(&d, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MetricMatrix;
    use crate::orient::orient;
    use archweight_common::WeightingConfig;

    fn oriented(columns: Vec<Vec<f64>>) -> OrientedMatrix {
        let metrics = (0..columns.len()).map(|j| format!("m{j}")).collect();
        let subjects = (0..columns[0].len()).map(|i| format!("s{i}")).collect();
        let matrix = MetricMatrix::from_dense(metrics, subjects, columns).unwrap();
        orient(&matrix, &WeightingConfig::default())
    }

    #[test]
    fn test_constant_column_has_zero_diversity() {
        let o = oriented(vec![vec![4.0; 6], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]]);
        let d = diversity_scores(&o);
        assert!(d[0].abs() < 1e-9, "constant column diversity = {}", d[0]);
        assert!(d[1] > d[0]);
    }

    #[test]
    fn test_uniform_mass_entropy_is_one() {
        let e = column_entropy(&[Some(1.0), Some(1.0), Some(1.0), Some(1.0)], 4);
        assert!((e - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_concentrated_mass_has_low_entropy() {
        let e = column_entropy(&[Some(1.0), Some(0.0), Some(0.0), Some(0.0)], 4);
        assert!(e.abs() < 1e-9);
    }

    #[test]
    fn test_single_subject_falls_back_to_uniform() {
        let o = oriented(vec![vec![1.0], vec![2.0]]);
        let w = entropy_weights(&o);
        assert_eq!(w.values(), &[0.5, 0.5]);
    }

    #[test]
    fn test_weights_are_distribution() {
        let o = oriented(vec![
            vec![1.0, 9.0, 2.0, 8.0, 3.0],
            vec![5.0, 5.0, 5.0, 5.0, 6.0],
            vec![0.1, 0.2, 0.3, 0.4, 0.5],
        ]);
        let w = entropy_weights(&o);
        assert!(w.is_distribution(1e-9));
    }
}
