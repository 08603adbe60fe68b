//! Monotone orientation: raw metric values → empirical-CDF values in [0, 1],
//! flipped for metrics where smaller is better, so higher is always better.

use archweight_common::{Orientation, WeightingConfig};

use crate::matrix::MetricMatrix;
use crate::normalise::ecdf_normalise;

/// Same shape as the input matrix, values in [0, 1], higher = better.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedMatrix {
    metrics: Vec<String>,
    subjects: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl OrientedMatrix {
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn n_metrics(&self) -> usize {
        self.metrics.len()
    }

    pub fn n_subjects(&self) -> usize {
        self.subjects.len()
    }

    pub fn column_at(&self, j: usize) -> &[Option<f64>] {
        &self.columns[j]
    }

    /// Observed (non-missing) values of column `j`.
    pub fn observed(&self, j: usize) -> Vec<f64> {
        self.columns[j].iter().flatten().copied().collect()
    }

    pub fn cell(&self, metric: usize, subject: usize) -> Option<f64> {
        self.columns[metric][subject]
    }

    pub fn columns(&self) -> impl Iterator<Item = &[Option<f64>]> {
        self.columns.iter().map(Vec::as_slice)
    }
}

/// Orient a single column.
pub fn orient_column(values: &[Option<f64>], orientation: Orientation) -> Vec<Option<f64>> {
    let u = ecdf_normalise(values);
    match orientation {
        Orientation::Maximize => u,
        Orientation::Minimize => u.into_iter().map(|c| c.map(|v| 1.0 - v)).collect(),
    }
}

/// Orient every column of `matrix` using the orientations in `config`.
pub fn orient(matrix: &MetricMatrix, config: &WeightingConfig) -> OrientedMatrix {
    let columns = matrix
        .metrics()
        .iter()
        .enumerate()
        .map(|(j, name)| orient_column(matrix.column_at(j), config.orientation_of(name)))
        .collect();

    OrientedMatrix {
        metrics: matrix.metrics().to_vec(),
        subjects: matrix.subjects().to_vec(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maximize_is_monotone() {
        let col = [Some(3.0), Some(1.0), Some(2.0), Some(2.0)];
        let u = orient_column(&col, Orientation::Maximize);
        let u: Vec<f64> = u.into_iter().flatten().collect();
        assert!(u[0] > u[2]);
        assert!(u[2] > u[1]);
        assert_eq!(u[2], u[3], "ties keep equal CDF values");
        assert!(u.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_minimize_flips() {
        let col = [Some(1.0), Some(2.0)];
        let up = orient_column(&col, Orientation::Maximize);
        let down = orient_column(&col, Orientation::Minimize);
        assert_eq!(up, vec![Some(0.5), Some(1.0)]);
        assert_eq!(down, vec![Some(0.5), Some(0.0)]);
    }

    #[test]
    fn test_orient_matrix_uses_config() {
        let matrix = MetricMatrix::from_dense(
            vec!["good".into(), "bad".into()],
            vec!["s1".into(), "s2".into()],
            vec![vec![1.0, 2.0], vec![1.0, 2.0]],
        )
        .unwrap();
        let mut config = WeightingConfig::default();
        config.orientation.insert("bad".into(), Orientation::Minimize);
        let oriented = orient(&matrix, &config);
        assert_eq!(oriented.cell(0, 1), Some(1.0));
        assert_eq!(oriented.cell(1, 1), Some(0.0));
        assert_eq!(oriented.subjects(), matrix.subjects());
    }
}
