//! Shared fixtures and assertions for archweight integration tests.

use archweight_ranker::{MetricMatrix, WeightVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use pretty_assertions::assert_eq;

/// `["m0", "m1", ...]`
pub fn metric_names(n: usize) -> Vec<String> {
    (0..n).map(|j| format!("m{j}")).collect()
}

/// Fully observed random matrix, reproducible from `seed`.
///
/// Each metric gets its own scale so dispersion differs between columns.
pub fn synthetic_matrix(metrics: usize, subjects: usize, seed: u64) -> MetricMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let columns = (0..metrics)
        .map(|j| {
            let scale = 1.0 + j as f64;
            (0..subjects).map(|_| rng.gen_range(0.0..scale)).collect()
        })
        .collect();
    MetricMatrix::from_dense(
        metric_names(metrics),
        (0..subjects).map(|i| format!("s{i}")).collect(),
        columns,
    )
    .expect("synthetic matrix is well formed")
}

pub fn assert_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch: {a:?} vs {b:?}");
    for (j, (x, y)) in a.iter().zip(b).enumerate() {
        assert!(
            (x - y).abs() <= tol,
            "element {j} differs by {}: {a:?} vs {b:?}",
            (x - y).abs()
        );
    }
}

/// Non-negative, finite, sums to 1 within `tol`.
pub fn assert_distribution(weights: &WeightVector, tol: f64) {
    for (name, w) in weights.iter() {
        assert!(w.is_finite() && w >= 0.0, "weight {name} = {w} is not a valid share");
    }
    assert!(
        (weights.sum() - 1.0).abs() <= tol,
        "weights sum to {} not 1: {weights:?}",
        weights.sum()
    );
}
