//! Variance gate: dispersion `var / mean²` per metric as an optional
//! multiplier. Off by default; when off, every metric gets a multiplier of 1.

use crate::normalise::{mean, normalise_distribution, sample_variance};
use crate::orient::OrientedMatrix;
use crate::weights::WeightVector;

/// Means closer to zero than this make the statistic 0.
pub const MEAN_EPS: f64 = 1e-12;

/// Squared coefficient of variation over observed values.
pub fn dispersion(values: &[f64]) -> f64 {
    match (mean(values), sample_variance(values)) {
        (Some(m), Some(var)) if m.abs() >= MEAN_EPS => var / (m * m),
        _ => 0.0,
    }
}

/// Normalised dispersion weights (uniform when every metric has none).
pub fn variance_weights(oriented: &OrientedMatrix) -> WeightVector {
    let stats: Vec<f64> = (0..oriented.n_metrics())
        .map(|j| dispersion(&oriented.observed(j)))
        .collect();
    tracing::debug!(?stats, "Variance-to-mean-squared ratios");
    WeightVector::from_trusted(oriented.metrics().to_vec(), normalise_distribution(&stats, false))
}

/// Multiplier the combiner applies: the variance weights when the gate is
/// on, otherwise 1 for every metric.
pub fn gate_multiplier(variance: &WeightVector, enabled: bool) -> WeightVector {
    if enabled {
        variance.clone()
    } else {
        variance.with_values(vec![1.0; variance.len()])
    }
}
