//! Dependency weighting.
//!
//! A metric whose ranking agrees with the unweighted consensus adds little
//! independent signal. Raw weight is `1 - |ρ|` with ρ the Spearman rank
//! correlation against `R_unw`.

use tracing::debug;

use crate::normalise::{average_ranks, normalise_distribution, sample_variance};
use crate::orient::OrientedMatrix;
use crate::reference::UnweightedReference;
use crate::weights::WeightVector;

/// Below this standard deviation a column counts as constant (ρ = 1).
pub const CONSTANT_STD_THRESHOLD: f64 = 1e-12;

/// Raw weights summing below this are "all redundant".
pub const ALL_REDUNDANT_THRESHOLD: f64 = 1e-12;

/// Spearman rank correlation over pairs where both sides are observed.
/// `None` when fewer than two pairs remain or either side has no spread.
pub fn spearman(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let (fx, fy): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .unzip();

    if fx.len() < 2 {
        return None;
    }
    pearson(&average_ranks(&fx), &average_ranks(&fy))
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den_x = 0.0;
    let mut den_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    if den_x <= 1e-12 || den_y <= 1e-12 {
        return None;
    }
    Some(num / (den_x * den_y).sqrt())
}

/// Absolute rank correlation of each metric with the reference ranking.
pub fn redundancy(oriented: &OrientedMatrix, reference: &UnweightedReference) -> Vec<f64> {
    (0..oriented.n_metrics())
        .map(|j| {
            let observed = oriented.observed(j);
            let std = sample_variance(&observed).map(f64::sqrt);
            match std {
                Some(s) if s >= CONSTANT_STD_THRESHOLD => {
                    spearman(oriented.column_at(j), &reference.ranks)
                        .map(f64::abs)
                        .filter(|r| r.is_finite())
                        .unwrap_or(0.0)
                }
                // Constant (or under-observed) metric carries no independent signal
                _ => 1.0,
            }
        })
        .collect()
}

pub fn dependency_weights(oriented: &OrientedMatrix, reference: &UnweightedReference) -> WeightVector {
    let rho = redundancy(oriented, reference);
    debug!(?rho, "Rank correlation with unweighted reference");

    let raw: Vec<f64> = rho.iter().map(|r| (1.0 - r).max(0.0)).collect();
    let names = oriented.metrics().to_vec();
    if raw.iter().sum::<f64>() < ALL_REDUNDANT_THRESHOLD {
        tracing::warn!("Every metric tracks the reference ranking, using uniform dependency weights");
        return WeightVector::uniform(names);
    }
    WeightVector::from_trusted(names, normalise_distribution(&raw, false))
}
