//! Convex blend of the computed weights with an external prior, followed by
//! the optional capped projection.

use archweight_common::{Result, WeightingError};

use crate::normalise::normalise_distribution;
use crate::projection::{project_capped_simplex, ProjectionOutcome};
use crate::weights::WeightVector;

/// Blended weights before and after the cap.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendResult {
    pub blended: WeightVector,
    pub final_weights: WeightVector,
    /// `None` when no cap was applied.
    pub projection: Option<ProjectionOutcome>,
}

/// `alpha * computed + (1 - alpha) * prior`, renormalised, then capped.
///
/// A prior with no mass contributes nothing, whatever `alpha` is: the result
/// is then the normalised `computed` vector.
pub fn blend(
    computed: &WeightVector,
    prior: &WeightVector,
    alpha: f64,
    cap: Option<f64>,
) -> Result<BlendResult> {
    if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
        return Err(WeightingError::config(format!("alpha must lie in [0, 1], got {alpha}")));
    }
    let prior = computed.align(prior)?;

    let computed_norm = normalise_distribution(computed.values(), false);
    let prior_norm = normalise_distribution(prior.values(), true);

    let blended = if prior_norm.iter().all(|p| *p == 0.0) {
        tracing::debug!("Prior carries no mass, blended weights equal computed weights");
        computed_norm
    } else {
        let mixed: Vec<f64> = computed_norm
            .iter()
            .zip(&prior_norm)
            .map(|(c, p)| alpha * c + (1.0 - alpha) * p)
            .collect();
        normalise_distribution(&mixed, false)
    };
    let blended = computed.with_values(blended);

    match cap.filter(|c| c.is_finite() && *c < 1.0) {
        Some(c) => {
            let (final_weights, outcome) = project_capped_simplex(&blended, c)?;
            Ok(BlendResult { blended, final_weights, projection: Some(outcome) })
        }
        None => Ok(BlendResult {
            final_weights: blended.clone(),
            blended,
            projection: None,
        }),
    }
}
