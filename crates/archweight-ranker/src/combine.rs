//! Combiner: element-wise product of the entropy, dependency and gate
//! vectors, renormalised and laid out in canonical metric order.

use archweight_common::Result;

use crate::normalise::normalise_distribution;
use crate::weights::WeightVector;

pub fn combine(
    canonical: &WeightVector,
    entropy: &WeightVector,
    dependency: &WeightVector,
    gate: &WeightVector,
) -> Result<WeightVector> {
    let e = canonical.align(entropy)?;
    let d = canonical.align(dependency)?;
    let g = canonical.align(gate)?;

    let product: Vec<f64> = e
        .values()
        .iter()
        .zip(d.values())
        .zip(g.values())
        .map(|((a, b), c)| a * b * c)
        .collect();

    let combined = normalise_distribution(&product, false);
    tracing::debug!(?combined, "Combined weights");
    Ok(canonical.with_values(combined))
}
