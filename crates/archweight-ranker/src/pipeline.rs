//! End-to-end weight derivation.
//!
//! raw matrix → oriented matrix → {entropy, dependency, variance} →
//! combined → blended → final (capped) weights.
//!
//! Configuration and shape errors surface before any computation; numerical
//! degeneracies are absorbed by the stages' fallbacks so a valid run always
//! ends with a valid distribution.

use archweight_common::{Result, WeightingConfig};
use tracing::info;

use crate::blend::blend;
use crate::combine::combine;
use crate::dependency::dependency_weights;
use crate::entropy::entropy_weights;
use crate::matrix::MetricMatrix;
use crate::orient::{orient, OrientedMatrix};
use crate::projection::{check_feasible, ProjectionOutcome};
use crate::reference::unweighted_reference;
use crate::variance::{gate_multiplier, variance_weights};
use crate::weights::WeightVector;

/// Every intermediate and final weight vector of one run.
#[derive(Debug, Clone)]
pub struct WeightingReport {
    pub oriented: OrientedMatrix,
    pub entropy: WeightVector,
    pub dependency: WeightVector,
    /// Dispersion weights, computed even when the gate is off.
    pub variance: WeightVector,
    pub variance_gate: bool,
    pub combined: WeightVector,
    pub blended: WeightVector,
    pub final_weights: WeightVector,
    pub projection: Option<ProjectionOutcome>,
}

/// Run the pipeline with the prior taken from `config.user_scores`.
pub fn run_pipeline(matrix: &MetricMatrix, config: &WeightingConfig) -> Result<WeightingReport> {
    config.validate()?;
    let prior = WeightVector::new(config.metrics.clone(), config.prior_scores())?;
    run_pipeline_with_prior(matrix, config, &prior)
}

/// Run the pipeline against an explicit prior over the configured metrics.
pub fn run_pipeline_with_prior(
    matrix: &MetricMatrix,
    config: &WeightingConfig,
    prior: &WeightVector,
) -> Result<WeightingReport> {
    config.validate()?;
    let selected = matrix.select(&config.metrics)?;
    let keys = WeightVector::uniform(config.metrics.clone());
    // Reject mismatched priors and infeasible caps before computing anything
    keys.align(prior)?;
    let cap = config.effective_cap();
    if let Some(c) = cap {
        check_feasible(keys.len(), c)?;
    }

    info!(
        metrics = selected.n_metrics(),
        subjects = selected.n_subjects(),
        variance_gate = config.use_variance_gate,
        cap = ?cap,
        alpha = config.alpha,
        "Deriving metric weights"
    );

    let oriented = orient(&selected, config);
    let reference = unweighted_reference(&oriented);

    let entropy = entropy_weights(&oriented);
    let dependency = dependency_weights(&oriented, &reference);
    let variance = variance_weights(&oriented);
    let gate = gate_multiplier(&variance, config.use_variance_gate);

    let combined = combine(&keys, &entropy, &dependency, &gate)?;
    let blended = blend(&combined, prior, config.alpha, cap)?;

    info!(final_weights = ?blended.final_weights.values(), "Metric weights derived");

    Ok(WeightingReport {
        oriented,
        entropy,
        dependency,
        variance,
        variance_gate: config.use_variance_gate,
        combined,
        blended: blended.blended,
        final_weights: blended.final_weights,
        projection: blended.projection,
    })
}
