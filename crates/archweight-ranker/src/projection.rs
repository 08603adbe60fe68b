//! Capped simplex projection.
//!
//! Finds `λ` with `Σ clamp(v_i - λ, 0, c) = 1` and returns
//! `w_i = clamp(v_i - λ, 0, c)`: the ℓ2-nearest point to `v` on the simplex
//! with every coordinate at most `c`. The clamp-sum is non-increasing in `λ`,
//! so the search brackets a sign change in unit steps and then bisects. The
//! search runs on `v - max(v)`, which has the same solution up to the shift.
//!
//! Search states: `Bracketing → Searching → Converged | Failed`. `Failed`
//! always resolves to the cap-respecting uniform fallback.

use archweight_common::{Result, WeightingError};
use tracing::{debug, warn};

use crate::normalise::{clean_non_negative, normalise_distribution};
use crate::weights::WeightVector;

/// Tolerance on `m * cap >= 1`.
pub const FEASIBILITY_EPS: f64 = 1e-12;

/// Upper bound on unit-step bracket expansions.
pub const MAX_BRACKET_EXPANSIONS: usize = 50;

/// Upper bound on bisection steps inside a valid bracket.
pub const MAX_BISECTION_STEPS: usize = 200;

/// Bisection stops once the residual or half-bracket is below this.
pub const ROOT_TOLERANCE: f64 = 1e-12;

/// Which path produced the projected weights.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionOutcome {
    Converged { lambda: f64, iterations: usize },
    Fallback { reason: FallbackReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No sign change found within the expansion budget.
    NoBracket,
    /// Bisection ran out of steps.
    NotConverged,
}

impl ProjectionOutcome {
    pub fn converged(&self) -> bool {
        matches!(self, ProjectionOutcome::Converged { .. })
    }
}

enum SearchState {
    Bracketing { lo: f64, hi: f64, expansions: usize },
    Searching { lo: f64, hi: f64, step: usize },
    Converged { lambda: f64, iterations: usize },
    Failed(FallbackReason),
}

/// Reject caps for which no capped distribution can sum to one.
pub fn check_feasible(m: usize, cap: f64) -> Result<()> {
    if !cap.is_finite() || (m as f64) * cap < 1.0 - FEASIBILITY_EPS {
        return Err(WeightingError::InfeasibleCap { metrics: m, cap });
    }
    Ok(())
}

fn clamp_sum_residual(v: &[f64], lambda: f64, cap: f64) -> f64 {
    v.iter().map(|x| (x - lambda).clamp(0.0, cap)).sum::<f64>() - 1.0
}

/// Iteration budget for the threshold search.
#[derive(Debug, Clone, Copy)]
struct SearchLimits {
    expansions: usize,
    bisection_steps: usize,
}

const DEFAULT_LIMITS: SearchLimits = SearchLimits {
    expansions: MAX_BRACKET_EXPANSIONS,
    bisection_steps: MAX_BISECTION_STEPS,
};

/// Solve for `λ` on `v` shifted so that its largest entry is 0.
///
/// The projection is invariant to adding a constant to every entry, and the
/// shifted problem keeps the bracket near the origin where the absolute
/// tolerances are meaningful. The returned `λ` is the shifted one.
fn find_threshold(shifted: &[f64], cap: f64, limits: SearchLimits) -> ProjectionOutcome {
    let min = shifted.iter().copied().fold(0.0f64, f64::min);
    let f = |lambda: f64| clamp_sum_residual(shifted, lambda, cap);

    let mut state = SearchState::Bracketing { lo: min - 1.0, hi: 0.0, expansions: 0 };
    loop {
        state = match state {
            SearchState::Bracketing { lo, hi, expansions } => {
                let (f_lo, f_hi) = (f(lo), f(hi));
                if f_lo >= 0.0 && f_hi <= 0.0 {
                    SearchState::Searching { lo, hi, step: 0 }
                } else if expansions >= limits.expansions {
                    SearchState::Failed(FallbackReason::NoBracket)
                } else {
                    let lo = if f_lo < 0.0 { lo - 1.0 } else { lo };
                    let hi = if f_hi > 0.0 { hi + 1.0 } else { hi };
                    SearchState::Bracketing { lo, hi, expansions: expansions + 1 }
                }
            }
            SearchState::Searching { lo, hi, step } => {
                if step >= limits.bisection_steps {
                    SearchState::Failed(FallbackReason::NotConverged)
                } else {
                    let mid = 0.5 * (lo + hi);
                    let f_mid = f(mid);
                    // `mid` pinned to an endpoint means the bracket is one ulp wide
                    let exhausted = mid <= lo || mid >= hi;
                    if f_mid.abs() <= ROOT_TOLERANCE || 0.5 * (hi - lo) < ROOT_TOLERANCE || exhausted {
                        SearchState::Converged { lambda: mid, iterations: step + 1 }
                    } else if f_mid > 0.0 {
                        SearchState::Searching { lo: mid, hi, step: step + 1 }
                    } else {
                        SearchState::Searching { lo, hi: mid, step: step + 1 }
                    }
                }
            }
            SearchState::Converged { lambda, iterations } => {
                return ProjectionOutcome::Converged { lambda, iterations };
            }
            SearchState::Failed(reason) => {
                return ProjectionOutcome::Fallback { reason };
            }
        };
    }
}

/// Project `values` onto the simplex with per-coordinate upper bound `cap`.
///
/// Infeasible caps are an error. Non-convergence is absorbed: every element
/// gets `min(cap, 1/m)`.
pub fn project_values(values: &[f64], cap: f64) -> Result<(Vec<f64>, ProjectionOutcome)> {
    project_with_limits(values, cap, DEFAULT_LIMITS)
}

fn project_with_limits(values: &[f64], cap: f64, limits: SearchLimits) -> Result<(Vec<f64>, ProjectionOutcome)> {
    let m = values.len();
    check_feasible(m, cap)?;

    let v = clean_non_negative(values);
    let offset = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let shifted: Vec<f64> = v.iter().map(|x| x - offset).collect();

    let (raw, outcome): (Vec<f64>, ProjectionOutcome) = match find_threshold(&shifted, cap, limits) {
        ProjectionOutcome::Converged { lambda, iterations } => {
            let raw = shifted.iter().map(|x| (x - lambda).clamp(0.0, cap)).collect();
            let lambda = lambda + offset;
            debug!(lambda, iterations, "Capped projection converged");
            (raw, ProjectionOutcome::Converged { lambda, iterations })
        }
        ProjectionOutcome::Fallback { reason } => {
            warn!(?reason, cap, "Capped projection did not converge, using capped uniform");
            (vec![cap.min(1.0 / m as f64); m], ProjectionOutcome::Fallback { reason })
        }
    };

    Ok((normalise_distribution(&raw, false), outcome))
}

/// Capped projection of a weight vector, keeping its keys.
pub fn project_capped_simplex(weights: &WeightVector, cap: f64) -> Result<(WeightVector, ProjectionOutcome)> {
    let (values, outcome) = project_values(weights.values(), cap)?;
    Ok((weights.with_values(values), outcome))
}
