//! Composite subject score under a weight vector.
//!
//! S(s) = Σ_j w_j · u_sj over the observed oriented cells of subject s, with
//! the weight mass renormalised over those cells.

use serde::Serialize;

use crate::normalise::average_ranks;
use crate::orient::OrientedMatrix;
use crate::weights::WeightVector;

/// Scored subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectScore {
    pub subject: String,
    pub composite_score: f64,
    /// 1 = best; ties share the average rank.
    pub rank: f64,
    /// Fraction of the weight mass observed for this subject.
    pub coverage: f64,
}

pub fn composite_score(oriented: &OrientedMatrix, weights: &[f64], subject: usize) -> (f64, f64) {
    let mut weighted_sum = 0.0;
    let mut mass = 0.0;
    for (j, w) in weights.iter().enumerate() {
        if let Some(u) = oriented.cell(j, subject) {
            weighted_sum += w * u;
            mass += w;
        }
    }
    if mass > 0.0 {
        ((weighted_sum / mass).clamp(0.0, 1.0), mass)
    } else {
        (0.0, 0.0)
    }
}

/// Score and rank every subject, best first.
pub fn score_subjects(oriented: &OrientedMatrix, weights: &WeightVector) -> Vec<SubjectScore> {
    let scored: Vec<(f64, f64)> = (0..oriented.n_subjects())
        .map(|i| composite_score(oriented, weights.values(), i))
        .collect();
    let negated: Vec<f64> = scored.iter().map(|(s, _)| -s).collect();
    let ranks = average_ranks(&negated);

    let mut out: Vec<SubjectScore> = oriented
        .subjects()
        .iter()
        .zip(scored)
        .zip(ranks)
        .map(|((subject, (composite_score, coverage)), rank)| SubjectScore {
            subject: subject.clone(),
            composite_score,
            rank,
            coverage,
        })
        .collect();
    out.sort_by(|a, b| a.rank.partial_cmp(&b.rank).unwrap_or(std::cmp::Ordering::Equal));
    out
}
