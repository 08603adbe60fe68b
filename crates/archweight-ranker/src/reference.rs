//! Unweighted reference composite.
//!
//! `F_unw` is the per-subject mean of the oriented metrics; `R_unw` ranks
//! subjects by descending `F_unw`. Used only to measure redundancy.

use crate::normalise::average_ranks;
use crate::orient::OrientedMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct UnweightedReference {
    /// Row mean over observed cells; `None` when a subject has none.
    pub scores: Vec<Option<f64>>,
    /// Descending average rank (1 = best) among subjects with a score.
    pub ranks: Vec<Option<f64>>,
}

pub fn unweighted_reference(oriented: &OrientedMatrix) -> UnweightedReference {
    let n = oriented.n_subjects();
    let mut sums = vec![0.0f64; n];
    let mut counts = vec![0usize; n];
    for col in oriented.columns() {
        for (i, cell) in col.iter().enumerate() {
            if let Some(v) = cell {
                sums[i] += v;
                counts[i] += 1;
            }
        }
    }

    let scores: Vec<Option<f64>> = sums
        .iter()
        .zip(&counts)
        .map(|(&s, &c)| (c > 0).then(|| s / c as f64))
        .collect();

    UnweightedReference {
        ranks: descending_ranks(&scores),
        scores,
    }
}

fn descending_ranks(scores: &[Option<f64>]) -> Vec<Option<f64>> {
    let observed: Vec<(usize, f64)> = scores
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.map(|v| (i, -v)))
        .collect();
    let negated: Vec<f64> = observed.iter().map(|&(_, v)| v).collect();

    let mut out = vec![None; scores.len()];
    for ((i, _), r) in observed.iter().zip(average_ranks(&negated)) {
        out[*i] = Some(r);
    }
    out
}
