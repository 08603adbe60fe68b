//! Normalisation primitives.
//!
//! `normalise_distribution` is the single probability normaliser every stage
//! reuses; it never fails on degenerate input. The rank helpers back the
//! empirical-CDF orientation and the Spearman correlation.

use std::cmp::Ordering;

/// Turn any vector into a probability distribution.
///
/// Non-finite entries become 0 and negatives are clamped to 0. When nothing is
/// left, the result is the zero vector if `zero_ok`, else uniform.
pub fn normalise_distribution(values: &[f64], zero_ok: bool) -> Vec<f64> {
    let cleaned = clean_non_negative(values);
    let sum: f64 = cleaned.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        return cleaned.into_iter().map(|v| v / sum).collect();
    }

    let n = cleaned.len();
    if zero_ok || n == 0 {
        vec![0.0; n]
    } else {
        tracing::debug!(len = n, "Degenerate vector, falling back to uniform");
        vec![1.0 / n as f64; n]
    }
}

/// Replace non-finite entries with 0 and clamp negatives to 0.
pub fn clean_non_negative(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|&v| if v.is_finite() { v.max(0.0) } else { 0.0 })
        .collect()
}

/// Ascending ranks in [1, N]; ties get the average of the ranks they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        // Find group of equal values
        while j + 1 < n && indexed[j + 1].1 == indexed[i].1 {
            j += 1;
        }
        let avg_rank = (i + 1 + j + 1) as f64 / 2.0;
        for item in &indexed[i..=j] {
            ranks[item.0] = avg_rank;
        }
        i = j + 1;
    }
    ranks
}

/// Empirical CDF of each observation: average rank / N, in (0, 1].
/// Missing observations stay missing and do not count towards N.
pub fn ecdf_normalise(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let observed: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i, x)))
        .collect();
    let n = observed.len();

    let mut out = vec![None; values.len()];
    if n == 0 {
        return out;
    }
    let raw: Vec<f64> = observed.iter().map(|&(_, v)| v).collect();
    let ranks = average_ranks(&raw);
    for ((idx, _), rank) in observed.iter().zip(ranks) {
        out[*idx] = Some(rank / n as f64);
    }
    out
}

/// Sample mean over observed entries.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample variance (n - 1 denominator); undefined below two observations.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / (values.len() - 1) as f64)
}
