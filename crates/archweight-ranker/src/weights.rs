//! Ordered metric-name → weight map.
//!
//! Every stage of the pipeline produces one of these over the same fixed key
//! set, validated once when the pipeline starts. Keys keep the configured
//! metric order so positional arithmetic between stages is safe.

use std::collections::HashSet;

use archweight_common::{Result, WeightingError};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Tolerance used when checking that a vector sums to one.
pub const SUM_TOLERANCE: f64 = 1e-9;

/// Weights keyed by metric name, in canonical metric order.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl WeightVector {
    /// Build from parallel name/value lists. Names must be unique.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(WeightingError::config(format!(
                "{} metric names but {} weights",
                names.len(),
                values.len()
            )));
        }
        let mut seen = HashSet::with_capacity(names.len());
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(WeightingError::config(format!("duplicate metric '{dup}'")));
        }
        Ok(Self { names, values })
    }

    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Result<Self> {
        let (names, values): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        Self::new(names, values)
    }

    /// Uniform distribution over `names`.
    pub fn uniform(names: Vec<String>) -> Self {
        let n = names.len();
        let values = if n == 0 { vec![] } else { vec![1.0 / n as f64; n] };
        Self { names, values }
    }

    /// Names already known to be unique (they come from a validated matrix).
    pub(crate) fn from_trusted(names: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Same keys, new values. Callers guarantee the length matches.
    pub(crate) fn with_values(&self, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.names.len());
        Self { names: self.names.clone(), values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names.iter().position(|n| n == name).map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Non-negative, finite and summing to one within `tol`.
    pub fn is_distribution(&self, tol: f64) -> bool {
        self.values.iter().all(|v| v.is_finite() && *v >= 0.0) && (self.sum() - 1.0).abs() <= tol
    }

    /// Reorder `other` to this vector's key order. Fails when the key sets differ.
    pub fn align(&self, other: &WeightVector) -> Result<WeightVector> {
        if self.len() != other.len() {
            return Err(WeightingError::config(format!(
                "weight vectors differ in length: {} vs {}",
                self.len(),
                other.len()
            )));
        }
        let values = self
            .names
            .iter()
            .map(|name| {
                other.get(name).ok_or_else(|| {
                    WeightingError::config(format!("metric '{name}' missing from aligned weight vector"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_values(values))
    }
}

impl Serialize for WeightVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_uniform_sums_to_one() {
        let w = WeightVector::uniform(names(&["a", "b", "c"]));
        assert!(w.is_distribution(SUM_TOLERANCE));
        assert!((w.get("b").unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_duplicate_names() {
        assert!(WeightVector::new(names(&["a", "a"]), vec![0.5, 0.5]).is_err());
    }

    #[test]
    fn test_rejects_length_mismatch() {
        assert!(WeightVector::new(names(&["a", "b"]), vec![1.0]).is_err());
    }

    #[test]
    fn test_align_reorders_by_name() {
        let base = WeightVector::uniform(names(&["a", "b"]));
        let other = WeightVector::from_pairs([("b", 0.9), ("a", 0.1)]).unwrap();
        let aligned = base.align(&other).unwrap();
        assert_eq!(aligned.values(), &[0.1, 0.9]);
        assert_eq!(aligned.names(), base.names());
    }

    #[test]
    fn test_align_rejects_different_keys() {
        let base = WeightVector::uniform(names(&["a", "b"]));
        let other = WeightVector::from_pairs([("a", 0.5), ("z", 0.5)]).unwrap();
        assert!(matches!(base.align(&other), Err(WeightingError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let w = WeightVector::from_pairs([("z", 0.25), ("a", 0.75)]).unwrap();
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, r#"{"z":0.25,"a":0.75}"#);
    }
}
