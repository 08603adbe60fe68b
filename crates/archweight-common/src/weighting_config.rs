//! Weighting configuration.
//!
//! Every switch the pipeline honours lives here and is passed explicitly into
//! the pipeline entry point. Users can supply it as TOML, YAML or JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::{Result, WeightingError};

/// Direction in which a metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Larger raw values are better.
    #[default]
    Maximize,
    /// Smaller raw values are better; ECDF values are flipped to `1 - u`.
    Minimize,
}

/// Complete configuration for one weighting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightingConfig {
    /// Ordered list of metric column names to weight
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,

    /// Multiply in the dispersion (var / mean²) weights
    #[serde(default)]
    pub use_variance_gate: bool,

    /// Project the blended weights onto the capped simplex
    #[serde(default)]
    pub use_cap: bool,

    /// Upper bound on any single weight when `use_cap` is set
    #[serde(default = "default_cap")]
    pub cap_default: f64,

    /// Blend weight toward the computed weights (vs. the prior)
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Columns that identify a subject row in the input table
    #[serde(default = "default_id_columns")]
    pub id_columns: Vec<String>,

    /// Per-metric orientation; unlisted metrics are maximized
    #[serde(default)]
    pub orientation: BTreeMap<String, Orientation>,

    /// Prior preference per metric; empty means "no preference"
    #[serde(default)]
    pub user_scores: BTreeMap<String, f64>,
}

fn default_metrics() -> Vec<String> {
    ["CiD", "CMod", "SCF", "SMAD", "DCCMD"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_cap() -> f64 { 0.25 }
fn default_alpha() -> f64 { 0.75 }
fn default_id_columns() -> Vec<String> {
    vec!["Project".to_string(), "Candidate".to_string()]
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            metrics: default_metrics(),
            use_variance_gate: false,
            use_cap: false,
            cap_default: default_cap(),
            alpha: default_alpha(),
            id_columns: default_id_columns(),
            orientation: BTreeMap::new(),
            user_scores: BTreeMap::new(),
        }
    }
}

impl WeightingConfig {
    /// Load from a file, choosing the parser from the extension
    /// (`.yaml`/`.yml`, `.json`, anything else is read as TOML).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let config = match ext.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(&content)?,
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_toml_str(&content)?,
        };
        tracing::debug!(path = %path.display(), metrics = config.metrics.len(), "Loaded weighting config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| WeightingError::Other(e.into()))
    }

    /// Orientation declared for `metric` (maximize when unlisted).
    pub fn orientation_of(&self, metric: &str) -> Orientation {
        self.orientation.get(metric).copied().unwrap_or_default()
    }

    /// Cap to apply to the blended weights, if any.
    pub fn effective_cap(&self) -> Option<f64> {
        if self.use_cap && self.cap_default.is_finite() && self.cap_default < 1.0 {
            Some(self.cap_default)
        } else {
            None
        }
    }

    /// Prior scores in metric order; all zero when none were configured.
    pub fn prior_scores(&self) -> Vec<f64> {
        self.metrics
            .iter()
            .map(|m| self.user_scores.get(m).copied().unwrap_or(0.0))
            .collect()
    }

    /// Check everything that can be checked without the input table.
    pub fn validate(&self) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(WeightingError::config("no metrics configured"));
        }

        let mut seen = HashSet::new();
        for m in &self.metrics {
            if !seen.insert(m.as_str()) {
                return Err(WeightingError::config(format!("duplicate metric '{m}'")));
            }
        }

        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(WeightingError::config(format!(
                "alpha must lie in [0, 1], got {}",
                self.alpha
            )));
        }

        if self.use_cap && (!self.cap_default.is_finite() || self.cap_default <= 0.0 || self.cap_default > 1.0) {
            return Err(WeightingError::config(format!(
                "cap_default must lie in (0, 1], got {}",
                self.cap_default
            )));
        }

        if let Some(unknown) = self.orientation.keys().find(|k| !seen.contains(k.as_str())) {
            return Err(WeightingError::config(format!(
                "orientation given for unknown metric '{unknown}'"
            )));
        }

        if !self.user_scores.is_empty() {
            let score_keys: HashSet<&str> = self.user_scores.keys().map(String::as_str).collect();
            if score_keys != seen {
                return Err(WeightingError::config(format!(
                    "user_scores keys {:?} do not match metrics {:?}",
                    self.user_scores.keys().collect::<Vec<_>>(),
                    self.metrics
                )));
            }
        }

        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
