//! Metric matrix: configured metrics × subjects, cells possibly missing.
//!
//! Also hosts the CSV table adapter. Column-name matching is exact; any
//! configured metric absent from the table aborts the run.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use archweight_common::{Result, WeightingError};
use tracing::{debug, info, warn};

/// Immutable input table. Stored column-major: `columns[metric][subject]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMatrix {
    metrics: Vec<String>,
    subjects: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl MetricMatrix {
    /// Build from column-major data. Non-finite cells become missing.
    pub fn new(
        metrics: Vec<String>,
        subjects: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if metrics.len() != columns.len() {
            return Err(WeightingError::config(format!(
                "{} metric names but {} columns",
                metrics.len(),
                columns.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = metrics.iter().find(|m| !seen.insert(m.as_str())) {
            return Err(WeightingError::config(format!("duplicate metric column '{dup}'")));
        }
        if let Some((j, _)) = columns.iter().enumerate().find(|(_, c)| c.len() != subjects.len()) {
            return Err(WeightingError::config(format!(
                "column '{}' has {} cells, expected {}",
                metrics[j],
                columns[j].len(),
                subjects.len()
            )));
        }

        let columns = columns
            .into_iter()
            .map(|col| col.into_iter().map(|c| c.filter(|v| v.is_finite())).collect())
            .collect();

        Ok(Self { metrics, subjects, columns })
    }

    /// Convenience constructor for fully observed data.
    pub fn from_dense(
        metrics: Vec<String>,
        subjects: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let columns = columns
            .into_iter()
            .map(|col| col.into_iter().map(Some).collect())
            .collect();
        Self::new(metrics, subjects, columns)
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn n_metrics(&self) -> usize {
        self.metrics.len()
    }

    pub fn n_subjects(&self) -> usize {
        self.subjects.len()
    }

    pub fn column_at(&self, j: usize) -> &[Option<f64>] {
        &self.columns[j]
    }

    pub fn column(&self, metric: &str) -> Option<&[Option<f64>]> {
        self.metrics
            .iter()
            .position(|m| m == metric)
            .map(|j| self.columns[j].as_slice())
    }

    pub fn missing_cells(&self) -> usize {
        self.columns.iter().flatten().filter(|c| c.is_none()).count()
    }

    /// Restrict and reorder to `metrics`. Every name must be present.
    pub fn select(&self, metrics: &[String]) -> Result<Self> {
        let missing: Vec<&str> = metrics
            .iter()
            .filter(|m| !self.metrics.contains(m))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(WeightingError::config(format!(
                "metrics not found in input table: {}",
                missing.join(", ")
            )));
        }

        let columns = metrics
            .iter()
            .filter_map(|m| self.column(m).map(<[_]>::to_vec))
            .collect();
        Self::new(metrics.to_vec(), self.subjects.clone(), columns)
    }

    /// Read the configured `metrics` from a CSV table with a header row.
    ///
    /// Subjects are labelled by `/`-joining whichever `id_columns` exist,
    /// else by row number. Cells that are empty, `NA` or `NaN` are missing.
    pub fn from_csv_reader<R: Read>(reader: R, id_columns: &[String], metrics: &[String]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();

        let missing: Vec<&str> = metrics
            .iter()
            .filter(|m| !headers.contains(m))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(WeightingError::config(format!(
                "metrics not found in input table: {}",
                missing.join(", ")
            )));
        }

        let metric_idx: Vec<usize> = metrics
            .iter()
            .filter_map(|m| headers.iter().position(|h| h == m))
            .collect();
        let id_idx: Vec<usize> = id_columns
            .iter()
            .filter_map(|c| headers.iter().position(|h| h == c))
            .collect();
        if id_idx.is_empty() {
            debug!("No id columns found, labelling subjects by row number");
        }

        let mut subjects = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); metrics.len()];

        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let label = if id_idx.is_empty() {
                format!("row-{}", row + 1)
            } else {
                id_idx
                    .iter()
                    .map(|&i| record.get(i).unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join("/")
            };
            subjects.push(label);

            for (col, &i) in metric_idx.iter().enumerate() {
                let raw = record.get(i).unwrap_or("");
                let cell = parse_cell(raw).ok_or_else(|| WeightingError::InvalidValue {
                    column: metrics[col].clone(),
                    row: row + 1,
                    value: raw.to_string(),
                })?;
                columns[col].push(cell);
            }
        }

        let matrix = Self::new(metrics.to_vec(), subjects, columns)?;
        let missing_cells = matrix.missing_cells();
        if missing_cells > 0 {
            warn!(missing_cells, "Input table has missing metric values");
        }
        info!(
            metrics = matrix.n_metrics(),
            subjects = matrix.n_subjects(),
            "Loaded metric table"
        );
        Ok(matrix)
    }

    pub fn from_csv_path(path: impl AsRef<Path>, id_columns: &[String], metrics: &[String]) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading metric table from {:?}", path);
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, id_columns, metrics)
    }
}

/// `Some(None)` for a missing cell, `Some(Some(v))` for a value,
/// `None` when the text is not numeric at all.
fn parse_cell(raw: &str) -> Option<Option<f64>> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    s.parse::<f64>().ok().map(|v| v.is_finite().then_some(v))
}
