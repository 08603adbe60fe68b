//! Result table: one row per metric with every stage's weight.
//! Rounding happens only when rendering.

use std::io::Write;

use archweight_common::Result;
use serde::Serialize;

use crate::pipeline::WeightingReport;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub metric: String,
    pub entropy: f64,
    pub dependency: f64,
    pub variance: f64,
    pub combined: f64,
    pub blended: f64,
    pub final_capped: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub rows: Vec<ResultRow>,
}

pub const COLUMNS: [&str; 7] = [
    "metric",
    "entropy",
    "dependency",
    "variance",
    "combined",
    "blended",
    "final_capped",
];

impl ResultTable {
    pub fn from_report(report: &WeightingReport) -> Self {
        let rows = report
            .final_weights
            .iter()
            .enumerate()
            .map(|(j, (metric, final_capped))| ResultRow {
                metric: metric.to_string(),
                entropy: report.entropy.values()[j],
                dependency: report.dependency.values()[j],
                variance: report.variance.values()[j],
                combined: report.combined.values()[j],
                blended: report.blended.values()[j],
                final_capped,
            })
            .collect();
        Self { rows }
    }

    fn formatted(&self, precision: usize) -> Vec<[String; 7]> {
        let fmt = |v: f64| format!("{v:.precision$}");
        self.rows
            .iter()
            .map(|r| {
                [
                    r.metric.clone(),
                    fmt(r.entropy),
                    fmt(r.dependency),
                    fmt(r.variance),
                    fmt(r.combined),
                    fmt(r.blended),
                    fmt(r.final_capped),
                ]
            })
            .collect()
    }

    /// Fixed-width text table.
    pub fn render_text(&self, precision: usize) -> String {
        let cells = self.formatted(precision);
        let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.len()).collect();
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        let mut out = render_line(COLUMNS.iter().copied(), &widths);
        out.push('\n');
        for row in &cells {
            out.push_str(&render_line(row.iter().map(String::as_str), &widths));
            out.push('\n');
        }
        out
    }

    pub fn write_csv<W: Write>(&self, writer: W, precision: usize) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(COLUMNS)?;
        for row in self.formatted(precision) {
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// JSON keeps full precision.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn render_line<'a>(cols: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cols.zip(widths)
        .enumerate()
        .map(|(i, (c, &w))| {
            if i == 0 {
                format!("{c:<w$}")
            } else {
                format!("{c:>w$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}
