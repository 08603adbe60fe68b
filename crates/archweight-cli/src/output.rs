//! Rendering of the result table (and optional subject ranking).

use std::path::Path;

use anyhow::{Context, Result};
use archweight_ranker::scorer::SubjectScore;
use archweight_ranker::{ResultRow, ResultTable};
use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text columns
    Table,
    Csv,
    /// Full precision, ignores --precision
    Json,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    weights: &'a [ResultRow],
    #[serde(skip_serializing_if = "Option::is_none")]
    scores: Option<&'a [SubjectScore]>,
}

const SCORE_COLUMNS: [&str; 4] = ["subject", "composite_score", "rank", "coverage"];

fn score_cells(scores: &[SubjectScore], precision: usize) -> Vec<[String; 4]> {
    scores
        .iter()
        .map(|s| {
            [
                s.subject.clone(),
                format!("{:.precision$}", s.composite_score),
                format!("{}", s.rank),
                format!("{:.precision$}", s.coverage),
            ]
        })
        .collect()
}

fn scores_text(scores: &[SubjectScore], precision: usize) -> String {
    let cells = score_cells(scores, precision);
    let mut widths: Vec<usize> = SCORE_COLUMNS.iter().map(|c| c.len()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let line = |cols: Vec<&str>| {
        cols.iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (c, &w))| if i == 0 { format!("{c:<w$}") } else { format!("{c:>w$}") })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = line(SCORE_COLUMNS.to_vec());
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

pub fn render(
    table: &ResultTable,
    scores: Option<&[SubjectScore]>,
    format: OutputFormat,
    precision: usize,
) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut out = table.render_text(precision);
            if let Some(scores) = scores {
                out.push('\n');
                out.push_str(&scores_text(scores, precision));
            }
            Ok(out)
        }
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            table.write_csv(&mut buf, precision)?;
            if let Some(scores) = scores {
                buf.push(b'\n');
                let mut wtr = csv::Writer::from_writer(&mut buf);
                wtr.write_record(SCORE_COLUMNS)?;
                for row in score_cells(scores, precision) {
                    wtr.write_record(&row)?;
                }
                wtr.flush()?;
            }
            String::from_utf8(buf).context("CSV output is not UTF-8")
        }
        OutputFormat::Json => {
            let doc = JsonOutput { weights: &table.rows, scores };
            Ok(serde_json::to_string_pretty(&doc)?)
        }
    }
}

/// Write to `out`, or print to stdout.
pub fn emit(rendered: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing results to {}", path.display()))?;
            info!(path = %path.display(), "Wrote results");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
