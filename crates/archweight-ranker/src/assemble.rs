//! Metric table assembly.
//!
//! Merges per-metric CSV files (one metric per file, subjects identified by a
//! `file` column of the form `<project>_<candidate>.json`) into the single
//! `Project,Candidate,CiD,CMod,SCF,SMAD,DCCMD` table the pipeline reads.
//! Values are formatted to two decimals; anything absent is `NA`.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use archweight_common::Result;
use regex::Regex;
use tracing::{debug, info};

/// Output metric columns, in order.
pub const METRIC_COLUMNS: [&str; 5] = ["CiD", "CMod", "SCF", "SMAD", "DCCMD"];

const MISSING: &str = "NA";

/// Header aliases accepted for each metric, checked in order.
const METRIC_ALIASES: [(&str, &[&str]); 5] = [
    ("CiD", &["CiD"]),
    ("CMod", &["CMod", "overall_modularity", "overall_mod"]),
    ("SCF", &["SCF"]),
    ("SMAD", &["SMAD"]),
    ("DCCMD", &["DCCMD"]),
];

/// Wide variants: (metric, header pattern, preferred header).
const WIDE_VARIANTS: [(&str, &str, &str); 2] = [
    ("SMAD", r"^SMAD_c[\d.]+$", "SMAD_c7"),
    ("DCCMD", r"^DCCMD_c[\d.]+$", "DCCMD_c2.0"),
];

/// Find which metric a per-metric CSV carries, and the column holding it.
pub fn pick_metric_column(headers: &[String]) -> Result<Option<(&'static str, String)>> {
    for (metric, candidates) in METRIC_ALIASES {
        if let Some(c) = candidates.iter().find(|c| headers.iter().any(|h| h == *c)) {
            return Ok(Some((metric, c.to_string())));
        }
    }
    for (metric, pattern, preferred) in WIDE_VARIANTS {
        let re = Regex::new(pattern).map_err(anyhow::Error::from)?;
        if let Some(h) = headers.iter().find(|h| re.is_match(h)) {
            let col = if headers.iter().any(|x| x == preferred) {
                preferred.to_string()
            } else {
                h.clone()
            };
            return Ok(Some((metric, col)));
        }
    }
    Ok(None)
}

/// `"shop_v2_split.json"` → `("shop", "v2_split")`.
pub fn parse_subject_name(file: &str) -> Option<(String, String)> {
    let base = Path::new(file).file_name()?.to_str()?;
    let stem = match base.strip_suffix(".json") {
        Some(s) => s,
        None => Path::new(base).file_stem()?.to_str()?,
    };
    let (project, candidate) = stem.split_once('_')?;
    if project.is_empty() || candidate.is_empty() {
        return None;
    }
    Some((project.to_string(), candidate.to_string()))
}

/// Two-decimal formatting; empty and `NA` stay `NA`, text passes through.
pub fn format_two_decimals(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return MISSING.to_string();
    };
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case(MISSING) {
        return MISSING.to_string();
    }
    match s.parse::<f64>() {
        Ok(v) => format!("{v:.2}"),
        Err(_) => s.to_string(),
    }
}

/// Merged table keyed by `(project, candidate)`, sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledTable {
    rows: BTreeMap<(String, String), [String; 5]>,
}

impl AssembledTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, project: &str, candidate: &str, metric: &str) -> Option<&str> {
        let j = METRIC_COLUMNS.iter().position(|m| *m == metric)?;
        self.rows
            .get(&(project.to_string(), candidate.to_string()))
            .map(|r| r[j].as_str())
    }

    /// Merge one per-metric CSV. Returns the metric it contributed, or `None`
    /// when the file has no `file` column or no recognisable metric.
    pub fn ingest_csv<R: Read>(&mut self, reader: R) -> Result<Option<&'static str>> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let Some(file_idx) = headers.iter().position(|h| h == "file") else {
            return Ok(None);
        };
        let Some((metric, column)) = pick_metric_column(&headers)? else {
            return Ok(None);
        };
        let value_idx = headers.iter().position(|h| *h == column);
        let slot = METRIC_COLUMNS.iter().position(|m| *m == metric).unwrap_or_default();

        for result in reader.records() {
            let record = result?;
            let file = record.get(file_idx).unwrap_or("").trim();
            if file.is_empty() {
                continue;
            }
            let Some(key) = parse_subject_name(file) else {
                continue;
            };
            let value = format_two_decimals(value_idx.and_then(|i| record.get(i)));
            let row = self
                .rows
                .entry(key)
                .or_insert_with(|| std::array::from_fn(|_| MISSING.to_string()));
            row[slot] = value;
        }
        Ok(Some(metric))
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["Project", "Candidate"];
        header.extend(METRIC_COLUMNS);
        wtr.write_record(&header)?;
        for ((project, candidate), values) in &self.rows {
            let mut record = vec![project.as_str(), candidate.as_str()];
            record.extend(values.iter().map(String::as_str));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Merge every `*.csv` in `dir` (except `out` itself) and write the result to `out`.
pub fn assemble_dir(dir: &Path, out: &Path) -> Result<AssembledTable> {
    let out_resolved = out.canonicalize().unwrap_or_else(|_| out.to_path_buf());

    let mut inputs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "csv"))
        .collect();
    inputs.sort();

    let mut table = AssembledTable::new();
    let mut used = 0usize;
    for path in &inputs {
        if path.canonicalize().is_ok_and(|p| p == out_resolved) {
            continue;
        }
        let file = std::fs::File::open(path)?;
        match table.ingest_csv(file)? {
            Some(metric) => {
                debug!(?path, metric, "Merged metric file");
                used += 1;
            }
            None => debug!(?path, "Skipping file without a recognisable metric"),
        }
    }

    let file = std::fs::File::create(out)?;
    table.write_csv(file)?;
    info!(files = used, subjects = table.len(), out = ?out, "Wrote assembled metric table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pick_metric_aliases() {
        assert_eq!(
            pick_metric_column(&headers(&["file", "overall_mod"])).unwrap(),
            Some(("CMod", "overall_mod".to_string()))
        );
        assert_eq!(
            pick_metric_column(&headers(&["file", "SMAD_c5", "SMAD_c7"])).unwrap(),
            Some(("SMAD", "SMAD_c7".to_string()))
        );
        assert_eq!(
            pick_metric_column(&headers(&["file", "DCCMD_c1.5"])).unwrap(),
            Some(("DCCMD", "DCCMD_c1.5".to_string()))
        );
        assert_eq!(pick_metric_column(&headers(&["file", "other"])).unwrap(), None);
    }

    #[test]
    fn test_parse_subject_name() {
        assert_eq!(
            parse_subject_name("out/shop_v2_split.json"),
            Some(("shop".to_string(), "v2_split".to_string()))
        );
        assert_eq!(
            parse_subject_name("bank_a.txt"),
            Some(("bank".to_string(), "a".to_string()))
        );
        assert_eq!(parse_subject_name("nounderscore.json"), None);
    }

    #[test]
    fn test_format_two_decimals() {
        assert_eq!(format_two_decimals(Some("0.456")), "0.46");
        assert_eq!(format_two_decimals(Some(" na ")), "NA");
        assert_eq!(format_two_decimals(Some("")), "NA");
        assert_eq!(format_two_decimals(None), "NA");
        assert_eq!(format_two_decimals(Some("n/a-ish")), "n/a-ish");
    }

    #[test]
    fn test_ingest_merges_metrics() {
        let mut table = AssembledTable::new();
        let cid = "file,CiD\nshop_a.json,0.5\nshop_b.json,0.25\n";
        let scf = "file,SCF\nshop_a.json,3\n";
        assert_eq!(table.ingest_csv(cid.as_bytes()).unwrap(), Some("CiD"));
        assert_eq!(table.ingest_csv(scf.as_bytes()).unwrap(), Some("SCF"));
        assert_eq!(table.ingest_csv("name,CiD\nx,1\n".as_bytes()).unwrap(), None);

        assert_eq!(table.len(), 2);
        assert_eq!(table.value("shop", "a", "SCF"), Some("3.00"));
        assert_eq!(table.value("shop", "b", "SCF"), Some("NA"));
        assert_eq!(table.value("shop", "b", "CiD"), Some("0.25"));
    }

    #[test]
    fn test_assemble_dir_writes_sorted_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cid.csv"), "file,CiD\nzeta_a.json,1\nalpha_b.json,2\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let out = dir.path().join("metrics_agg.csv");

        let table = assemble_dir(dir.path(), &out).unwrap();
        assert_eq!(table.len(), 2);

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Project,Candidate,CiD,CMod,SCF,SMAD,DCCMD");
        assert_eq!(lines[1], "alpha,b,2.00,NA,NA,NA,NA");
        assert_eq!(lines[2], "zeta,a,1.00,NA,NA,NA,NA");

        // Re-running skips the previous output file
        let again = assemble_dir(dir.path(), &out).unwrap();
        assert_eq!(again, table);
    }
}
