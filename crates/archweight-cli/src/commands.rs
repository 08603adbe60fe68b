//! Subcommand handlers.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use archweight_common::WeightingConfig;
use archweight_ranker::assemble::assemble_dir;
use archweight_ranker::scorer::score_subjects;
use archweight_ranker::{run_pipeline, MetricMatrix, ResultTable};
use clap::Args;
use tracing::{debug, info};

use crate::output::{emit, render, OutputFormat};

// ── weights ───────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WeightsArgs {
    /// Metric table: CSV with a header row, one subject per row
    pub input: PathBuf,

    /// Configuration file (.toml, .yaml/.yml or .json)
    #[arg(short, long, env = "ARCHWEIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Blend weight toward the computed weights, in [0, 1]
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Cap every final weight at this value (turns capping on)
    #[arg(long)]
    pub cap: Option<f64>,

    /// Multiply in the dispersion weights
    #[arg(long)]
    pub variance_gate: bool,

    /// Comma-separated metric columns to weight, in order
    #[arg(long, value_delimiter = ',')]
    pub metrics: Option<Vec<String>>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Decimals shown in table and CSV output
    #[arg(long, default_value_t = 4)]
    pub precision: usize,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Also rank subjects by their composite score under the final weights
    #[arg(long)]
    pub scores: bool,
}

/// Fold command-line flags into the loaded configuration.
pub fn apply_overrides(config: &mut WeightingConfig, args: &WeightsArgs) {
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(cap) = args.cap {
        config.use_cap = true;
        config.cap_default = cap;
    }
    if args.variance_gate {
        config.use_variance_gate = true;
    }
    if let Some(metrics) = &args.metrics {
        config.metrics = metrics.iter().map(|m| m.trim().to_string()).collect();
        // Settings for metrics outside the selection no longer apply
        let selected = config.metrics.clone();
        config.orientation.retain(|k, _| selected.contains(k));
        config.user_scores.retain(|k, _| selected.contains(k));
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<WeightingConfig> {
    match path {
        Some(p) => WeightingConfig::load(p)
            .with_context(|| format!("loading configuration from {}", p.display())),
        None => {
            debug!("No configuration file given, using defaults");
            Ok(WeightingConfig::default())
        }
    }
}

pub fn run_weights(args: WeightsArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let matrix = MetricMatrix::from_csv_path(&args.input, &config.id_columns, &config.metrics)
        .with_context(|| format!("reading metric table {}", args.input.display()))?;
    let report = run_pipeline(&matrix, &config)?;

    let table = ResultTable::from_report(&report);
    let scores = args
        .scores
        .then(|| score_subjects(&report.oriented, &report.final_weights));

    let rendered = render(&table, scores.as_deref(), args.format, args.precision)?;
    emit(&rendered, args.out.as_deref())
}

// ── assemble ──────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AssembleArgs {
    /// Directory holding the per-metric CSV files
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Output table (default: <dir>/metrics_agg.csv)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run_assemble(args: AssembleArgs) -> Result<()> {
    let out = args.out.unwrap_or_else(|| args.dir.join("metrics_agg.csv"));
    let table = assemble_dir(&args.dir, &out)
        .with_context(|| format!("assembling metric files in {}", args.dir.display()))?;
    println!("Wrote {} with {} rows", out.display(), table.len());
    Ok(())
}

// ── init-config ───────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InitConfigArgs {
    #[arg(short, long, default_value = "archweight.toml")]
    pub out: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run_init_config(args: InitConfigArgs) -> Result<()> {
    if args.out.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", args.out.display());
    }
    let content = WeightingConfig::default().to_toml_string()?;
    std::fs::write(&args.out, content)
        .with_context(|| format!("writing {}", args.out.display()))?;
    info!(path = %args.out.display(), "Wrote default configuration");
    Ok(())
}
