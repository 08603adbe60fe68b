//! archweight: derive composite-metric weights from a metric table.
//!
//! # Commands
//!
//! - `weights`: run the weighting pipeline over a metric CSV and print the result table
//! - `assemble`: merge per-metric CSV files into one metric table
//! - `init-config`: write the default configuration as TOML
//!
//! Exit codes: 0 on success, 2 on a configuration or cap error (nothing was
//! computed), 1 on anything else.

use archweight_common::WeightingError;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod output;

/// Metric weighting for architecture quality composites
#[derive(Parser)]
#[command(name = "archweight")]
#[command(version)]
#[command(about = "Derive composite-metric weights from a metric table")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive metric weights from a metric table
    Weights(commands::WeightsArgs),
    /// Merge per-metric CSV files into one metric table
    Assemble(commands::AssembleArgs),
    /// Write the default configuration file
    InitConfig(commands::InitConfigArgs),
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("archweight=info,warn")),
        1 => EnvFilter::new("archweight=debug,info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Map a failed command to its process exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<WeightingError>() {
        Some(e) if e.is_fatal_config() => 2,
        _ => 1,
    }
}

fn main() {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Weights(args) => commands::run_weights(args),
        Commands::Assemble(args) => commands::run_assemble(args),
        Commands::InitConfig(args) => commands::run_init_config(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(exit_code_for(&e));
    }
}
