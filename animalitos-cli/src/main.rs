//! Animalitos CLI — run, latest, and history commands.
//!
//! Commands:
//! - `run` — fetch, normalize, and persist one explicit date range
//! - `latest` — fetch the trailing N days ending today
//! - `history` — chunked backfill of a long window, tolerating gaps
//!
//! Configuration comes from an optional TOML file; absent file or absent
//! keys fall back to documented defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use animalitos_core::{Pipeline, PipelineConfig, RunReport};

#[derive(Parser)]
#[command(
    name = "animalitos",
    about = "Animalitos — historical Lotto Activo draw acquisition pipeline"
)]
struct Cli {
    /// Path to a TOML config file. Missing file means defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for batch artifacts (overrides config).
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and persist draws for an explicit date range.
    Run {
        /// Start date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: String,
    },
    /// Fetch and persist the trailing N days ending today.
    Latest {
        /// Days to look back.
        #[arg(long, default_value_t = 7)]
        days: u64,
    },
    /// Backfill a long window in weekly chunks, tolerating failed chunks.
    History {
        /// Days to look back.
        #[arg(long, default_value_t = 365)]
        days: u64,

        /// Width of each fetch window, in days.
        #[arg(long, default_value_t = 7)]
        chunk_days: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.output_dir)?;
    let mut pipeline = Pipeline::new(config).context("failed to build pipeline")?;

    let report = match cli.command {
        Commands::Run { start, end } => {
            let start = parse_date(&start)?;
            let end = parse_date(&end)?;
            pipeline.run(start, end)?
        }
        Commands::Latest { days } => pipeline.get_latest_data(days)?,
        Commands::History { days, chunk_days } => pipeline.run_history(days, chunk_days)?,
    };
    pipeline.close();

    print_summary(&report);
    Ok(())
}

/// Load config from a TOML file if given; absent config means defaults.
fn load_config(path: Option<&std::path::Path>, output_dir: Option<PathBuf>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(p) if p.exists() => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing config {}", p.display()))?
        }
        Some(p) => {
            info!(path = %p.display(), "config file not found, using defaults");
            PipelineConfig::default()
        }
        None => PipelineConfig::default(),
    };
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    Ok(config)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn print_summary(report: &RunReport) {
    let m = &report.metrics;
    println!("Run complete in {:.2}s", m.duration_seconds);
    println!(
        "  rows: {} seen, {} valid, {} rejected, {} flagged, {} duplicates",
        m.rows_seen, m.rows_valid, m.rows_rejected, m.rows_flagged, m.rows_deduplicated
    );
    println!("  success rate: {:.1}%", m.success_rate * 100.0);
    match &report.artifact.path {
        Some(path) => println!(
            "  persisted {} records ({} bytes) to {}",
            report.artifact.record_count,
            report.artifact.bytes_written,
            path.display()
        ),
        None => println!("  nothing to persist"),
    }
}
