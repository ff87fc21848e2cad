//! `srdedupe` CLI: loads configuration, drives the six-stage deduplication
//! pipeline, and exits with a status code reflecting the outcome.
//!
//! Thin by design — all substantive orchestration lives in the library
//! crate so it stays unit-testable without a process boundary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use srdedupe::{run_pipeline, SrdedupeConfig};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Deterministic, auditable deduplication engine for bibliographic
/// reference records.
#[derive(Parser)]
#[command(name = "srdedupe")]
#[command(about = "Deduplicate bibliographic reference exports (RIS, PubMed, BibTeX, WoS, EndNote)")]
struct Cli {
    /// Input file or folder of bibliographic export files.
    input: PathBuf,

    /// Path to a YAML pipeline configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `output_dir` from the config file.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match SrdedupeConfig::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("configuration error: {err}");
                return ExitCode::from(2);
            }
        },
        None => SrdedupeConfig::default(),
    };

    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let command_argv: Vec<String> = std::env::args().collect();

    match run_pipeline(&cli.input, &config, command_argv) {
        Ok(result) => {
            println!(
                "records={} candidates={} auto_dup={} unique={} dedup_rate={:.4}",
                result.total_records,
                result.total_candidates,
                result.total_duplicates_auto,
                result.total_unique_records,
                result.dedup_rate
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("pipeline failed: {err}");
            ExitCode::from(1)
        }
    }
}
