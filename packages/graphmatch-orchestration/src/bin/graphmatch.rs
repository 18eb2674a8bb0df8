//! Graphmatch CLI
//!
//! Matches one pattern graph against every target graph of a sharded corpus.
//!
//! # Usage
//!
//! ```bash
//! graphmatch <TARGET_INPUT> <RESULT_OUTPUT> <PATTERN_FILE>
//! graphmatch corpus/ results/ pattern.txt --config job.yaml --workers 8
//! ```
//!
//! Exit code 0 when every document was processed, 1 otherwise. Wrong arity
//! prints usage and exits without running the batch.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use graphmatch_orchestration::{BatchReport, JobConfig, PipelineDriver};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graphmatch")]
#[command(about = "Inexact subgraph matching over a sharded graph corpus", long_about = None)]
struct Cli {
    /// Target input: a shard file or a directory of shards
    target_input: PathBuf,

    /// Result output directory (must not exist)
    result_output: PathBuf,

    /// Local pattern file describing exactly one graph
    pattern_file: PathBuf,

    /// Job configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads (overrides config)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Output partitions (overrides config)
    #[arg(short, long)]
    partitions: Option<usize>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<BatchReport> {
    let mut config = match &cli.config {
        Some(path) => JobConfig::from_yaml(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => JobConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(partitions) = cli.partitions {
        config.partitions = partitions;
    }
    config.validate().context("invalid configuration")?;

    let report = PipelineDriver::new(config)
        .run(&cli.target_input, &cli.result_output, &cli.pattern_file)
        .context("batch aborted")?;
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
