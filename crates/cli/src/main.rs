//! # gtee
//!
//! Command-line entry point.
//!
//! Provides:
//! - Argument parsing and logging setup
//! - Pipeline orchestration
//! - Exit status from the run's error reports

mod cli;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::Cli;
use observability::ObservabilityConfig;
use pipeline::{Pipeline, PipelineConfig};

/// Program name, used as the prefix of every diagnostic line
pub const PROGRAM: &str = "gtee";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(&cli).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("{PROGRAM}: {e:#}");
            1
        }
    };

    // A pending read on stdin runs on a blocking thread that cannot be
    // interrupted; exit here instead of waiting for the runtime to drop it.
    std::process::exit(code);
}

/// Run the pipeline; Ok(true) if no error report was produced
async fn run(cli: &Cli) -> Result<bool> {
    observability::init_with_config(ObservabilityConfig::from_verbosity(
        cli.verbose,
        cli.log_format.into(),
    ))?;

    info!(version = env!("CARGO_PKG_VERSION"), "gtee starting");

    let report = Pipeline::new(PipelineConfig::from(cli)).run().await?;
    Ok(report.is_success())
}
