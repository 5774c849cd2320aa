//! Pipeline orchestrator - connects the process streams, the interrupt and the coordinator.

use std::io::Write;

use anyhow::{Context, Result};
use dispatcher::{
    CancellationSignal, Coordinator, CoordinatorConfig, CtrlC, InterruptListener, InterruptMode,
    RunReport,
};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::PROGRAM;

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Destinations and open mode
    pub coordinator: CoordinatorConfig,

    /// What SIGINT does to the run
    pub interrupt_mode: InterruptMode,
}

impl From<&Cli> for PipelineConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            coordinator: CoordinatorConfig {
                files: cli.files.clone(),
                open_mode: contracts::OpenMode::from_append(cli.append),
                ..Default::default()
            },
            interrupt_mode: InterruptMode::from_ignore(cli.ignore),
        }
    }
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Copy standard input to standard output and the configured files.
    ///
    /// Diagnostics for every error report are printed to stderr before returning.
    pub async fn run(self) -> Result<RunReport> {
        let signal = CancellationSignal::new();
        let source = CtrlC::install().context("Failed to install SIGINT handler")?;
        let mut listener = InterruptListener::spawn(
            signal.clone(),
            self.config.interrupt_mode,
            source,
            std::io::stderr(),
            PROGRAM,
        );

        info!(
            files = self.config.coordinator.files.len(),
            open_mode = ?self.config.coordinator.open_mode,
            interrupt_mode = ?self.config.interrupt_mode,
            "Starting pipeline"
        );

        let report = Coordinator::new(self.config.coordinator)
            .run(tokio::io::stdin(), tokio::io::stdout(), signal)
            .await;

        listener.stop();

        if report.cancelled {
            warn!(
                bytes = report.stats.bytes_read,
                "Interrupted, output truncated"
            );
        }
        if listener.suppressed() > 0 {
            info!(count = listener.suppressed(), "Interrupts suppressed");
        }

        let mut stderr = std::io::stderr().lock();
        report
            .write_diagnostics(PROGRAM, &mut stderr)
            .and_then(|()| stderr.flush())
            .context("Failed to print diagnostics")?;

        Ok(report)
    }
}
