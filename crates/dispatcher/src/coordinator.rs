//! Coordinator - wires reader, delivery channels and writers for one run

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use contracts::{DestinationId, DestinationSet, OpenMode, ReportOrigin, TeeError, CHUNK_CAPACITY};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, instrument, warn};

use crate::cancel::CancellationSignal;
use crate::handle::{SinkHandle, DEFAULT_QUEUE_CAPACITY};
use crate::reader::{ChunkReader, ReaderOutcome};
use crate::sinks::{FileSink, StreamSink};
use crate::stats::RunStats;

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// File operands, in command line order (duplicates allowed)
    pub files: Vec<PathBuf>,
    /// How files are opened
    pub open_mode: OpenMode,
    /// Maximum chunk size
    pub chunk_capacity: usize,
    /// Chunks each delivery channel holds before the reader waits
    pub queue_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            open_mode: OpenMode::default(),
            chunk_capacity: CHUNK_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Lifecycle of one run. Phases advance one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Resolving and opening destinations
    Setup,
    /// Reader and writers spawned
    Running,
    /// Waiting for the reader, then every writer
    Draining,
    /// Report assembled
    Done,
}

impl Phase {
    fn advance(&mut self) {
        let next = match self {
            Self::Setup => Self::Running,
            Self::Running => Self::Draining,
            Self::Draining | Self::Done => Self::Done,
        };
        debug!(from = ?*self, to = ?next, "Coordinator phase");
        *self = next;
    }
}

/// Outcome of one run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Every error of the run: open failures, input failure, then write failures
    pub errors: Vec<TeeError>,
    /// Whether cancellation ended the run early
    pub cancelled: bool,
    /// Run statistics
    pub stats: RunStats,
}

impl RunReport {
    /// True if no error was reported
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Print one `<program>: <cause>` line per error
    pub fn write_diagnostics<W: Write>(&self, program: &str, out: &mut W) -> io::Result<()> {
        for e in &self.errors {
            writeln!(out, "{program}: {e}")?;
        }
        out.flush()
    }
}

/// A destination opened during setup, waiting for its writer
enum Opened<W> {
    File(FileSink),
    Stream(StreamSink<W>),
}

/// Runs the fan-out pipeline once
pub struct Coordinator {
    config: CoordinatorConfig,
}

impl Coordinator {
    /// Create a new Coordinator
    pub fn new(config: CoordinatorConfig) -> Self {
        Self { config }
    }

    /// Copy `input` to `stdout` and every configured file.
    ///
    /// Returns once the reader and every writer have finished, including
    /// after cancellation.
    #[instrument(
        name = "coordinator_run",
        skip_all,
        fields(files = self.config.files.len(), open_mode = ?self.config.open_mode)
    )]
    pub async fn run<R, W>(self, input: R, stdout: W, signal: CancellationSignal) -> RunReport
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let started = Instant::now();
        let mut phase = Phase::Setup;
        let mut errors = Vec::new();

        let opened = self.open_destinations(stdout, &mut errors).await;

        phase.advance();
        let mut handles: Vec<SinkHandle> = opened
            .into_iter()
            .map(|sink| match sink {
                Opened::File(sink) => {
                    SinkHandle::spawn(sink, self.config.queue_capacity, signal.clone())
                }
                Opened::Stream(sink) => {
                    SinkHandle::spawn(sink, self.config.queue_capacity, signal.clone())
                }
            })
            .collect();
        let outlets = handles.iter_mut().filter_map(SinkHandle::take_outlet).collect();
        let reader = ChunkReader::new(input, outlets, signal.clone(), self.config.chunk_capacity);
        let reader_task = tokio::spawn(reader.run());
        info!(destinations = handles.len(), "Pipeline running");

        phase.advance();
        let mut outcome = match reader_task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = ?e, "Reader task panicked");
                ReaderOutcome {
                    error: Some(TeeError::task_failed(ReportOrigin::Input, e.to_string())),
                    ..Default::default()
                }
            }
        };
        errors.extend(outcome.error.take());

        let mut destinations = Vec::with_capacity(handles.len());
        for handle in handles {
            let destination = handle.destination().clone();
            let metrics = Arc::clone(handle.metrics());
            if let Some(e) = handle.join().await {
                errors.push(e);
            }
            destinations.push((destination, metrics.snapshot()));
        }

        phase.advance();
        let stats = RunStats {
            chunks_read: outcome.chunks,
            bytes_read: outcome.bytes,
            duration: started.elapsed(),
            destinations,
        };
        stats.log_summary();
        info!(
            errors = errors.len(),
            cancelled = outcome.cancelled,
            "Run complete"
        );

        RunReport {
            errors,
            cancelled: outcome.cancelled,
            stats,
        }
    }

    /// Resolve and open every destination; failures are reported and skipped.
    #[instrument(name = "coordinator_open_destinations", skip_all)]
    async fn open_destinations<W>(&self, stdout: W, errors: &mut Vec<TeeError>) -> Vec<Opened<W>> {
        let destinations = DestinationSet::resolve(self.config.files.iter().cloned());
        let mut stdout = Some(stdout);
        let mut opened = Vec::with_capacity(destinations.len());

        for destination in destinations {
            match destination {
                DestinationId::Stdout => {
                    if let Some(writer) = stdout.take() {
                        opened.push(Opened::Stream(StreamSink::stdout(writer)));
                    }
                }
                DestinationId::File(path) => {
                    match FileSink::open(&path, self.config.open_mode).await {
                        Ok(sink) => opened.push(Opened::File(sink)),
                        Err(e) => {
                            warn!(error = %e, "Destination excluded");
                            errors.push(e);
                        }
                    }
                }
            }
        }

        debug!(opened = opened.len(), failed = errors.len(), "Destinations resolved");
        opened
    }
}
