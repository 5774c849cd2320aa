//! SinkHandle - one destination writer with its own delivery channel and worker task

use std::sync::Arc;

use contracts::{ByteSink, Chunk, DestinationId, ReportOrigin, TeeError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::cancel::CancellationSignal;
use crate::metrics::SinkMetrics;

/// Default number of chunks a delivery channel holds before the reader waits
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Reader-side end of one delivery channel
#[derive(Debug)]
pub struct Outlet {
    destination: DestinationId,
    tx: mpsc::Sender<Chunk>,
}

impl Outlet {
    /// Destination fed by this outlet
    pub fn destination(&self) -> &DestinationId {
        &self.destination
    }

    /// Offer a chunk, waiting while the queue is full.
    ///
    /// Fails only when the writer has detached.
    pub async fn send(&self, chunk: Chunk) -> Result<(), Chunk> {
        self.tx.send(chunk).await.map_err(|e| e.0)
    }
}

/// Handle to a running destination writer
pub struct SinkHandle {
    /// Destination written by the worker
    destination: DestinationId,
    /// Sending side, until taken by the reader
    outlet: Option<Outlet>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<Option<TeeError>>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: ByteSink + 'static>(
        sink: S,
        queue_capacity: usize,
        signal: CancellationSignal,
    ) -> Self {
        let destination = sink.destination().clone();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_handle =
            tokio::spawn(async move { sink_worker(sink, rx, signal, worker_metrics).await });

        Self {
            outlet: Some(Outlet {
                destination: destination.clone(),
                tx,
            }),
            destination,
            metrics,
            worker_handle,
        }
    }

    /// Get destination
    pub fn destination(&self) -> &DestinationId {
        &self.destination
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Take the sending side of the delivery channel
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_outlet(&mut self) -> Option<Outlet> {
        self.outlet.take()
    }

    /// Wait for the worker to finish and collect its error report, if any.
    ///
    /// Drops an untaken outlet first so the worker sees end-of-stream.
    #[instrument(name = "sink_handle_join", skip(self), fields(destination = %self.destination))]
    pub async fn join(mut self) -> Option<TeeError> {
        drop(self.outlet.take());
        match self.worker_handle.await {
            Ok(report) => {
                debug!("SinkHandle join complete");
                report
            }
            Err(e) => {
                error!(error = ?e, "Worker task panicked");
                Some(TeeError::task_failed(
                    ReportOrigin::Destination(self.destination),
                    e.to_string(),
                ))
            }
        }
    }
}

/// Worker task that consumes chunks and writes them to the sink.
///
/// On the first write failure the worker detaches: it drops its receiver,
/// discarding anything still queued, so the reader stops offering to it.
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, signal, metrics),
    fields(destination = %sink.destination())
)]
async fn sink_worker<S: ByteSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Chunk>,
    signal: CancellationSignal,
    metrics: Arc<SinkMetrics>,
) -> Option<TeeError> {
    debug!("Sink worker started");

    let mut report = None;
    loop {
        let next = tokio::select! {
            biased;
            _ = signal.raised() => None,
            chunk = rx.recv() => chunk,
        };

        let Some(chunk) = next else {
            break;
        };

        if let Err(e) = sink.write(&chunk).await {
            report = Some(e);
            break;
        }
        metrics.record_write(chunk.len());
    }

    if report.is_none() && signal.is_raised() {
        // Cancelled: keep what was already handed over, wait for nothing more.
        while let Ok(chunk) = rx.try_recv() {
            if let Err(e) = sink.write(&chunk).await {
                report = Some(e);
                break;
            }
            metrics.record_write(chunk.len());
        }
    }

    if let Some(ref e) = report {
        metrics.inc_failure_count();
        rx.close();
        let mut discarded = 0;
        while rx.try_recv().is_ok() {
            discarded += 1;
        }
        metrics.add_discarded(discarded);
        warn!(error = %e, discarded, "Write failed, destination detached");
    }
    drop(rx);

    if let Err(e) = sink.close().await {
        error!(error = %e, "Close failed on shutdown");
        report.get_or_insert(e);
    }

    debug!(
        chunks = metrics.chunk_count(),
        bytes = metrics.bytes_written(),
        "Sink worker stopped"
    );
    report
}
