//! Run statistics.

use std::time::Duration;

use contracts::DestinationId;
use tracing::debug;

use crate::metrics::MetricsSnapshot;

/// Statistics from one coordinator run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Chunks read from input and offered
    pub chunks_read: u64,

    /// Bytes read from input and offered
    pub bytes_read: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Per-destination writer metrics, in destination order
    pub destinations: Vec<(DestinationId, MetricsSnapshot)>,
}

impl RunStats {
    /// Input throughput in MiB/s
    pub fn throughput_mib_s(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.bytes_read as f64 / (1024.0 * 1024.0) / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Destinations that received every byte that was read
    pub fn complete_destinations(&self) -> usize {
        self.destinations
            .iter()
            .filter(|(_, m)| m.failure_count == 0 && m.bytes_written == self.bytes_read)
            .count()
    }

    /// Emit the summary through tracing
    pub fn log_summary(&self) {
        debug!(
            chunks = self.chunks_read,
            bytes = self.bytes_read,
            duration_secs = self.duration.as_secs_f64(),
            mib_per_sec = format!("{:.2}", self.throughput_mib_s()),
            complete = self.complete_destinations(),
            destinations = self.destinations.len(),
            "Run statistics"
        );

        for (destination, metrics) in &self.destinations {
            debug!(
                destination = %destination,
                chunks = metrics.chunk_count,
                bytes = metrics.bytes_written,
                failures = metrics.failure_count,
                discarded = metrics.discarded_count,
                "Destination statistics"
            );
        }
    }
}
