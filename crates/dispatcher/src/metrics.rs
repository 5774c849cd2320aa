//! Destination metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single destination writer
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Chunks fully written
    chunk_count: AtomicU64,
    /// Bytes fully written
    bytes_written: AtomicU64,
    /// Write failures (at most one, the writer detaches after it)
    failure_count: AtomicU64,
    /// Chunks left in the queue when the writer detached
    discarded_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one chunk written
    pub fn record_write(&self, len: usize) {
        self.chunk_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Get chunk count
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count.load(Ordering::Relaxed)
    }

    /// Get bytes written
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get discarded chunk count
    pub fn discarded_count(&self) -> u64 {
        self.discarded_count.load(Ordering::Relaxed)
    }

    /// Add chunks discarded on detach
    pub fn add_discarded(&self, count: usize) {
        self.discarded_count
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunk_count: self.chunk_count(),
            bytes_written: self.bytes_written(),
            failure_count: self.failure_count(),
            discarded_count: self.discarded_count(),
        }
    }
}

/// Snapshot of destination metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub chunk_count: u64,
    pub bytes_written: u64,
    pub failure_count: u64,
    pub discarded_count: u64,
}
