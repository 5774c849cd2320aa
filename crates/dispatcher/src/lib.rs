//! # Dispatcher
//!
//! Concurrent fan-out of one input stream to many destinations.
//!
//! Responsible for:
//! - Reading fixed-size chunks from the input (`ChunkReader`)
//! - Fan-out to one delivery channel per destination (`SinkHandle`)
//! - Isolating slow or failing destinations from each other
//! - Cancellation on interrupt, or suppressing it (`cancel`)
//! - Collecting error reports into a `RunReport` (`Coordinator`)

pub mod cancel;
pub mod coordinator;
pub mod handle;
pub mod metrics;
pub mod reader;
pub mod sinks;
pub mod stats;

pub use cancel::{CancellationSignal, CtrlC, InterruptListener, InterruptMode, InterruptSource};
pub use contracts::{ByteSink, Chunk, DestinationId, OpenMode, TeeError};
pub use coordinator::{Coordinator, CoordinatorConfig, Phase, RunReport};
pub use handle::{Outlet, SinkHandle, DEFAULT_QUEUE_CAPACITY};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use reader::{ChunkReader, ReaderOutcome};
pub use sinks::{FileSink, StreamSink};
pub use stats::RunStats;
