//! Sink implementations
//!
//! Contains FileSink and StreamSink.

mod file;
mod stream;

pub use self::file::FileSink;
pub use self::stream::StreamSink;
