//! ByteSink trait - destination writer output interface
//!
//! Defines the abstract interface for destinations.

use crate::{Chunk, DestinationId, TeeError};

/// Byte output trait
///
/// All destination implementations must implement this trait.
#[trait_variant::make(ByteSink: Send)]
pub trait LocalByteSink {
    /// Destination this sink writes to (used for reports/logging)
    fn destination(&self) -> &DestinationId;

    /// Write the whole chunk
    ///
    /// # Errors
    /// Returns `TeeError::DestinationWrite` tagged with this destination
    async fn write(&mut self, chunk: &Chunk) -> Result<(), TeeError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), TeeError>;

    /// Flush, persist where it matters, and release the handle
    async fn close(&mut self) -> Result<(), TeeError>;
}
