//! StreamSink - writes chunks to an already-open stream such as standard output

use contracts::{ByteSink, Chunk, DestinationId, TeeError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};

/// Sink over any async writer; the process standard output in production
pub struct StreamSink<W> {
    destination: DestinationId,
    writer: W,
}

impl<W> StreamSink<W> {
    /// Wrap `writer`, reporting failures against `destination`
    pub fn new(destination: DestinationId, writer: W) -> Self {
        Self {
            destination,
            writer,
        }
    }

    /// Sink for the process standard output
    pub fn stdout(writer: W) -> Self {
        Self::new(DestinationId::Stdout, writer)
    }
}

impl<W> ByteSink for StreamSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn destination(&self) -> &DestinationId {
        &self.destination
    }

    async fn write(&mut self, chunk: &Chunk) -> Result<(), TeeError> {
        self.writer
            .write_all(chunk)
            .await
            .map_err(|e| TeeError::destination_write(self.destination.clone(), e))
    }

    async fn flush(&mut self) -> Result<(), TeeError> {
        self.writer
            .flush()
            .await
            .map_err(|e| TeeError::destination_write(self.destination.clone(), e))
    }

    #[instrument(name = "stream_sink_close", skip(self), fields(destination = %self.destination))]
    async fn close(&mut self) -> Result<(), TeeError> {
        self.flush().await?;
        debug!("StreamSink closed");
        Ok(())
    }
}
