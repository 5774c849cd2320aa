//! ChunkReader - owns the input read cursor and feeds every live outlet

use bytes::BytesMut;
use contracts::{Chunk, TeeError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, info, instrument};

use crate::cancel::CancellationSignal;
use crate::handle::Outlet;

/// How the read loop ended
#[derive(Debug, Default)]
pub struct ReaderOutcome {
    /// Chunks read and offered
    pub chunks: u64,
    /// Bytes read and offered
    pub bytes: u64,
    /// Input failure, if reading stopped on an error
    pub error: Option<TeeError>,
    /// Whether the cancellation signal cut the stream short
    pub cancelled: bool,
}

enum Offer {
    Delivered,
    Cancelled,
}

/// Reads fixed-size chunks and offers each one to every live outlet in order
pub struct ChunkReader<R> {
    input: R,
    outlets: Vec<Outlet>,
    signal: CancellationSignal,
    chunk_capacity: usize,
}

impl<R> ChunkReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Create a reader over `input` feeding `outlets` in the given order
    pub fn new(
        input: R,
        outlets: Vec<Outlet>,
        signal: CancellationSignal,
        chunk_capacity: usize,
    ) -> Self {
        Self {
            input,
            outlets,
            signal,
            chunk_capacity: chunk_capacity.max(1),
        }
    }

    /// Run until end of input, a read error, cancellation, or every outlet detaching.
    ///
    /// All outlets are dropped on return, which closes their channels.
    #[instrument(
        name = "chunk_reader_run",
        skip(self),
        fields(outlets = self.outlets.len(), chunk_capacity = self.chunk_capacity)
    )]
    pub async fn run(mut self) -> ReaderOutcome {
        let mut outcome = ReaderOutcome::default();

        loop {
            if self.signal.is_raised() {
                outcome.cancelled = true;
                break;
            }

            let mut buf = BytesMut::zeroed(self.chunk_capacity);
            let read = tokio::select! {
                biased;
                _ = self.signal.raised() => None,
                read = self.input.read(&mut buf[..]) => Some(read),
            };

            let len = match read {
                None => {
                    outcome.cancelled = true;
                    break;
                }
                Some(Ok(0)) => {
                    debug!("Input exhausted");
                    break;
                }
                Some(Ok(len)) => len,
                Some(Err(e)) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Some(Err(e)) => {
                    error!(error = %e, "Input read failed");
                    outcome.error = Some(TeeError::input_read(e));
                    break;
                }
            };

            let chunk = Chunk::from_read(buf, len);
            outcome.chunks += 1;
            outcome.bytes += len as u64;

            if let Offer::Cancelled = self.offer(chunk).await {
                outcome.cancelled = true;
                break;
            }

            if self.outlets.is_empty() {
                info!("Every destination detached, stopping input");
                break;
            }
        }

        if outcome.cancelled {
            info!(bytes = outcome.bytes, "Reader cancelled");
        }
        debug!(
            chunks = outcome.chunks,
            bytes = outcome.bytes,
            "Reader finished, closing delivery channels"
        );
        outcome
    }

    /// Offer one chunk to every live outlet, in destination order.
    ///
    /// Outlets whose writer has detached are dropped from the live set.
    async fn offer(&mut self, chunk: Chunk) -> Offer {
        let mut live = Vec::with_capacity(self.outlets.len());

        for outlet in std::mem::take(&mut self.outlets) {
            let sent = tokio::select! {
                biased;
                _ = self.signal.raised() => None,
                sent = outlet.send(chunk.clone()) => Some(sent.is_ok()),
            };

            match sent {
                None => return Offer::Cancelled,
                Some(true) => live.push(outlet),
                Some(false) => {
                    debug!(destination = %outlet.destination(), "Destination detached");
                }
            }
        }

        self.outlets = live;
        Offer::Delivered
    }
}
