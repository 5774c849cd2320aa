//! Chunk - one immutable slice of the input stream

use std::ops::Deref;

use bytes::{Bytes, BytesMut};

/// Upper bound for a single read from the input stream (64 KiB).
pub const CHUNK_CAPACITY: usize = 64 * 1024;

/// An immutable, reference-counted slice of the input.
///
/// Cloning a chunk shares the same allocation, so handing one chunk to every
/// destination costs a reference-count bump per destination and no copy.
/// There is no way to obtain mutable access once a chunk has been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(Bytes);

impl Chunk {
    /// Build a chunk from the first `len` bytes of a freshly filled read buffer.
    ///
    /// Bytes past `len` are dropped, never carried as padding.
    pub fn from_read(mut buf: BytesMut, len: usize) -> Self {
        buf.truncate(len);
        Self(buf.freeze())
    }

    /// Number of bytes in this chunk
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chunk holds no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the chunk contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Chunk {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<&'static [u8]> for Chunk {
    fn from(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }
}
