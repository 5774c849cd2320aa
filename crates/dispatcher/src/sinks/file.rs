//! FileSink - writes chunks to a named file

use std::io;
use std::path::Path;

use contracts::{ByteSink, Chunk, DestinationId, OpenMode, TeeError};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Permission bits for files the sink creates (before umask)
#[cfg(unix)]
const CREATE_MODE: u32 = 0o644;

/// Sink that writes chunks to a file opened once at startup
pub struct FileSink {
    destination: DestinationId,
    file: File,
    /// Regular files are synced on close; pipes and devices are only flushed
    regular: bool,
}

impl FileSink {
    /// Open (creating if needed) the file at `path`
    #[instrument(name = "file_sink_open", skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self, TeeError> {
        let path = path.as_ref();
        let destination = DestinationId::File(path.to_path_buf());

        match Self::open_file(path, mode).await {
            Ok((file, regular)) => {
                debug!(regular, "FileSink opened");
                Ok(Self {
                    destination,
                    file,
                    regular,
                })
            }
            Err(e) => Err(TeeError::destination_open(destination, e)),
        }
    }

    async fn open_file(path: &Path, mode: OpenMode) -> io::Result<(File, bool)> {
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OpenMode::Truncate => options.write(true).truncate(true),
            OpenMode::Append => options.append(true),
        };
        #[cfg(unix)]
        options.mode(CREATE_MODE);

        let file = options.open(path).await?;
        let regular = file.metadata().await?.is_file();
        Ok((file, regular))
    }

    fn write_error(&self, e: io::Error) -> TeeError {
        TeeError::destination_write(self.destination.clone(), e)
    }
}

impl ByteSink for FileSink {
    fn destination(&self) -> &DestinationId {
        &self.destination
    }

    async fn write(&mut self, chunk: &Chunk) -> Result<(), TeeError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| self.write_error(e))
    }

    async fn flush(&mut self) -> Result<(), TeeError> {
        self.file.flush().await.map_err(|e| self.write_error(e))
    }

    #[instrument(name = "file_sink_close", skip(self), fields(destination = %self.destination))]
    async fn close(&mut self) -> Result<(), TeeError> {
        self.flush().await?;
        if self.regular {
            self.file.sync_all().await.map_err(|e| self.write_error(e))?;
        }
        debug!("FileSink closed");
        Ok(())
    }
}
