//! Cancellation signal and interrupt listener
//!
//! The signal is a plain value handed to every task at construction; the
//! listener turns the process interrupt into either a cancellation or a notice.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, info, instrument, warn};

/// Notice printed for every interrupt suppressed in ignore mode
pub const IGNORED_NOTICE: &str = "the SIGINT signal is ignored";

/// Single-shot, idempotent request to stop reading and writing.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    token: CancellationToken,
}

impl CancellationSignal {
    /// Create a signal that has not been raised
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Raising it again has no further effect.
    pub fn raise(&self) {
        self.token.cancel();
    }

    /// Whether the signal has been raised
    pub fn is_raised(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the signal is raised
    pub fn raised(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

/// What an external interrupt does to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptMode {
    /// Raise the cancellation signal
    #[default]
    Cancel,
    /// Print a notice and carry on
    Ignore,
}

impl InterruptMode {
    /// Pick the mode from the ignore flag
    pub fn from_ignore(ignore: bool) -> Self {
        if ignore {
            Self::Ignore
        } else {
            Self::Cancel
        }
    }
}

/// Source of external interrupt notifications
#[trait_variant::make(InterruptSource: Send)]
pub trait LocalInterruptSource {
    /// Wait for the next interrupt. Returns false once no more can arrive.
    async fn next_interrupt(&mut self) -> bool;
}

/// SIGINT (Ctrl+C) of the current process
pub struct CtrlC {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
}

impl CtrlC {
    /// Register for SIGINT. Must be called inside the runtime.
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            signal: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?,
        })
    }
}

#[cfg(unix)]
impl InterruptSource for CtrlC {
    async fn next_interrupt(&mut self) -> bool {
        self.signal.recv().await.is_some()
    }
}

#[cfg(not(unix))]
impl InterruptSource for CtrlC {
    async fn next_interrupt(&mut self) -> bool {
        tokio::signal::ctrl_c().await.is_ok()
    }
}

impl InterruptSource for mpsc::Receiver<()> {
    async fn next_interrupt(&mut self) -> bool {
        mpsc::Receiver::recv(self).await.is_some()
    }
}

/// Background task reacting to interrupts
pub struct InterruptListener {
    task: Option<JoinHandle<()>>,
    suppressed: Arc<AtomicU64>,
}

impl InterruptListener {
    /// Start listening. Notices go to `notices`, prefixed with `program`.
    pub fn spawn<S, W>(
        signal: CancellationSignal,
        mode: InterruptMode,
        source: S,
        notices: W,
        program: &str,
    ) -> Self
    where
        S: InterruptSource + Send + 'static,
        W: Write + Send + 'static,
    {
        let suppressed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&suppressed);
        let notice = format!("{program}: {IGNORED_NOTICE}");

        let task = tokio::spawn(async move {
            listen(signal, mode, source, notices, notice, counter).await;
        });

        Self {
            task: Some(task),
            suppressed,
        }
    }

    /// Number of interrupts suppressed so far
    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    /// Stop listening. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Interrupt listener stopped");
        }
    }
}

impl Drop for InterruptListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[instrument(name = "interrupt_listener", skip_all, fields(mode = ?mode))]
async fn listen<S, W>(
    signal: CancellationSignal,
    mode: InterruptMode,
    mut source: S,
    mut notices: W,
    notice: String,
    suppressed: Arc<AtomicU64>,
) where
    S: InterruptSource,
    W: Write,
{
    loop {
        let interrupted = tokio::select! {
            _ = signal.raised() => break,
            interrupted = source.next_interrupt() => interrupted,
        };

        if !interrupted {
            debug!("Interrupt source closed");
            break;
        }

        match mode {
            InterruptMode::Ignore => {
                suppressed.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = writeln!(notices, "{notice}").and_then(|()| notices.flush()) {
                    warn!(error = %e, "Failed to print interrupt notice");
                }
            }
            InterruptMode::Cancel => {
                info!("Interrupt received, cancelling");
                signal.raise();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::{sleep, timeout, Duration};

    #[derive(Clone, Default)]
    struct NoticeBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for NoticeBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    async fn wait_for(listener: &InterruptListener, count: u64) {
        timeout(Duration::from_secs(2), async {
            while listener.suppressed() < count {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("interrupts were not processed in time");
    }

    #[test]
    fn test_raise_is_idempotent() {
        let signal = CancellationSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_raised());

        signal.raise();
        signal.raise();
        assert!(observer.is_raised());
    }

    #[tokio::test]
    async fn test_cancel_mode_raises_signal() {
        let signal = CancellationSignal::new();
        let (tx, rx) = mpsc::channel(4);
        let _listener = InterruptListener::spawn(
            signal.clone(),
            InterruptMode::Cancel,
            rx,
            io::sink(),
            "gtee",
        );

        tx.send(()).await.unwrap();
        timeout(Duration::from_secs(2), signal.raised())
            .await
            .expect("signal was not raised");
    }

    #[tokio::test]
    async fn test_ignore_mode_prints_notice_per_interrupt() {
        let signal = CancellationSignal::new();
        let notices = NoticeBuffer::default();
        let (tx, rx) = mpsc::channel(4);
        let listener = InterruptListener::spawn(
            signal.clone(),
            InterruptMode::Ignore,
            rx,
            notices.clone(),
            "gtee",
        );

        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();
        wait_for(&listener, 2).await;

        assert!(!signal.is_raised());
        let text = String::from_utf8(notices.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            text,
            "gtee: the SIGINT signal is ignored\ngtee: the SIGINT signal is ignored\n"
        );
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_detaches() {
        let signal = CancellationSignal::new();
        let (tx, rx) = mpsc::channel(4);
        let mut listener = InterruptListener::spawn(
            signal.clone(),
            InterruptMode::Cancel,
            rx,
            io::sink(),
            "gtee",
        );

        listener.stop();
        listener.stop();

        let _ = tx.send(()).await;
        sleep(Duration::from_millis(20)).await;
        assert!(!signal.is_raised());
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(InterruptMode::from_ignore(true), InterruptMode::Ignore);
        assert_eq!(InterruptMode::from_ignore(false), InterruptMode::Cancel);
    }
}
