//! # Integration Tests
//!
//! End-to-end runs of the coordinator over real files.
//!
//! Covers:
//! - Copying to many files at once
//! - Open and write failures next to healthy destinations
//! - Cancellation and back-pressure

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::Duration;

    use contracts::{DestinationId, OpenMode, ReportOrigin, TeeError, CHUNK_CAPACITY};
    use dispatcher::{CancellationSignal, Coordinator, CoordinatorConfig, RunReport};
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;

    fn capture_stdout() -> (DuplexStream, JoinHandle<Vec<u8>>) {
        let (writer, mut reader) = tokio::io::duplex(16 * 1024);
        let task = tokio::spawn(async move {
            let mut out = Vec::new();
            reader.read_to_end(&mut out).await.unwrap();
            out
        });
        (writer, task)
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    async fn tee(files: Vec<PathBuf>, open_mode: OpenMode, input: Vec<u8>) -> (RunReport, Vec<u8>) {
        let (stdout, captured) = capture_stdout();
        let config = CoordinatorConfig {
            files,
            open_mode,
            ..Default::default()
        };
        let report = Coordinator::new(config)
            .run(Cursor::new(input), stdout, CancellationSignal::new())
            .await;
        (report, captured.await.unwrap())
    }

    /// Input -> 13 files + stdout, every destination byte-identical
    #[tokio::test]
    async fn test_e2e_thirteen_files() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = (0..13).map(|i| dir.path().join(format!("out{i}"))).collect();
        let input = pattern(200_000);

        let (report, stdout) = tee(files.clone(), OpenMode::Truncate, input.clone()).await;

        assert!(report.is_success(), "{:?}", report.errors);
        assert!(!report.cancelled);
        assert_eq!(stdout, input);
        for file in &files {
            assert_eq!(fs::read(file).unwrap(), input);
        }
        assert_eq!(report.stats.destinations.len(), 14);
        assert_eq!(report.stats.complete_destinations(), 14);
    }

    #[tokio::test]
    async fn test_e2e_chunk_boundaries() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("out");
        let input = pattern(3 * CHUNK_CAPACITY + 17);

        let (report, stdout) = tee(vec![file.clone()], OpenMode::Truncate, input.clone()).await;

        assert!(report.is_success());
        assert_eq!(report.stats.bytes_read, input.len() as u64);
        assert_eq!(report.stats.chunks_read, 4);
        assert_eq!(stdout, input);
        assert_eq!(fs::read(&file).unwrap(), input);
        for (_, metrics) in &report.stats.destinations {
            assert_eq!(metrics.chunk_count, 4);
            assert_eq!(metrics.bytes_written, input.len() as u64);
        }
    }

    #[tokio::test]
    async fn test_e2e_empty_input_creates_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("empty");
        fs::write(&file, b"stale").unwrap();

        let (report, stdout) = tee(vec![file.clone()], OpenMode::Truncate, Vec::new()).await;

        assert!(report.is_success());
        assert!(stdout.is_empty());
        assert_eq!(fs::read(&file).unwrap(), b"");
        assert_eq!(report.stats.chunks_read, 0);
    }

    #[tokio::test]
    async fn test_e2e_append_twice() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("log");

        for _ in 0..2 {
            let (report, _) = tee(vec![file.clone()], OpenMode::Append, b"line\n".to_vec()).await;
            assert!(report.is_success());
        }

        assert_eq!(fs::read(&file).unwrap(), b"line\nline\n");
    }

    #[tokio::test]
    async fn test_e2e_duplicate_operands() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");

        let (report, _) = tee(
            vec![a.clone(), a.clone(), b.clone(), a.clone()],
            OpenMode::Append,
            b"once".to_vec(),
        )
        .await;

        assert!(report.is_success());
        let ids: Vec<_> = report.stats.destinations.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(
            ids,
            vec![DestinationId::File(a.clone()), DestinationId::File(b.clone()), DestinationId::Stdout]
        );
        assert_eq!(fs::read(&a).unwrap(), b"once");
        assert_eq!(fs::read(&b).unwrap(), b"once");
    }

    #[tokio::test]
    async fn test_e2e_unopenable_destination() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good");
        let missing_parent = dir.path().join("no/such/dir/file");
        let input = pattern(100_000);

        let (report, stdout) = tee(
            vec![dir.path().to_path_buf(), good.clone(), missing_parent.clone()],
            OpenMode::Truncate,
            input.clone(),
        )
        .await;

        assert!(!report.is_success());
        assert_eq!(report.errors.len(), 2);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e, TeeError::DestinationOpen { .. })));
        assert_eq!(
            report.errors[1].origin(),
            ReportOrigin::Destination(DestinationId::File(missing_parent))
        );

        assert_eq!(stdout, input);
        assert_eq!(fs::read(&good).unwrap(), input);
        assert_eq!(report.stats.destinations.len(), 2);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_e2e_write_failure_isolated() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good");
        let full = PathBuf::from("/dev/full");
        let input = pattern(10 * CHUNK_CAPACITY);

        let (report, stdout) = tee(
            vec![full.clone(), good.clone()],
            OpenMode::Truncate,
            input.clone(),
        )
        .await;

        assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
        assert!(matches!(report.errors[0], TeeError::DestinationWrite { .. }));
        assert_eq!(
            report.errors[0].origin(),
            ReportOrigin::Destination(DestinationId::File(full))
        );

        assert_eq!(stdout, input);
        assert_eq!(fs::read(&good).unwrap(), input);
        assert_eq!(report.stats.complete_destinations(), 2);
    }

    #[tokio::test]
    async fn test_e2e_cancel_with_open_input() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("partial");
        let (mut input_tx, input_rx) = tokio::io::duplex(1024);
        let (stdout, captured) = capture_stdout();
        let signal = CancellationSignal::new();

        let config = CoordinatorConfig {
            files: vec![file.clone()],
            ..Default::default()
        };
        let run = tokio::spawn(Coordinator::new(config).run(input_rx, stdout, signal.clone()));

        input_tx.write_all(b"before").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        signal.raise();

        let report = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("run did not stop after cancellation")
            .unwrap();

        assert!(report.cancelled);
        assert!(report.is_success());
        assert_eq!(captured.await.unwrap(), b"before");
        assert_eq!(fs::read(&file).unwrap(), b"before");

        // Input that arrives after cancellation is never copied.
        let _ = input_tx.write_all(b"after").await;
    }

    /// A slow stdout consumer holds back the run but loses nothing
    #[tokio::test]
    async fn test_e2e_slow_consumer() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("fast");
        let input = pattern(40 * CHUNK_CAPACITY);

        let (stdout, mut reader) = tokio::io::duplex(4096);
        let captured = tokio::spawn(async move {
            let mut out = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = reader.read(&mut buf).await.unwrap();
                if n == 0 {
                    break out;
                }
                out.extend_from_slice(&buf[..n]);
                tokio::task::yield_now().await;
            }
        });

        let config = CoordinatorConfig {
            files: vec![file.clone()],
            queue_capacity: 2,
            ..Default::default()
        };
        let report = Coordinator::new(config)
            .run(Cursor::new(input.clone()), stdout, CancellationSignal::new())
            .await;

        assert!(report.is_success());
        assert_eq!(captured.await.unwrap(), input);
        assert_eq!(fs::read(&file).unwrap(), input);
    }
}
