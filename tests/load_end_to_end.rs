//! End-to-end load tests.
//!
//! Tests cover:
//! 1. Both execution modes on the same inputs
//! 2. Header handling: last declaration wins, trailing elements, CRLF
//! 3. Progress reporting with known and unknown lengths
//! 4. Error surfacing from sources and headers
//! 5. Cancellation in both modes

use crossbeam_channel::Receiver;
use pointstream::prelude::*;
use std::future::Future;
use std::io;
use std::pin::pin;
use std::task::{Context, Poll, Waker};
use std::thread;
use std::time::{Duration, Instant};

// =============================================================================
// Helper functions
// =============================================================================

fn ply(declared: u64, body: &str) -> String {
    format!(
        "ply\nformat ascii 1.0\nelement vertex {}\nproperty float x\nproperty float y\n\
         property float z\nproperty uchar red\nproperty uchar green\nproperty uchar blue\n\
         end_header\n{}",
        declared, body
    )
}

fn body_lines(n: usize) -> String {
    (0..n)
        .map(|i| format!("{}.5 {} -{} {} {} {}\n", i, i * 2, i, i % 256, 0, 255))
        .collect()
}

fn load(
    data: impl Into<Vec<u8>>,
    config: LoadConfig,
) -> (Result<PointSet, LoadError>, Vec<LoadProgress>) {
    let mut seen = Vec::new();
    let result = PointCloudLoader::new(config).load_blocking(
        MemorySource::new(data).with_chunk_size(17),
        |p| seen.push(p),
    );
    (result, seen)
}

fn both_modes(format: PointFormat) -> [LoadConfig; 2] {
    [
        LoadConfig::new(format).with_batch_size(7),
        LoadConfig::new(format)
            .with_batch_size(7)
            .with_execution(ExecutionMode::Offloaded),
    ]
}

/// Source that fails after serving its first chunk.
struct FailingSource {
    first: Option<Vec<u8>>,
    buf: Vec<u8>,
}

impl ByteSource for FailingSource {
    async fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        match self.first.take() {
            Some(chunk) => {
                self.buf = chunk;
                Ok(Some(&self.buf))
            }
            None => Err(io::Error::other("connection reset")),
        }
    }
}

/// Headerless source that sleeps before serving each one-line chunk.
struct TrickleSource {
    line: Vec<u8>,
    remaining: usize,
}

impl TrickleSource {
    fn endless() -> Self {
        Self::lines(usize::MAX)
    }

    fn lines(n: usize) -> Self {
        Self {
            line: b"1 2 3\n".to_vec(),
            remaining: n,
        }
    }
}

impl ByteSource for TrickleSource {
    async fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        thread::sleep(Duration::from_millis(1));
        Ok(Some(&self.line))
    }
}

/// Source whose first read blocks until its gate is released.
struct GatedSource {
    gate: Receiver<Vec<u8>>,
    buf: Vec<u8>,
}

impl ByteSource for GatedSource {
    async fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        match self.gate.recv() {
            Ok(chunk) => {
                self.buf = chunk;
                Ok(Some(&self.buf))
            }
            Err(_) => Ok(None),
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn test_modes_return_identical_points() {
    let data = ply(200, &body_lines(200));
    let [coop, offloaded] = both_modes(PointFormat::HeaderQualified);
    let a = load(data.clone(), coop).0.unwrap();
    let b = load(data, offloaded).0.unwrap();
    assert_eq!(a.len(), 200);
    assert_eq!(a, b);
    assert_eq!(a[3], Point::new(3.5, 6.0, -3.0, 3, 0, 255));
}

#[test]
fn test_declared_count_matches_returned_count() {
    for config in both_modes(PointFormat::HeaderQualified) {
        let points = load(ply(50, &body_lines(50)), config).0.unwrap();
        assert_eq!(points.len(), 50);
        assert!(points.iter().all(|p| p.position().iter().all(|c| !c.is_nan())));
    }
}

#[test]
fn test_malformed_lines_are_skipped() {
    let body = "1 2 3 4 5 6\nthis is not a point\n1 2 nan 4 5 6\n7 8 9 10 11 12\n";
    let points = load(ply(3, body), LoadConfig::new(PointFormat::HeaderQualified))
        .0
        .unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[1].position(), [7.0, 8.0, 9.0]);
}

#[test]
fn test_last_declaration_wins() {
    let data = format!(
        "ply\nelement vertex 10\nelement vertex 1000\nend_header\n{}",
        body_lines(20)
    );
    let (result, seen) = load(data, LoadConfig::new(PointFormat::HeaderQualified));
    assert_eq!(result.unwrap().len(), 20);
    assert_eq!(seen.last().unwrap().records_total, Some(1000));
}

#[test]
fn test_trailing_face_element_not_decoded() {
    let data = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\n\
                element face 1\nproperty list uchar int vertex_indices\nend_header\n\
                0 0 0 1 1 1\n1 1 1 2 2 2\n4 0 1 2 3 5\n";
    for config in both_modes(PointFormat::HeaderQualified) {
        let points = load(data, config).0.unwrap();
        assert_eq!(points.len(), 2);
    }
}

#[test]
fn test_crlf_matches_lf() {
    let lf = ply(30, &body_lines(30));
    let crlf = lf.replace('\n', "\r\n");
    let config = LoadConfig::new(PointFormat::HeaderQualified);
    let a = load(lf, config.clone()).0.unwrap();
    let b = load(crlf, config).0.unwrap();
    assert_eq!(a.len(), 30);
    assert_eq!(a, b);
}

#[test]
fn test_headerless_color_fallbacks() {
    let data = "# scan\n1 2 3\n4,5,6,10,20,30\n\n// note\n7 8 9 x 20 30\n";
    for config in both_modes(PointFormat::Headerless) {
        let points = load(data, config).0.unwrap();
        assert_eq!(
            points.to_vec(),
            vec![
                Point::white(1.0, 2.0, 3.0),
                Point::new(4.0, 5.0, 6.0, 10, 20, 30),
                Point::new(7.0, 8.0, 9.0, 255, 20, 30),
            ]
        );
    }
}

#[test]
fn test_zero_declared_count_decodes_until_end() {
    let (result, seen) = load(
        ply(0, &body_lines(5)),
        LoadConfig::new(PointFormat::HeaderQualified),
    );
    assert_eq!(result.unwrap().len(), 5);
    assert_eq!(seen.last().unwrap().records_total, None);
    assert_eq!(seen.last().unwrap().percentage, 100.0);
}

// =============================================================================
// Progress
// =============================================================================

#[test]
fn test_progress_monotonic_and_complete() {
    for config in both_modes(PointFormat::HeaderQualified) {
        let (result, seen) = load(ply(100, &body_lines(100)), config);
        assert_eq!(result.unwrap().len(), 100);
        assert!(seen.len() > 1);
        assert!(seen.windows(2).all(|w| w[0].percentage <= w[1].percentage));
        assert!(seen.iter().all(|p| (0.0..=100.0).contains(&p.percentage)));
        assert_eq!(seen.last().unwrap().percentage, 100.0);
    }
}

#[test]
fn test_progress_with_unknown_length() {
    let mut seen = Vec::new();
    let loader = PointCloudLoader::new(LoadConfig::new(PointFormat::Headerless).with_batch_size(3));
    let points = loader
        .load_blocking(
            MemorySource::new(body_lines(10)).without_total_len(),
            |p| seen.push(p),
        )
        .unwrap();
    assert_eq!(points.len(), 10);
    assert!(seen.iter().all(|p| p.bytes_total.is_none()));
    assert!(seen.windows(2).all(|w| w[0].percentage <= w[1].percentage));
    assert_eq!(seen.last().unwrap().percentage, 100.0);
}

#[test]
fn test_cooperative_load_yields_every_batch() {
    let loader = PointCloudLoader::new(LoadConfig::new(PointFormat::Headerless).with_batch_size(10));
    let mut future = pin!(loader.load(MemorySource::new(body_lines(30)), |_| {}));
    let mut cx = Context::from_waker(Waker::noop());

    let mut pending = 0;
    let points = loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(result) => break result.unwrap(),
            Poll::Pending => pending += 1,
        }
    };
    assert_eq!(points.len(), 30);
    assert_eq!(pending, 3);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_missing_terminator_fails_in_both_modes() {
    for config in both_modes(PointFormat::HeaderQualified) {
        let (result, seen) = load("ply\nelement vertex 2\n1 2 3 4 5 6\n", config);
        assert!(matches!(result, Err(LoadError::MalformedHeader(_))));
        assert!(seen.iter().all(|p| p.percentage < 100.0));
    }
}

#[test]
fn test_source_error_surfaces_verbatim() {
    for mode in [ExecutionMode::Cooperative, ExecutionMode::Offloaded] {
        let loader =
            PointCloudLoader::new(LoadConfig::new(PointFormat::Headerless).with_execution(mode));
        let source = FailingSource {
            first: Some(b"1 2 3\n".to_vec()),
            buf: Vec::new(),
        };
        let err = loader.load_blocking(source, |_| {}).unwrap_err();
        assert!(matches!(err, LoadError::UnreadableStream(_)));
        assert_eq!(err.to_string(), "Unreadable stream: connection reset");
    }
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancel_offloaded_load() {
    let loader = PointCloudLoader::new(LoadConfig::new(PointFormat::Headerless).with_batch_size(5));
    let mut handle = loader.spawn(TrickleSource::endless()).unwrap();

    // Wait for the worker to make progress, then cancel.
    match handle.recv() {
        Some(WorkerMessage::Progress(_)) => {}
        other => panic!("expected progress, got {:?}", other),
    }
    handle.cancel();

    let mut terminal = None;
    while let Some(message) = handle.recv() {
        if message.is_terminal() {
            terminal = Some(message);
        }
    }
    assert!(matches!(
        terminal,
        Some(WorkerMessage::Error(LoadError::Cancelled))
    ));
    assert!(handle.is_settled());
}

#[test]
fn test_cancel_cooperative_load_from_progress() {
    let loader = PointCloudLoader::new(LoadConfig::new(PointFormat::Headerless).with_batch_size(4));
    let token = CancellationToken::new();
    let mut batches = 0;
    let result = pollster::block_on(loader.load_with_cancellation(
        TrickleSource::endless(),
        &token,
        |_| {
            batches += 1;
            if batches == 2 {
                token.cancel();
            }
        },
    ));
    assert!(matches!(result, Err(LoadError::Cancelled)));
    assert_eq!(batches, 2);
}

#[test]
fn test_cancelled_token_stops_before_start() {
    let token = CancellationToken::new();
    token.cancel();
    let loader = PointCloudLoader::new(LoadConfig::new(PointFormat::Headerless));
    let result = pollster::block_on(loader.load_with_cancellation(
        MemorySource::new("1 2 3\n"),
        &token,
        |_| {},
    ));
    assert!(result.unwrap_err().is_cancelled());
}

#[test]
fn test_dropping_handle_cancels_its_load() {
    let loader = PointCloudLoader::new(LoadConfig::new(PointFormat::Headerless));
    let handle = loader.spawn(TrickleSource::endless()).unwrap();
    let token = handle.cancellation().clone();
    drop(handle);
    assert!(token.is_cancelled());
}

#[test]
fn test_dropping_handle_leaves_sibling_running() {
    let loader = PointCloudLoader::new(
        LoadConfig::new(PointFormat::Headerless)
            .with_batch_size(10)
            .with_execution(ExecutionMode::Offloaded),
    );
    let first = loader.spawn(TrickleSource::endless()).unwrap();
    let second = loader.spawn(TrickleSource::lines(100)).unwrap();

    drop(first);
    let points = second.wait(|_| {}).unwrap();
    assert_eq!(points.len(), 100);
}

#[test]
fn test_loader_reusable_after_cancelled_load() {
    let loader = PointCloudLoader::new(LoadConfig::new(PointFormat::Headerless).with_batch_size(5));

    let first = loader.spawn(TrickleSource::endless()).unwrap();
    first.cancel();
    let err = first.wait(|_| {}).unwrap_err();
    assert!(err.is_cancelled());

    let points = loader
        .load_blocking(MemorySource::new("4 5 6\n"), |_| {})
        .unwrap();
    assert_eq!(points.to_vec(), vec![Point::white(4.0, 5.0, 6.0)]);

    let clone = loader.clone();
    let handle = clone.spawn(TrickleSource::lines(3)).unwrap();
    assert_eq!(handle.wait(|_| {}).unwrap().len(), 3);
}

#[test]
fn test_drop_returns_while_worker_blocked_in_read() {
    let (release, gate) = crossbeam_channel::unbounded();
    let loader = PointCloudLoader::new(LoadConfig::new(PointFormat::Headerless));
    let handle = loader
        .spawn(GatedSource {
            gate,
            buf: Vec::new(),
        })
        .unwrap();

    let started = Instant::now();
    drop(handle);
    assert!(started.elapsed() < Duration::from_secs(2));

    // Unblock the detached worker so it can observe the cancellation.
    drop(release);
}
