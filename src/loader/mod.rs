//! Point-cloud loading with a selectable execution mode.
//!
//! # Execution modes
//!
//! - **Cooperative**: [`PointCloudLoader::load`] is a future run on the
//!   caller's executor. After every batch of decoded records it reports
//!   progress and yields, so a host event loop keeps turning.
//! - **Offloaded**: [`PointCloudLoader::spawn`] runs the same pipeline on
//!   a worker thread and reports through [`WorkerMessage`]s.
//!
//! [`PointCloudLoader::load_blocking`] picks between the two from
//! [`LoadConfig::execution`].
//!
//! # Example
//!
//! ```rust,no_run
//! use pointstream::{load_path, ExecutionMode, LoadConfig, PointFormat};
//!
//! let config = LoadConfig::new(PointFormat::HeaderQualified)
//!     .with_execution(ExecutionMode::Offloaded);
//! let points = load_path("scan.ply", config, |p| {
//!     eprintln!("{:.0}%", p.percentage);
//! })
//! .unwrap();
//! println!("{} points", points.len());
//! ```

pub mod worker;

pub use worker::{LoadHandle, WorkerMessage};

use crate::config::{ExecutionMode, LoadConfig, PointFormat};
use crate::error::LoadError;
use crate::point::PointSet;
use crate::streaming::pipeline::{run_pipeline, Suspend};
use crate::streaming::progress::LoadProgress;
use crate::streaming::schedule::CancellationToken;
use crate::streaming::source::{ByteSource, ReaderSource};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes inspected when sniffing a format from content.
const SNIFF_LEN: u64 = 64;

/// Entry point for loads sharing one configuration.
///
/// The loader holds no per-load state. Every load gets its own
/// cancellation token, so loads started from the same loader (or its
/// clones) never cancel each other.
#[derive(Debug, Clone)]
pub struct PointCloudLoader {
    config: LoadConfig,
}

impl PointCloudLoader {
    pub fn new(config: LoadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Load on the current executor, yielding after every batch.
    pub async fn load<S, F>(&self, source: S, on_progress: F) -> Result<PointSet, LoadError>
    where
        S: ByteSource,
        F: FnMut(LoadProgress),
    {
        self.load_with_cancellation(source, &CancellationToken::new(), on_progress)
            .await
    }

    /// Cooperative load stopped by `cancel`.
    ///
    /// The token is checked before every chunk request and at every batch
    /// boundary. Pass a fresh token per load.
    pub async fn load_with_cancellation<S, F>(
        &self,
        source: S,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<PointSet, LoadError>
    where
        S: ByteSource,
        F: FnMut(LoadProgress),
    {
        run_pipeline(source, &self.config, cancel, Suspend::AtBatches, on_progress).await
    }

    /// Start a load on a worker thread. The returned handle owns the
    /// load's cancellation token.
    pub fn spawn<S>(&self, source: S) -> Result<LoadHandle, LoadError>
    where
        S: ByteSource + Send + 'static,
    {
        worker::spawn_worker(source, self.config.clone(), CancellationToken::new())
    }

    /// Load to completion in the configured execution mode.
    ///
    /// Cooperative loads are driven to completion on the calling thread;
    /// offloaded loads block on the worker's messages.
    pub fn load_blocking<S, F>(&self, source: S, on_progress: F) -> Result<PointSet, LoadError>
    where
        S: ByteSource + Send + 'static,
        F: FnMut(LoadProgress),
    {
        match self.config.execution {
            ExecutionMode::Cooperative => pollster::block_on(self.load(source, on_progress)),
            ExecutionMode::Offloaded => self.spawn(source)?.wait(on_progress),
        }
    }
}

/// Decide the format of a named file: extension first, then content.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<PointFormat, LoadError> {
    let path = path.as_ref();
    if let Some(format) = PointFormat::from_path(path) {
        return Ok(format);
    }
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    let format = PointFormat::sniff(&head);
    log::debug!(
        "no known extension on {}, sniffed {}",
        path.display(),
        format.name()
    );
    Ok(format)
}

/// Unified entry point: detect the format of `path` and load it.
///
/// The format in `config` is replaced by the detected one; execution
/// mode, batch and chunk sizes are kept.
pub fn load_path<P, F>(path: P, config: LoadConfig, on_progress: F) -> Result<PointSet, LoadError>
where
    P: AsRef<Path>,
    F: FnMut(LoadProgress),
{
    let path = path.as_ref();
    let format = detect_format(path)?;
    let config = LoadConfig { format, ..config };
    let source = ReaderSource::open(path, config.chunk_size)?;
    PointCloudLoader::new(config).load_blocking(source, on_progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::source::MemorySource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CLOUD: &str = "ply\nformat ascii 1.0\nelement vertex 3\nend_header\n\
                         0 0 0 1 2 3\n1 1 1 4 5 6\n2 2 2 7 8 9\n";

    #[test]
    fn test_modes_agree() {
        let mut results = Vec::new();
        for mode in [ExecutionMode::Cooperative, ExecutionMode::Offloaded] {
            let config = LoadConfig::new(PointFormat::HeaderQualified)
                .with_execution(mode)
                .with_batch_size(1);
            let loader = PointCloudLoader::new(config);
            let source = MemorySource::new(CLOUD).with_chunk_size(5);
            results.push(loader.load_blocking(source, |_| {}).unwrap());
        }
        assert_eq!(results[0].len(), 3);
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn test_detect_format_by_sniffing() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CLOUD.as_bytes()).unwrap();
        file.flush().unwrap();
        assert_eq!(
            detect_format(file.path()).unwrap(),
            PointFormat::HeaderQualified
        );
    }

    #[test]
    fn test_load_path_sniffs_past_bom() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBF").unwrap();
        file.write_all(CLOUD.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = LoadConfig::new(PointFormat::Headerless);
        let points = load_path(file.path(), config, |_| {}).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].rgb(), (7, 8, 9));
    }

    #[test]
    fn test_load_path_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".xyz").tempfile().unwrap();
        file.write_all(b"1 2 3\n4 5 6 10 20 30\n").unwrap();
        file.flush().unwrap();

        let config = LoadConfig::new(PointFormat::HeaderQualified);
        let points = load_path(file.path(), config, |_| {}).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].rgb(), (10, 20, 30));
    }

    #[test]
    fn test_load_path_missing_file() {
        let config = LoadConfig::new(PointFormat::Headerless);
        let err = load_path("/nonexistent/cloud.xyz", config, |_| {}).unwrap_err();
        assert!(matches!(err, LoadError::UnreadableStream(_)));
    }
}
