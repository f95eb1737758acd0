//! Load configuration.
//!
//! Configuration is a plain value handed to each load. Nothing here is
//! global, so concurrent loads with different settings never interact.

use crate::streaming::buffers::{DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_SIZE};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text layout of a point-cloud stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointFormat {
    /// PLY-style header ending in `end_header`, then `x y z r g b` lines.
    HeaderQualified,
    /// No header; `x y z` or `x y z r g b` lines.
    Headerless,
}

impl PointFormat {
    /// Parse format from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ply" | "header" | "header-qualified" => Some(Self::HeaderQualified),
            "xyz" | "pts" | "txt" | "csv" | "headerless" => Some(Self::Headerless),
            _ => None,
        }
    }

    /// Choose a format from a resource name's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ply" => Some(Self::HeaderQualified),
            "xyz" | "txt" | "pts" | "csv" | "asc" => Some(Self::Headerless),
            _ => None,
        }
    }

    /// Choose a format from the first bytes of a stream.
    ///
    /// A leading UTF-8 byte order mark and whitespace are skipped.
    pub fn sniff(head: &[u8]) -> Self {
        let head = head.strip_prefix(UTF8_BOM).unwrap_or(head);
        let start = head
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(head.len());
        let head = &head[start..];
        let magic = head.starts_with(b"ply")
            && head.get(3).is_none_or(|b| b.is_ascii_whitespace());
        if magic {
            Self::HeaderQualified
        } else {
            Self::Headerless
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::HeaderQualified => "ply",
            Self::Headerless => "xyz",
        }
    }
}

/// Where the parse pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// On the caller's executor, yielding after every batch.
    #[default]
    Cooperative,
    /// On a dedicated worker thread, reporting through messages.
    Offloaded,
}

impl ExecutionMode {
    /// Parse mode from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cooperative" | "inline" => Some(Self::Cooperative),
            "offloaded" | "worker" | "thread" => Some(Self::Offloaded),
            _ => None,
        }
    }
}

/// Settings for one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    pub format: PointFormat,
    pub execution: ExecutionMode,
    /// Decoded records between progress emissions and suspension points.
    pub batch_size: usize,
    /// Bytes requested per chunk by sources built from this config.
    pub chunk_size: usize,
}

impl LoadConfig {
    pub fn new(format: PointFormat) -> Self {
        Self {
            format,
            execution: ExecutionMode::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the execution mode.
    pub fn with_execution(mut self, mode: ExecutionMode) -> Self {
        self.execution = mode;
        self
    }

    /// Set the batch size. Zero is treated as one.
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    /// Set the chunk size. Zero is treated as one.
    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            PointFormat::from_path("scan.ply"),
            Some(PointFormat::HeaderQualified)
        );
        assert_eq!(
            PointFormat::from_path("/data/Scan.PLY"),
            Some(PointFormat::HeaderQualified)
        );
        assert_eq!(
            PointFormat::from_path("cloud.xyz"),
            Some(PointFormat::Headerless)
        );
        assert_eq!(
            PointFormat::from_path("cloud.csv"),
            Some(PointFormat::Headerless)
        );
        assert_eq!(PointFormat::from_path("cloud.laz"), None);
        assert_eq!(PointFormat::from_path("cloud"), None);
    }

    #[test]
    fn test_format_sniff() {
        assert_eq!(
            PointFormat::sniff(b"ply\nformat ascii 1.0\n"),
            PointFormat::HeaderQualified
        );
        assert_eq!(
            PointFormat::sniff(b"ply\r\n"),
            PointFormat::HeaderQualified
        );
        assert_eq!(PointFormat::sniff(b"ply"), PointFormat::HeaderQualified);
        assert_eq!(PointFormat::sniff(b"plywood 1 2"), PointFormat::Headerless);
        assert_eq!(PointFormat::sniff(b"1 2 3\n"), PointFormat::Headerless);
        assert_eq!(PointFormat::sniff(b""), PointFormat::Headerless);
    }

    #[test]
    fn test_format_sniff_skips_bom() {
        assert_eq!(
            PointFormat::sniff(b"\xEF\xBB\xBFply\nformat ascii 1.0\n"),
            PointFormat::HeaderQualified
        );
        assert_eq!(
            PointFormat::sniff(b"\xEF\xBB\xBF\r\nply\n"),
            PointFormat::HeaderQualified
        );
        assert_eq!(PointFormat::sniff(b"\xEF\xBB\xBF1 2 3\n"), PointFormat::Headerless);
        // Only a complete mark is skipped.
        assert_eq!(PointFormat::sniff(b"\xEF\xBBply\n"), PointFormat::Headerless);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            ExecutionMode::from_str("offloaded"),
            Some(ExecutionMode::Offloaded)
        );
        assert_eq!(
            ExecutionMode::from_str("Cooperative"),
            Some(ExecutionMode::Cooperative)
        );
        assert_eq!(ExecutionMode::from_str("gpu"), None);
    }

    #[test]
    fn test_config_builder() {
        let config = LoadConfig::new(PointFormat::Headerless)
            .with_execution(ExecutionMode::Offloaded)
            .with_batch_size(0)
            .with_chunk_size(4096);
        assert_eq!(config.execution, ExecutionMode::Offloaded);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(
            LoadConfig::new(PointFormat::HeaderQualified).batch_size,
            DEFAULT_BATCH_SIZE
        );
    }
}
