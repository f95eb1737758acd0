//! Load command: read a cloud and report on it, or dump its points.

use crate::config::{ExecutionMode, LoadConfig, PointFormat};
use crate::error::LoadError;
use crate::loader::{detect_format, PointCloudLoader};
use crate::point::PointSet;
use crate::streaming::output::PointWriter;
use crate::streaming::progress::LoadProgress;
use crate::streaming::source::ReaderSource;
use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::time::Instant;

/// Bytes read from stdin to sniff its format.
const STDIN_SNIFF_LEN: u64 = 64;

/// Statistics from one load.
#[derive(Debug, Default, Clone)]
pub struct LoadStats {
    pub points: usize,
    pub elapsed_secs: f64,
}

impl LoadStats {
    /// Points decoded per second.
    pub fn throughput(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.points as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for LoadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} points in {:.3}s ({:.0} points/s)",
            self.points,
            self.elapsed_secs,
            self.throughput()
        )
    }
}

/// Load command.
#[derive(Debug, Clone)]
pub struct LoadCommand {
    /// Forced format; `None` detects it.
    pub format: Option<PointFormat>,
    pub execution: ExecutionMode,
    pub batch_size: usize,
    pub chunk_size: usize,
}

impl Default for LoadCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadCommand {
    pub fn new() -> Self {
        let defaults = LoadConfig::new(PointFormat::HeaderQualified);
        Self {
            format: None,
            execution: defaults.execution,
            batch_size: defaults.batch_size,
            chunk_size: defaults.chunk_size,
        }
    }

    pub fn with_format(mut self, format: Option<PointFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn with_execution(mut self, mode: ExecutionMode) -> Self {
        self.execution = mode;
        self
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }

    fn config(&self, format: PointFormat) -> LoadConfig {
        LoadConfig::new(format)
            .with_execution(self.execution)
            .with_batch_size(self.batch_size)
            .with_chunk_size(self.chunk_size)
    }

    /// Load a file, or stdin when `input` is `None` or `-`.
    pub fn load<F>(
        &self,
        input: Option<&Path>,
        on_progress: F,
    ) -> Result<(PointSet, LoadStats), LoadError>
    where
        F: FnMut(LoadProgress),
    {
        let start = Instant::now();
        let points = match input.filter(|p| p.as_os_str() != "-") {
            Some(path) => self.load_file(path, on_progress)?,
            None => self.load_stdin(on_progress)?,
        };
        let stats = LoadStats {
            points: points.len(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        Ok((points, stats))
    }

    fn load_file<F>(&self, path: &Path, on_progress: F) -> Result<PointSet, LoadError>
    where
        F: FnMut(LoadProgress),
    {
        let format = match self.format {
            Some(format) => format,
            None => detect_format(path)?,
        };
        let source = ReaderSource::open(path, self.chunk_size)?;
        PointCloudLoader::new(self.config(format)).load_blocking(source, on_progress)
    }

    fn load_stdin<F>(&self, on_progress: F) -> Result<PointSet, LoadError>
    where
        F: FnMut(LoadProgress),
    {
        let stdin = io::stdin();
        let (format, head) = match self.format {
            Some(format) => (format, Vec::new()),
            None => {
                let mut head = Vec::new();
                io::stdin().take(STDIN_SNIFF_LEN).read_to_end(&mut head)?;
                (PointFormat::sniff(&head), head)
            }
        };
        // Sniffed bytes are replayed ahead of the rest of stdin.
        let reader = Cursor::new(head).chain(stdin);
        let source = ReaderSource::with_capacity(reader, self.chunk_size);
        PointCloudLoader::new(self.config(format)).load_blocking(source, on_progress)
    }
}

/// Write a human-readable summary of `points`.
pub fn write_summary<W: Write>(points: &PointSet, out: &mut W) -> Result<(), LoadError> {
    writeln!(out, "points\t{}", points.len())?;
    if let Some([x, y, z]) = points.centroid() {
        writeln!(out, "centroid\t{} {} {}", x, y, z)?;
    }
    if let Some(bounds) = points.bounds() {
        let [x0, y0, z0] = bounds.min;
        let [x1, y1, z1] = bounds.max;
        writeln!(out, "min\t{} {} {}", x0, y0, z0)?;
        writeln!(out, "max\t{} {} {}", x1, y1, z1)?;
    }
    Ok(())
}

/// Write every point as a headerless `x y z r g b` line.
pub fn write_points<W: Write>(points: &PointSet, out: W) -> Result<(), LoadError> {
    let mut writer = PointWriter::new(out);
    for p in points {
        writer.write_point(p)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;

    #[test]
    fn test_load_file_with_detection() {
        let mut file = tempfile::Builder::new().suffix(".ply").tempfile().unwrap();
        file.write_all(b"ply\nelement vertex 1\nend_header\n1 2 3 4 5 6\n")
            .unwrap();
        file.flush().unwrap();

        let (points, stats) = LoadCommand::new().load(Some(file.path()), |_| {}).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(stats.points, 1);
    }

    #[test]
    fn test_forced_format_overrides_extension() {
        let mut file = tempfile::Builder::new().suffix(".ply").tempfile().unwrap();
        file.write_all(b"1 2 3\n").unwrap();
        file.flush().unwrap();

        let cmd = LoadCommand::new().with_format(Some(PointFormat::Headerless));
        let (points, _) = cmd.load(Some(file.path()), |_| {}).unwrap();
        assert_eq!(points.to_vec(), vec![Point::white(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_write_summary() {
        let points = PointSet::from(vec![
            Point::white(0.0, 0.0, 0.0),
            Point::white(2.0, 4.0, 6.0),
        ]);
        let mut out = Vec::new();
        write_summary(&points, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("points\t2\n"));
        assert!(text.contains("centroid\t1 2 3\n"));
        assert!(text.contains("max\t2 4 6\n"));
    }

    #[test]
    fn test_write_summary_empty() {
        let mut out = Vec::new();
        write_summary(&PointSet::new(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "points\t0\n");
    }

    #[test]
    fn test_write_points() {
        let points = PointSet::from(vec![Point::new(1.5, 2.0, -3.0, 9, 8, 7)]);
        let mut out = Vec::new();
        write_points(&points, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1.5 2 -3 9 8 7\n");
    }
}
