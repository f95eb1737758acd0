//! Efficient point output formatting.
//!
//! Uses itoa for color channels and ryu for coordinates to avoid
//! allocation in the hot path.

use crate::error::LoadError;
use crate::point::Point;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use std::io::{BufWriter, Write};

/// High-performance ASCII point writer.
pub struct PointWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> PointWriter<W> {
    /// Create a new PointWriter with the default 2 MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new PointWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write an ASCII PLY header declaring `count` colored vertices.
    pub fn write_ply_header(&mut self, count: u64) -> Result<(), LoadError> {
        self.writer.write_all(b"ply\nformat ascii 1.0\nelement vertex ")?;
        self.write_int(count)?;
        self.writer.write_all(
            b"\nproperty float x\nproperty float y\nproperty float z\n\
              property uchar red\nproperty uchar green\nproperty uchar blue\n\
              end_header\n",
        )?;
        Ok(())
    }

    /// Write `x y z r g b` followed by newline.
    #[inline]
    pub fn write_point(&mut self, p: &Point) -> Result<(), LoadError> {
        self.write_position(p)?;
        for c in [p.r, p.g, p.b] {
            self.writer.write_all(b" ")?;
            self.write_int(c)?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write `x y z` followed by newline.
    #[inline]
    pub fn write_position_line(&mut self, p: &Point) -> Result<(), LoadError> {
        self.write_position(p)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_position(&mut self, p: &Point) -> Result<(), LoadError> {
        self.write_float(p.x)?;
        self.writer.write_all(b" ")?;
        self.write_float(p.y)?;
        self.writer.write_all(b" ")?;
        self.write_float(p.z)?;
        Ok(())
    }

    /// Write an integer using itoa.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<(), LoadError> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Write a coordinate using ryu. Integral values are written without
    /// a fractional part.
    #[inline]
    pub fn write_float(&mut self, v: f64) -> Result<(), LoadError> {
        let s = self.ryu_buf.format(v);
        let s = s.strip_suffix(".0").unwrap_or(s);
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), LoadError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written<F: FnOnce(&mut PointWriter<&mut Vec<u8>>)>(f: F) -> String {
        let mut out = Vec::new();
        {
            let mut writer = PointWriter::new(&mut out);
            f(&mut writer);
            writer.flush().unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_write_point() {
        let text = written(|w| {
            w.write_point(&Point::new(1.0, -2.5, 0.125, 255, 0, 7)).unwrap();
        });
        assert_eq!(text, "1 -2.5 0.125 255 0 7\n");
    }

    #[test]
    fn test_write_position_line() {
        let text = written(|w| {
            w.write_position_line(&Point::white(3.0, 4.0, 5.5)).unwrap();
        });
        assert_eq!(text, "3 4 5.5\n");
    }

    #[test]
    fn test_write_ply_header() {
        let text = written(|w| w.write_ply_header(3).unwrap());
        assert!(text.starts_with("ply\nformat ascii 1.0\nelement vertex 3\n"));
        assert!(text.ends_with("property uchar blue\nend_header\n"));
    }
}
