//! Byte sources feeding a load.
//!
//! A source hands out the stream one chunk at a time, in order, and
//! reports its total length when it knows it. Sources backed by blocking
//! I/O (files, stdin) complete every request immediately; a network
//! collaborator implements the trait with a real await inside.

use crate::error::LoadError;
use crate::streaming::buffers::DEFAULT_CHUNK_SIZE;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// An incrementally available byte stream.
#[allow(async_fn_in_trait)]
pub trait ByteSource {
    /// The next chunk, or `None` at end of stream. Chunks may be any
    /// non-empty size.
    async fn next_chunk(&mut self) -> io::Result<Option<&[u8]>>;

    /// Total stream length in bytes, if known.
    fn total_len(&self) -> Option<u64> {
        None
    }
}

/// Adapter reading fixed-size chunks from any [`Read`].
#[derive(Debug)]
pub struct ReaderSource<R: Read> {
    reader: R,
    buf: Vec<u8>,
    total_len: Option<u64>,
}

impl ReaderSource<File> {
    /// Open a file; its size becomes the total length.
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self, LoadError> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        Ok(Self::with_capacity(file, chunk_size).with_total_len(len))
    }
}

impl<R: Read> ReaderSource<R> {
    /// Create a source with the default chunk size and unknown length.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Create a source reading up to `chunk_size` bytes per chunk.
    pub fn with_capacity(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0; chunk_size.max(1)],
            total_len: None,
        }
    }

    /// Declare the total length of the stream.
    pub fn with_total_len(mut self, len: u64) -> Self {
        self.total_len = Some(len);
        self
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    async fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(&self.buf[..n])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn total_len(&self) -> Option<u64> {
        self.total_len
    }
}

/// In-memory source serving owned bytes in fixed-size chunks.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: usize,
    chunk_size: usize,
    report_len: bool,
}

impl MemorySource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            report_len: true,
        }
    }

    /// Serve at most `n` bytes per chunk.
    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }

    /// Hide the total length, as a stream without a length header would.
    pub fn without_total_len(mut self) -> Self {
        self.report_len = false;
        self
    }
}

impl ByteSource for MemorySource {
    async fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let start = self.pos;
        let end = (start + self.chunk_size).min(self.data.len());
        self.pos = end;
        Ok(Some(&self.data[start..end]))
    }

    fn total_len(&self) -> Option<u64> {
        self.report_len.then_some(self.data.len() as u64)
    }
}
