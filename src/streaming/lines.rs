//! Incremental line reassembly over arriving chunks.
//!
//! Lines that lie entirely inside a chunk are handed out as borrowed
//! slices of that chunk. Only a line that spans a chunk boundary is
//! copied into the assembler's carry buffer.

use crate::streaming::buffers::DEFAULT_LINE_BUFFER;
use memchr::memchr;

/// Splits a chunked byte stream on `\n`.
///
/// Holds at most one partial line between calls. Concatenating every
/// line returned (with `\n` reinserted) and the flushed tail reproduces
/// the fed bytes exactly; `\r` is left in place.
#[derive(Debug)]
pub struct LineAssembler {
    carry: Vec<u8>,
    /// The carry buffer holds a line already handed out.
    stale: bool,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            carry: Vec::with_capacity(DEFAULT_LINE_BUFFER),
            stale: false,
        }
    }

    /// Feed one chunk, returning a cursor over the lines it completes.
    ///
    /// The cursor must be drained to `None` for the chunk's unterminated
    /// tail to be carried forward.
    pub fn feed<'a>(&'a mut self, chunk: &'a [u8]) -> Lines<'a> {
        Lines {
            assembler: self,
            chunk,
            pos: 0,
            done: false,
        }
    }

    /// Return the final unterminated line, if any bytes are buffered.
    pub fn flush(&mut self) -> Option<&[u8]> {
        self.clear_stale();
        if self.carry.is_empty() {
            return None;
        }
        self.stale = true;
        Some(&self.carry)
    }

    /// Number of bytes currently buffered for an incomplete line.
    pub fn pending_len(&self) -> usize {
        if self.stale {
            0
        } else {
            self.carry.len()
        }
    }

    #[inline]
    fn clear_stale(&mut self) {
        if self.stale {
            self.carry.clear();
            self.stale = false;
        }
    }
}

/// Lending cursor over the complete lines of one chunk.
pub struct Lines<'a> {
    assembler: &'a mut LineAssembler,
    chunk: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Lines<'a> {
    /// Next complete line, without its `\n`.
    pub fn next_line(&mut self) -> Option<&[u8]> {
        if self.done {
            return None;
        }
        self.assembler.clear_stale();

        let chunk = self.chunk;
        let rest = &chunk[self.pos..];
        match memchr(b'\n', rest) {
            Some(nl) => {
                let start = self.pos;
                self.pos += nl + 1;
                if self.assembler.carry.is_empty() {
                    Some(&chunk[start..start + nl])
                } else {
                    self.assembler.carry.extend_from_slice(&rest[..nl]);
                    self.assembler.stale = true;
                    Some(&self.assembler.carry)
                }
            }
            None => {
                self.assembler.carry.extend_from_slice(rest);
                self.pos = chunk.len();
                self.done = true;
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn collect_lines<'c, I>(chunks: I) -> Vec<Vec<u8>>
where
    I: IntoIterator<Item = &'c [u8]>,
{
    let mut assembler = LineAssembler::new();
    let mut out = Vec::new();
    for chunk in chunks {
        let mut lines = assembler.feed(chunk);
        while let Some(line) = lines.next_line() {
            out.push(line.to_vec());
        }
    }
    if let Some(tail) = assembler.flush() {
        out.push(tail.to_vec());
    }
    out
}
