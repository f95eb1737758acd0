//! Line-by-line record decoder shared by every execution mode.
//!
//! The decoder owns the [`ParserState`] of a load. Lines go in one at a
//! time; decoded points are appended to the caller's [`PointSet`].

use crate::config::PointFormat;
use crate::error::LoadError;
use crate::point::PointSet;
use crate::streaming::header::{classify_header_line, HeaderLine, ParserState, RecordTarget};
use crate::streaming::parsing::{parse_vertex_line, parse_xyz_line, trim_line_end};

/// Whether the decoder wants more lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The declared record count has been reached.
    Done,
}

/// Counters kept while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub header_lines: u64,
    pub body_lines: u64,
    pub decoded: u64,
    /// Body lines that yielded no point.
    pub skipped: u64,
}

/// Decodes assembled lines according to a [`PointFormat`].
#[derive(Debug)]
pub struct RecordDecoder {
    format: PointFormat,
    state: ParserState,
    target: Option<RecordTarget>,
    stats: DecodeStats,
}

impl RecordDecoder {
    pub fn new(format: PointFormat) -> Self {
        let state = match format {
            PointFormat::HeaderQualified => ParserState::header(),
            PointFormat::Headerless => ParserState::headerless(),
        };
        let target = match state {
            ParserState::ParsingBody { target, .. } => Some(target),
            _ => None,
        };
        Self {
            format,
            state,
            target,
            stats: DecodeStats::default(),
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Records decoded so far.
    pub fn decoded(&self) -> u64 {
        self.stats.decoded
    }

    /// Decode one line (with or without a trailing `\r`).
    pub fn decode_line(&mut self, line: &[u8], points: &mut PointSet) -> Flow {
        let line = trim_line_end(line);
        match &mut self.state {
            ParserState::ScanningHeader { declared_count } => {
                self.stats.header_lines += 1;
                match classify_header_line(line) {
                    HeaderLine::VertexDeclaration(n) => {
                        // Later declarations replace earlier ones.
                        *declared_count = Some(n);
                    }
                    HeaderLine::Terminator => {
                        let target = RecordTarget::from_declaration(*declared_count);
                        match target {
                            RecordTarget::Declared(n) => {
                                log::debug!(
                                    "header complete after {} lines, {} vertices declared",
                                    self.stats.header_lines,
                                    n
                                );
                            }
                            RecordTarget::Unknown => {
                                log::warn!(
                                    "header declares no vertex count, decoding until end of stream"
                                );
                            }
                        }
                        self.target = Some(target);
                        self.state = ParserState::ParsingBody { target, decoded: 0 };
                    }
                    HeaderLine::Other => {}
                }
                Flow::Continue
            }
            ParserState::ParsingBody { target, decoded } => {
                self.stats.body_lines += 1;
                let point = match self.format {
                    PointFormat::HeaderQualified => parse_vertex_line(line),
                    PointFormat::Headerless => parse_xyz_line(line),
                };
                match point {
                    Some(p) => {
                        points.push(p);
                        *decoded += 1;
                        self.stats.decoded += 1;
                    }
                    None => self.stats.skipped += 1,
                }
                if *target == RecordTarget::Declared(*decoded) {
                    self.state = ParserState::Done;
                    return Flow::Done;
                }
                Flow::Continue
            }
            ParserState::Done | ParserState::Failed(_) => Flow::Done,
        }
    }

    /// Settle the state once the stream has ended.
    pub fn finish(&mut self) -> Result<(), LoadError> {
        match &self.state {
            ParserState::ScanningHeader { .. } => {
                let reason = format!(
                    "stream ended after {} header lines without `end_header`",
                    self.stats.header_lines
                );
                self.state = ParserState::Failed(reason.clone());
                Err(LoadError::MalformedHeader(reason))
            }
            ParserState::ParsingBody { .. } => {
                self.state = ParserState::Done;
                Ok(())
            }
            ParserState::Done => Ok(()),
            ParserState::Failed(reason) => Err(LoadError::MalformedHeader(reason.clone())),
        }
    }

    /// Expected record total, once the body has been reached.
    pub fn target(&self) -> Option<RecordTarget> {
        self.target
    }
}
