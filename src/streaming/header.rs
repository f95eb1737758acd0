//! Header recognition for header-qualified (PLY-style) vertex lists.
//!
//! A header is a run of text lines ending in `end_header`. The only
//! line that carries information for the loader is the vertex element
//! declaration `element vertex <count>`; every other header line
//! (`ply`, `format`, `property`, `comment`, other elements) is ignored.

use crate::streaming::parsing::FieldScanner;

/// Header terminator line.
pub const HEADER_TERMINATOR: &[u8] = b"end_header";

/// Classification of a single header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLine {
    /// `element vertex <n>`
    VertexDeclaration(u64),
    /// `end_header`
    Terminator,
    Other,
}

/// How many body records the loader expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTarget {
    /// The header declared a positive vertex count.
    Declared(u64),
    /// No usable count: the body is decoded until the stream ends.
    Unknown,
}

impl RecordTarget {
    /// Target derived from the last header declaration. A missing or zero
    /// declaration leaves the count unknown.
    pub fn from_declaration(declared: Option<u64>) -> Self {
        match declared {
            Some(n) if n > 0 => RecordTarget::Declared(n),
            _ => RecordTarget::Unknown,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            RecordTarget::Declared(n) => Some(*n),
            RecordTarget::Unknown => None,
        }
    }
}

/// Phase of a single load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    /// Reading header lines; the last vertex declaration seen so far.
    ScanningHeader { declared_count: Option<u64> },
    /// Decoding body records.
    ParsingBody { target: RecordTarget, decoded: u64 },
    /// The target count was reached or the stream ended in the body.
    Done,
    /// The stream ended before the header terminator.
    Failed(String),
}

impl ParserState {
    /// Initial state for a header-qualified stream.
    pub fn header() -> Self {
        ParserState::ScanningHeader {
            declared_count: None,
        }
    }

    /// Initial state for a headerless stream.
    pub fn headerless() -> Self {
        ParserState::ParsingBody {
            target: RecordTarget::Unknown,
            decoded: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ParserState::Done | ParserState::Failed(_))
    }
}

/// Classify one header line. Surrounding whitespace is ignored.
pub fn classify_header_line(line: &[u8]) -> HeaderLine {
    let mut fields = FieldScanner::whitespace(line);
    match fields.next() {
        Some(HEADER_TERMINATOR) if fields.next().is_none() => HeaderLine::Terminator,
        Some(b"element") => match (fields.next(), fields.next(), fields.next()) {
            (Some(b"vertex"), Some(count), None) => parse_count(count)
                .map(HeaderLine::VertexDeclaration)
                .unwrap_or(HeaderLine::Other),
            _ => HeaderLine::Other,
        },
        _ => HeaderLine::Other,
    }
}

#[inline]
fn parse_count(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}
