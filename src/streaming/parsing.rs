//! Zero-allocation point record parsing.
//!
//! Fields are located by scanning for delimiter offsets with memchr and
//! decoding each bounded slice in place. No line is ever split into an
//! intermediate list of field strings.

use crate::point::Point;
use memchr::{memchr2, memchr3};

/// Shortest line that can hold six fields (`"0 0 0 0 0 0"`).
pub const MIN_VERTEX_LINE_LEN: usize = 11;

/// Delimiters between fields of a header-qualified vertex line.
const VERTEX_DELIMS: (u8, u8) = (b' ', b'\t');

/// Delimiters between fields of a headerless line.
const XYZ_DELIMS: (u8, u8, u8) = (b' ', b'\t', b',');

/// Iterator over the fields of one line.
///
/// Each step finds the next delimiter offset and yields the bytes in
/// between. Runs of delimiters count as one; leading and trailing
/// delimiters produce no empty fields.
pub struct FieldScanner<'a> {
    line: &'a [u8],
    pos: usize,
    delims: Delims,
}

#[derive(Clone, Copy)]
enum Delims {
    Two(u8, u8),
    Three(u8, u8, u8),
}

impl Delims {
    #[inline(always)]
    fn is_delim(self, b: u8) -> bool {
        match self {
            Delims::Two(a, c) => b == a || b == c,
            Delims::Three(a, c, d) => b == a || b == c || b == d,
        }
    }

    #[inline(always)]
    fn find(self, haystack: &[u8]) -> Option<usize> {
        match self {
            Delims::Two(a, c) => memchr2(a, c, haystack),
            Delims::Three(a, c, d) => memchr3(a, c, d, haystack),
        }
    }
}

impl<'a> FieldScanner<'a> {
    /// Scanner splitting on spaces and tabs.
    #[inline]
    pub fn whitespace(line: &'a [u8]) -> Self {
        Self {
            line,
            pos: 0,
            delims: Delims::Two(VERTEX_DELIMS.0, VERTEX_DELIMS.1),
        }
    }

    /// Scanner splitting on spaces, tabs and commas.
    #[inline]
    pub fn delimited(line: &'a [u8]) -> Self {
        Self {
            line,
            pos: 0,
            delims: Delims::Three(XYZ_DELIMS.0, XYZ_DELIMS.1, XYZ_DELIMS.2),
        }
    }
}

impl<'a> Iterator for FieldScanner<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<&'a [u8]> {
        let line = self.line;
        while self.pos < line.len() && self.delims.is_delim(line[self.pos]) {
            self.pos += 1;
        }
        if self.pos >= line.len() {
            return None;
        }
        let start = self.pos;
        let end = self
            .delims
            .find(&line[start..])
            .map_or(line.len(), |off| start + off);
        self.pos = end;
        Some(&line[start..end])
    }
}

/// Parse a coordinate field. Non-finite values are rejected.
#[inline(always)]
pub fn parse_coord(bytes: &[u8]) -> Option<f64> {
    let v: f64 = lexical_core::parse(bytes).ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

/// Fast color channel parsing - no allocation, no error formatting.
///
/// Accepts leading digits with an optional fractional part, which is
/// truncated. Values above 255 saturate. Returns None for empty input,
/// a sign, or any other non-digit byte.
#[inline(always)]
pub fn parse_color(bytes: &[u8]) -> Option<u8> {
    let mut n: u32 = 0;
    let mut digits = 0usize;
    let mut iter = bytes.iter();
    for &b in iter.by_ref() {
        if b == b'.' {
            break;
        }
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.saturating_mul(10).saturating_add(d as u32);
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    if !iter.all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(n.min(255) as u8)
}

/// Parse a header-qualified vertex line: `x y z r g b`.
///
/// Returns None for lines that are too short, carry fewer than six
/// fields, or hold any field that does not parse. Fields after the sixth
/// are ignored.
#[inline]
pub fn parse_vertex_line(line: &[u8]) -> Option<Point> {
    if line.len() < MIN_VERTEX_LINE_LEN {
        return None;
    }
    let mut fields = FieldScanner::whitespace(line);
    let x = parse_coord(fields.next()?)?;
    let y = parse_coord(fields.next()?)?;
    let z = parse_coord(fields.next()?)?;
    let r = parse_color(fields.next()?)?;
    let g = parse_color(fields.next()?)?;
    let b = parse_color(fields.next()?)?;
    Some(Point::new(x, y, z, r, g, b))
}

/// Parse a headerless line: `x y z` or `x y z r g b`.
///
/// Position fields are required. With six or more fields each color
/// channel falls back to 255 on its own when it does not parse; with
/// fewer, the point is white.
#[inline]
pub fn parse_xyz_line(line: &[u8]) -> Option<Point> {
    if should_skip_line(line) {
        return None;
    }
    let mut fields = FieldScanner::delimited(line);
    let x = parse_coord(fields.next()?)?;
    let y = parse_coord(fields.next()?)?;
    let z = parse_coord(fields.next()?)?;

    let (r, g, b) = match (fields.next(), fields.next(), fields.next()) {
        (Some(r), Some(g), Some(b)) => (
            parse_color(r).unwrap_or(255),
            parse_color(g).unwrap_or(255),
            parse_color(b).unwrap_or(255),
        ),
        _ => Point::WHITE_RGB,
    };
    Some(Point::new(x, y, z, r, g, b))
}

/// Check if a headerless line should be skipped (empty or comment).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let line = &line[start..];
    line.is_empty() || line[0] == b'#' || line.starts_with(b"//")
}

/// Strip a trailing carriage return left by CRLF line endings.
#[inline(always)]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}
