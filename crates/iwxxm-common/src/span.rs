//! Source-position spans for decoded report tokens.
//!
//! Every token a decoder matches carries exactly one span. Positions are
//! computed from byte offsets into the whitespace-normalized report text,
//! so semantic actions stay pure functions of (text, position) with no
//! shared lexer cursor.

use serde::Serialize;

/// A line/column position in the report text. Lines are 1-based, columns
/// 0-based, matching the diagnostics emitted alongside partial decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Begin/end positions of one matched token, plus the underlying byte
/// offsets used by the FMH-1 white-out post-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub begin: Position,
    pub end: Position,
    #[serde(skip)]
    pub start_offset: usize,
    #[serde(skip)]
    pub end_offset: usize,
}

impl Span {
    /// Build a span from byte offsets into `input`.
    pub fn from_offsets(input: &str, start: usize, end: usize) -> Self {
        Span {
            begin: position_at(input, start),
            end: position_at(input, end),
            start_offset: start,
            end_offset: end,
        }
    }

    /// Merge two spans into one covering both, keeping the earlier begin
    /// and the later end. Used when a follow-on token (variable wind
    /// direction, directional minimum visibility) extends an entry.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            begin: self.begin,
            end: other.end,
            start_offset: self.start_offset.min(other.start_offset),
            end_offset: self.end_offset.max(other.end_offset),
        }
    }
}

fn position_at(input: &str, offset: usize) -> Position {
    let before = &input[..offset.min(input.len())];
    let line = before.bytes().filter(|b| *b == b'\n').count() as u32 + 1;
    let column = match before.rfind('\n') {
        Some(nl) => (offset - nl - 1) as u32,
        None => offset as u32,
    };
    Position { line, column }
}
