//! Source locations.
//!
//! Offsets count characters (Unicode scalar values), the unit the scanner
//! advances in. [`byte_offset`] converts for consumers that index UTF-8.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Character offset into a source text.
pub type TextPos = u32;

/// A start offset plus a length, both in characters.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: TextPos,
    pub length: TextPos,
}

impl TextSpan {
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    /// Span between two offsets. An `end` before `start` gives an empty span.
    #[inline]
    pub fn from_bounds(start: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= start);
        Self::new(start, end.saturating_sub(start))
    }

    /// Zero-length span at `pos`.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self::new(pos, 0)
    }

    /// Exclusive end offset.
    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `pos` falls inside `[start, end)`.
    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        (self.start..self.end()).contains(&pos)
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// Zero-based line and character column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct LineAndColumn {
    pub line: u32,
    pub character: u32,
}

impl LineAndColumn {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Offsets of every line start, for converting between offsets and
/// line/column pairs.
#[derive(Debug, Clone)]
pub struct LineMap {
    starts: Vec<TextPos>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(
                text.chars()
                    .enumerate()
                    .filter(|&(_, ch)| ch == '\n')
                    .map(|(i, _)| i as TextPos + 1),
            )
            .collect();
        Self { starts }
    }

    /// Zero-based line holding `pos`. A newline belongs to the line it ends.
    pub fn line_of(&self, pos: TextPos) -> u32 {
        let after = self.starts.partition_point(|&start| start <= pos);
        after.saturating_sub(1) as u32
    }

    pub fn line_and_column_of(&self, pos: TextPos) -> LineAndColumn {
        let line = self.line_of(pos);
        LineAndColumn::new(line, pos - self.starts[line as usize])
    }

    /// Offset of a line/column pair. Lines past the end clamp to the last.
    pub fn offset_of(&self, position: LineAndColumn) -> TextPos {
        let last = self.starts.len() - 1;
        self.starts[(position.line as usize).min(last)] + position.character
    }
}

/// UTF-8 byte index of character offset `pos` in `text`; `text.len()` when
/// `pos` is at or past the end.
pub fn byte_offset(text: &str, pos: TextPos) -> usize {
    text.char_indices()
        .nth(pos as usize)
        .map_or(text.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bounds() {
        let span = TextSpan::from_bounds(5, 15);
        assert_eq!(span, TextSpan::new(5, 10));
        assert_eq!(span.end(), 15);
        assert!(span.contains(5));
        assert!(span.contains(14));
        assert!(!span.contains(15));
        assert!(TextSpan::empty(3).is_empty());
    }

    #[test]
    fn test_line_map() {
        let map = LineMap::new("MAIN\n  LET x = 1\nEND MAIN");
        assert_eq!(map.line_of(0), 0);
        assert_eq!(map.line_of(4), 0);
        assert_eq!(map.line_of(5), 1);
        assert_eq!(map.line_of(17), 2);

        let at = map.line_and_column_of(11);
        assert_eq!(at, LineAndColumn::new(1, 6));
        assert_eq!(map.offset_of(at), 11);
        assert_eq!(map.offset_of(LineAndColumn::new(9, 0)), 17);
    }

    #[test]
    fn test_byte_offset_with_multibyte_chars() {
        let text = "LET é = 1";
        assert_eq!(byte_offset(text, 4), 4);
        assert_eq!(byte_offset(text, 5), 6);
        assert_eq!(byte_offset(text, 100), text.len());
    }
}
