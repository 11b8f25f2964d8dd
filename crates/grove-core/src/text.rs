//! Text model primitives: sizes, ranges, and (line, column) conversions.

pub use text_size::{TextRange, TextSize};

use serde::{Deserialize, Serialize};

/// A 1-based (line, column) pair as reported by the recognizer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("offset {offset} is past the end of the document (length {len})")]
    PastEnd { offset: u32, len: u32 },
}

/// Pre-computed line start offsets for a single source file.
///
/// Lookups in the two directions deliberately differ in strictness:
/// [`PositionIndex::find_offset`] answers `0` for a row outside the document,
/// because recognizers occasionally report positions one line past a node's
/// nominal end, while [`PositionIndex::row_col`] treats an offset past the end
/// of the document as a hard error since it can only come from a broken
/// offset computation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PositionIndex {
    line_starts: Vec<TextSize>,
    text_len: TextSize,
}

impl PositionIndex {
    /// The "null" index used before a file has been measured.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::with_capacity(128);
        line_starts.push(TextSize::from(0));

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_starts.push(TextSize::from((i + 1) as u32));
                    i += 1;
                }
                b'\r' => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        line_starts.push(TextSize::from((i + 2) as u32));
                        i += 2;
                    } else {
                        line_starts.push(TextSize::from((i + 1) as u32));
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        Self {
            line_starts,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    /// Build an index from line lengths, terminators included.
    ///
    /// The final line is the text following the last terminator; pass a
    /// trailing `0` for a file that ends with a newline.
    pub fn from_line_lengths(lengths: &[u32]) -> Self {
        if lengths.is_empty() {
            return Self::empty();
        }
        let mut line_starts = Vec::with_capacity(lengths.len());
        let mut offset = 0u32;
        for len in lengths {
            line_starts.push(TextSize::from(offset));
            offset += len;
        }
        Self {
            line_starts,
            text_len: TextSize::from(offset),
        }
    }

    #[inline]
    pub fn is_populated(&self) -> bool {
        !self.line_starts.is_empty()
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Offset of the first character of the 1-based `row`.
    #[inline]
    pub fn line_start(&self, row: u32) -> Option<TextSize> {
        let idx = row.checked_sub(1)?;
        self.line_starts.get(idx as usize).copied()
    }

    /// Offset of the end of the document.
    #[inline]
    pub fn end(&self) -> TextSize {
        self.text_len
    }

    #[inline]
    pub fn end_line(&self) -> u32 {
        self.line_count().max(1)
    }

    /// Column of the end-of-file position on the last line.
    pub fn end_column(&self) -> u32 {
        match self.line_starts.last() {
            Some(start) => u32::from(self.text_len - *start) + 1,
            None => 1,
        }
    }

    /// Convert a 1-based (row, col) pair into a 0-based offset.
    ///
    /// Returns `0` when `row` lies outside the document.
    pub fn find_offset(&self, row: u32, col: u32) -> TextSize {
        match self.line_start(row) {
            Some(start) => start + TextSize::from(col.saturating_sub(1)),
            None => TextSize::from(0),
        }
    }

    /// Convert a 0-based offset into a 1-based (row, col) pair.
    ///
    /// `offset == end()` is the end-of-file position and belongs to the last
    /// line.
    pub fn row_col(&self, offset: TextSize) -> Result<LineCol, PositionError> {
        if offset > self.text_len || !self.is_populated() {
            return Err(PositionError::PastEnd {
                offset: offset.into(),
                len: self.text_len.into(),
            });
        }

        let mut row = 0usize;
        for (idx, start) in self.line_starts.iter().enumerate() {
            if *start > offset {
                break;
            }
            row = idx;
        }
        let col = offset - self.line_starts[row];
        Ok(LineCol {
            line: row as u32 + 1,
            col: u32::from(col) + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_trailing_newline() {
        let index = PositionIndex::new("a\nbc\n");
        assert_eq!(index.find_offset(1, 1), TextSize::from(0));
        assert_eq!(index.find_offset(2, 1), TextSize::from(2));
        assert_eq!(index.find_offset(3, 1), TextSize::from(5));
        assert_eq!(index.row_col(TextSize::from(5)), Ok(LineCol::new(3, 1)));
    }

    #[test]
    fn line_lengths_match_text_construction() {
        let from_text = PositionIndex::new("a\nbc\n");
        let from_lengths = PositionIndex::from_line_lengths(&[2, 3, 0]);
        assert_eq!(from_text, from_lengths);
    }

    #[test]
    fn out_of_range_row_is_lenient() {
        let index = PositionIndex::new("abc\ndef");
        assert_eq!(index.find_offset(0, 1), TextSize::from(0));
        assert_eq!(index.find_offset(3, 4), TextSize::from(0));
        assert_eq!(index.find_offset(99, 1), TextSize::from(0));
    }

    #[test]
    fn offset_past_end_is_an_error() {
        let index = PositionIndex::new("abc");
        assert_eq!(
            index.row_col(TextSize::from(4)),
            Err(PositionError::PastEnd { offset: 4, len: 3 })
        );
        assert_eq!(index.row_col(TextSize::from(3)), Ok(LineCol::new(1, 4)));
    }

    #[test]
    fn null_index_is_not_populated() {
        let index = PositionIndex::empty();
        assert!(!index.is_populated());
        assert_eq!(index.find_offset(1, 1), TextSize::from(0));
        assert!(index.row_col(TextSize::from(0)).is_err());
        assert!(PositionIndex::new("").is_populated());
    }

    #[test]
    fn carriage_returns_terminate_lines() {
        let index = PositionIndex::new("a\r\nb\rc");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.find_offset(2, 1), TextSize::from(3));
        assert_eq!(index.find_offset(3, 1), TextSize::from(5));
        assert_eq!(index.row_col(TextSize::from(4)), Ok(LineCol::new(2, 2)));
    }

    #[test]
    fn end_position() {
        let index = PositionIndex::new("ab\ncd");
        assert_eq!(index.end(), TextSize::from(5));
        assert_eq!(index.end_line(), 2);
        assert_eq!(index.end_column(), 3);
        assert_eq!(
            index.row_col(index.end()),
            Ok(LineCol::new(index.end_line(), index.end_column()))
        );
    }
}
