//! Row/column positions derived from byte offsets.
//!
//! Positions are zero-based, with the column counted in bytes, matching
//! Tree-sitter points. For user-facing messages, [`Position::to_one_based`]
//! converts to one-based line and column numbers.

use std::fmt;

/// A zero-based row and byte column within a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Zero-based line number.
    pub row: usize,
    /// Zero-based byte offset within the line.
    pub column: usize,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Converts to one-based display coordinates.
    #[must_use]
    pub fn to_one_based(self) -> (u32, u32) {
        // Line/column numbers will realistically never exceed u32::MAX.
        let line = u32::try_from(self.row.saturating_add(1)).unwrap_or(u32::MAX);
        let column = u32::try_from(self.column.saturating_add(1)).unwrap_or(u32::MAX);
        (line, column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

impl From<tree_sitter::Point> for Position {
    fn from(point: tree_sitter::Point) -> Self {
        Self::new(point.row, point.column)
    }
}

impl From<Position> for tree_sitter::Point {
    fn from(position: Position) -> Self {
        Self::new(position.row, position.column)
    }
}

/// Line start offsets for converting byte offsets into positions.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|(_, byte)| *byte == b'\n')
                    .map(|(offset, _)| offset.saturating_add(1)),
            )
            .collect();
        Self { line_starts }
    }

    /// Returns the position of `offset`.
    ///
    /// Offsets past the end of the text clamp to the last line.
    pub(crate) fn position(&self, offset: usize) -> Position {
        let row = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts.get(row).copied().unwrap_or_default();
        Position::new(row, offset.saturating_sub(line_start))
    }
}

/// Computes the position reached after writing `text` from `start`.
pub(crate) fn advance(start: Position, text: &str) -> Position {
    match text.rfind('\n') {
        Some(last_newline) => Position::new(
            start.row.saturating_add(text.matches('\n').count()),
            text.len().saturating_sub(last_newline.saturating_add(1)),
        ),
        None => Position::new(start.row, start.column.saturating_add(text.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Position::new(0, 0))]
    #[case(3, Position::new(0, 3))]
    #[case(4, Position::new(1, 0))]
    #[case(6, Position::new(1, 2))]
    #[case(8, Position::new(2, 0))]
    fn line_index_maps_offsets(#[case] offset: usize, #[case] expected: Position) {
        let index = LineIndex::new("abc\nxyz\n");
        assert_eq!(index.position(offset), expected);
    }

    #[rstest]
    #[case(Position::new(0, 2), "ab", Position::new(0, 4))]
    #[case(Position::new(1, 2), "a\nbc", Position::new(2, 2))]
    #[case(Position::new(3, 7), "", Position::new(3, 7))]
    fn advance_tracks_newlines(
        #[case] start: Position,
        #[case] text: &str,
        #[case] expected: Position,
    ) {
        assert_eq!(advance(start, text), expected);
    }

    #[test]
    fn to_one_based_adds_one_to_each_axis() {
        assert_eq!(Position::new(0, 4).to_one_based(), (1, 5));
    }
}
