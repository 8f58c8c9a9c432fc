//! The mutable text buffer behind a syntax tree.
//!
//! [`Document`] validates every edit range before touching the buffer and
//! reports each change as a [`TextEdit`], which parse backends use as an
//! incremental reparse hint.

use std::fmt;
use std::ops::Range;

use crate::error::SyntaxError;
use crate::position::{LineIndex, Position, advance};

/// Description of one splice in byte and row/column coordinates.
///
/// Mirrors Tree-sitter's `InputEdit`: `start..old_end` in the old text was
/// replaced by `start..new_end` in the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    /// First byte of the edit.
    pub start_byte: usize,
    /// End of the replaced bytes in the old text.
    pub old_end_byte: usize,
    /// End of the inserted bytes in the new text.
    pub new_end_byte: usize,
    /// Position of `start_byte`.
    pub start_position: Position,
    /// Position of `old_end_byte` in the old text.
    pub old_end_position: Position,
    /// Position of `new_end_byte` in the new text.
    pub new_end_position: Position,
}

impl TextEdit {
    /// Builds the edit that turns `text[range]` into `replacement`.
    fn splice(text: &str, range: &Range<usize>, replacement: &str) -> Self {
        let lines = LineIndex::new(text);
        let start_position = lines.position(range.start);
        Self {
            start_byte: range.start,
            old_end_byte: range.end,
            new_end_byte: range.start.saturating_add(replacement.len()),
            start_position,
            old_end_position: lines.position(range.end),
            new_end_position: advance(start_position, replacement),
        }
    }

    /// Derives the smallest edit turning `old` into `new`.
    ///
    /// The common prefix and suffix are left untouched, and both ends land on
    /// UTF-8 character boundaries.
    #[must_use]
    pub fn between(old: &str, new: &str) -> Self {
        let mut prefix = old
            .bytes()
            .zip(new.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        while !old.is_char_boundary(prefix) || !new.is_char_boundary(prefix) {
            prefix = prefix.saturating_sub(1);
        }

        let max_suffix = old.len().min(new.len()).saturating_sub(prefix);
        let mut suffix = old
            .bytes()
            .rev()
            .zip(new.bytes().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        while !old.is_char_boundary(old.len().saturating_sub(suffix))
            || !new.is_char_boundary(new.len().saturating_sub(suffix))
        {
            suffix = suffix.saturating_sub(1);
        }

        let old_end = old.len().saturating_sub(suffix);
        let new_end = new.len().saturating_sub(suffix);
        let inserted = new.get(prefix..new_end).unwrap_or_default();
        Self::splice(old, &(prefix..old_end), inserted)
    }

    /// Returns the number of bytes removed from the old text.
    #[must_use]
    pub const fn deleted_len(&self) -> usize {
        self.old_end_byte.saturating_sub(self.start_byte)
    }

    /// Returns the number of bytes inserted into the new text.
    #[must_use]
    pub const fn inserted_len(&self) -> usize {
        self.new_end_byte.saturating_sub(self.start_byte)
    }
}

impl From<&TextEdit> for tree_sitter::InputEdit {
    fn from(edit: &TextEdit) -> Self {
        Self {
            start_byte: edit.start_byte,
            old_end_byte: edit.old_end_byte,
            new_end_byte: edit.new_end_byte,
            start_position: edit.start_position.into(),
            old_end_position: edit.old_end_position.into(),
            new_end_position: edit.new_end_position.into(),
        }
    }
}

/// Source text owned by a syntax tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    /// Creates a document holding `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the whole text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns whether the document is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the text in `range`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::OutOfBounds`] or
    /// [`SyntaxError::NotCharBoundary`] when `range` is not a valid slice of
    /// the document.
    pub fn slice(&self, range: Range<usize>) -> Result<&str, SyntaxError> {
        self.check_range(&range)?;
        self.text
            .get(range.clone())
            .ok_or_else(|| SyntaxError::out_of_bounds(range.start, range.end, self.len()))
    }

    /// Validates that `range` can be spliced.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::OutOfBounds`] when `start > end` or
    /// `end > len`, and [`SyntaxError::NotCharBoundary`] when either end
    /// splits a character.
    pub fn check_range(&self, range: &Range<usize>) -> Result<(), SyntaxError> {
        if range.start > range.end || range.end > self.len() {
            return Err(SyntaxError::out_of_bounds(
                range.start,
                range.end,
                self.len(),
            ));
        }
        for offset in [range.start, range.end] {
            if !self.text.is_char_boundary(offset) {
                return Err(SyntaxError::not_char_boundary(offset));
            }
        }
        Ok(())
    }

    /// Replaces the bytes in `range` with `replacement`.
    ///
    /// The document is left unchanged when the range is rejected.
    ///
    /// # Errors
    ///
    /// See [`Document::check_range`].
    pub fn replace(
        &mut self,
        range: Range<usize>,
        replacement: &str,
    ) -> Result<TextEdit, SyntaxError> {
        self.check_range(&range)?;
        let edit = TextEdit::splice(&self.text, &range, replacement);
        let expected_len = self
            .len()
            .saturating_sub(edit.deleted_len())
            .saturating_add(replacement.len());

        self.text.replace_range(range, replacement);

        debug_assert_eq!(self.len(), expected_len);
        Ok(edit)
    }

    /// Removes the bytes in `range`.
    ///
    /// # Errors
    ///
    /// See [`Document::check_range`].
    pub fn delete(&mut self, range: Range<usize>) -> Result<TextEdit, SyntaxError> {
        self.replace(range, "")
    }
}

impl AsRef<str> for Document {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq<str> for Document {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Document {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn replace_splices_text_and_reports_edit() {
        let mut document = Document::new("1 + x * 3 + 2\n");
        let edit = document.replace(4..9, "x").expect("in bounds");

        assert_eq!(document, "1 + x + 2\n");
        assert_eq!(edit.start_byte, 4);
        assert_eq!(edit.old_end_byte, 9);
        assert_eq!(edit.new_end_byte, 5);
        assert_eq!(edit.new_end_position, Position::new(0, 5));
    }

    #[test]
    fn delete_keeps_surrounding_whitespace() {
        let mut document = Document::new("1 + x * 3 + 2\n");
        document.delete(4..9).expect("in bounds");
        assert_eq!(document, "1 +  + 2\n");
    }

    #[rstest]
    #[case(3..2)]
    #[case(0..20)]
    #[case(15..15)]
    fn out_of_range_edits_leave_document_unchanged(#[case] range: Range<usize>) {
        let mut document = Document::new("1 + 2\n");
        let err = document.replace(range, "9").expect_err("rejected");
        assert!(matches!(err, SyntaxError::OutOfBounds { .. }));
        assert_eq!(document, "1 + 2\n");
    }

    #[test]
    fn split_characters_are_rejected() {
        let mut document = Document::new("é");
        let err = document.replace(1..2, "e").expect_err("rejected");
        assert_eq!(err, SyntaxError::not_char_boundary(1));
    }

    #[test]
    fn edit_spanning_lines_tracks_positions() {
        let mut document = Document::new("a\nbc\nd");
        let edit = document.replace(1..5, "\n\nxy").expect("in bounds");

        assert_eq!(document, "a\n\nxyd");
        assert_eq!(edit.start_position, Position::new(0, 1));
        assert_eq!(edit.old_end_position, Position::new(2, 0));
        assert_eq!(edit.new_end_position, Position::new(2, 2));
    }

    #[rstest]
    #[case("1 + 2", "1 + 2", 5, 5, 5)]
    #[case("1 + x * 3 + 2", "1 + 2", 4, 12, 4)]
    #[case("1 + 2", "1 + 42", 4, 4, 5)]
    #[case("abc", "xyz", 0, 3, 3)]
    fn between_finds_minimal_edit(
        #[case] old: &str,
        #[case] new: &str,
        #[case] start: usize,
        #[case] old_end: usize,
        #[case] new_end: usize,
    ) {
        let edit = TextEdit::between(old, new);
        assert_eq!(
            (edit.start_byte, edit.old_end_byte, edit.new_end_byte),
            (start, old_end, new_end)
        );
    }
}
