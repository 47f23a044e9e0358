//! Position conversions between the three coordinate systems at play
//!
//! LSP positions are 0-based lines with UTF-16 column units; the backends
//! speak 1-based lines with UTF-8 byte columns; edits are computed against
//! absolute byte offsets. All conversions go through a per-document
//! `LineIndex` so multi-byte characters are handled once, in one place.

use tower_lsp::lsp_types::Position;

/// A table of line-start byte offsets over one document's text, supporting
/// conversions between LSP positions, backend coordinates, and byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts; line 0 starts at 0
    line_starts: Vec<usize>,
    /// Total length of the text in bytes
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Byte range of the given line, excluding its trailing newline
    fn line_span(&self, line: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(next_start) => next_start - 1,
            None => self.len,
        };
        Some((start, end))
    }

    /// Convert an LSP position (UTF-16 column) to a byte offset.
    ///
    /// Returns `None` when the position does not exist in the text.
    pub fn offset(&self, text: &str, position: Position) -> Option<usize> {
        let (start, end) = self.line_span(position.line as usize)?;
        let line = &text[start..end];

        let target = position.character as usize;
        let mut utf16_count = 0;
        for (byte_idx, ch) in line.char_indices() {
            if utf16_count == target {
                return Some(start + byte_idx);
            }
            if utf16_count > target {
                // Position falls inside a surrogate pair
                return None;
            }
            utf16_count += ch.len_utf16();
        }

        if utf16_count == target {
            // Position at end of line
            return Some(end);
        }
        None
    }

    /// Convert a byte offset to an LSP position (UTF-16 column)
    pub fn position_for_offset(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insertion) => insertion - 1,
        };
        let start = self.line_starts[line];
        let utf16_count: usize = text[start..offset].chars().map(char::len_utf16).sum();
        Position {
            line: line as u32,
            character: utf16_count as u32,
        }
    }

    /// Convert a backend coordinate (1-based line, 1-based UTF-8 column) to
    /// an LSP position. Returns `None` when the coordinate cannot be located
    /// in the text or does not fall on a character boundary.
    pub fn position_from_utf8(&self, text: &str, line: u32, utf8_column: u32) -> Option<Position> {
        let line_number = (line as usize).checked_sub(1)?;
        let column = (utf8_column as usize).checked_sub(1)?;

        let (start, end) = self.line_span(line_number)?;
        if start + column > end {
            return None;
        }
        let prefix = &text[start..];
        if !prefix.is_char_boundary(column) {
            return None;
        }

        let utf16_count: usize = prefix[..column].chars().map(char::len_utf16).sum();
        Some(Position {
            line: line_number as u32,
            character: utf16_count as u32,
        })
    }

    /// The 1-based UTF-8 column of an LSP position
    pub fn utf8_column(&self, text: &str, position: Position) -> Option<u32> {
        let offset = self.offset(text, position)?;
        let start = self.line_starts[position.line as usize];
        Some((offset - start + 1) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(text: &str) -> LineIndex {
        LineIndex::new(text)
    }

    #[test]
    fn test_ascii_text() {
        let text = "Hello\nWorld";
        let idx = index(text);

        assert_eq!(idx.offset(text, Position { line: 0, character: 0 }), Some(0));
        assert_eq!(idx.offset(text, Position { line: 0, character: 5 }), Some(5));
        assert_eq!(idx.offset(text, Position { line: 1, character: 0 }), Some(6));
        assert_eq!(idx.offset(text, Position { line: 1, character: 5 }), Some(11));
    }

    #[test]
    fn test_position_past_line_end() {
        let text = "Hello\nWorld";
        let idx = index(text);

        assert_eq!(idx.offset(text, Position { line: 0, character: 6 }), None);
        assert_eq!(idx.offset(text, Position { line: 2, character: 0 }), None);
    }

    #[test]
    fn test_emoji() {
        let text = "Hello 😀 World";
        let idx = index(text);

        // "😀" is 4 bytes but 2 UTF-16 code units
        assert_eq!(idx.offset(text, Position { line: 0, character: 8 }), Some(10));
        // Inside the surrogate pair
        assert_eq!(idx.offset(text, Position { line: 0, character: 7 }), None);
    }

    #[test]
    fn test_offset_to_position() {
        let text = "Hello\nWorld";
        let idx = index(text);

        assert_eq!(idx.position_for_offset(text, 0), Position { line: 0, character: 0 });
        assert_eq!(idx.position_for_offset(text, 5), Position { line: 0, character: 5 });
        assert_eq!(idx.position_for_offset(text, 6), Position { line: 1, character: 0 });
        assert_eq!(idx.position_for_offset(text, 11), Position { line: 1, character: 5 });
    }

    #[test]
    fn test_offset_to_position_emoji() {
        let text = "Hi 😀";
        let idx = index(text);

        assert_eq!(idx.position_for_offset(text, 3), Position { line: 0, character: 3 });
        assert_eq!(idx.position_for_offset(text, 7), Position { line: 0, character: 5 });
    }

    #[test]
    fn test_utf8_coordinates() {
        let text = "func foo() {}\nfoo()\n";
        let idx = index(text);

        // Line 2, column 1 is the start of "foo()"
        assert_eq!(
            idx.position_from_utf8(text, 2, 1),
            Some(Position { line: 1, character: 0 })
        );
        // Column past the end of the line
        assert_eq!(idx.position_from_utf8(text, 2, 7), None);
        // Line past the end of the file
        assert_eq!(idx.position_from_utf8(text, 9, 1), None);
    }

    #[test]
    fn test_utf8_coordinates_multibyte() {
        let text = "let café = 1";
        let idx = index(text);

        // "é" is 2 bytes, 1 UTF-16 unit; "=" is at byte 10, UTF-16 column 9
        assert_eq!(
            idx.position_from_utf8(text, 1, 11),
            Some(Position { line: 0, character: 9 })
        );
        // Byte column in the middle of "é"
        assert_eq!(idx.position_from_utf8(text, 1, 9), None);
    }

    #[test]
    fn test_utf8_column_round_trip() {
        let text = "obj.perform(action: 1, with: 2)\n";
        let idx = index(text);

        for character in [0, 4, 12, 31] {
            let position = Position { line: 0, character };
            let column = idx.utf8_column(text, position).unwrap();
            assert_eq!(idx.position_from_utf8(text, 1, column), Some(position));
        }
    }
}
