use serde::Serialize;

/// A 1-based line/column pair. Columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const NONE: Position = Position { line: 0, column: 0 };

    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// File text plus a table of line-start offsets.
///
/// `line_starts[i] <= offset < line_starts[i + 1]` places `offset` on line `i + 1`.
#[derive(Debug, Clone)]
pub struct TextBuffer<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> TextBuffer<'a> {
    /// Index `text` in one pass. `\r\n`, `\r` and `\n` each end a line.
    pub fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    line_starts.push(i + 1);
                }
                b'\n' => line_starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }

        Self { text, line_starts }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Absolute offset of a 1-based line and column.
    ///
    /// Out-of-range values are clamped to the nearest valid position.
    pub fn offset_of(&self, line: usize, column: usize) -> usize {
        let line = line.clamp(1, self.line_count());
        let line_start = self.line_starts[line - 1];
        let line_end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.text.len());

        let offset = (line_start + column.max(1) - 1).min(line_end);
        self.floor_char_boundary(offset)
    }

    /// Like [`offset_of`](Self::offset_of) for a position reported by a sub-document
    /// whose first character sits at `origin` in this buffer.
    ///
    /// Lines shift by the origin line; only positions on the sub-document's first
    /// line shift by the origin column.
    pub fn offset_of_local(&self, line: usize, column: usize, origin: Position) -> usize {
        let line = line.max(1);
        let origin = Position::new(origin.line.max(1), origin.column.max(1));

        if line == 1 {
            self.offset_of(origin.line, column + origin.column - 1)
        } else {
            self.offset_of(origin.line + line - 1, column)
        }
    }

    /// Line and column of `offset`, or [`Position::NONE`] when it is out of bounds.
    pub fn position_of(&self, offset: usize) -> Position {
        if offset > self.text.len() {
            return Position::NONE;
        }

        let line_idx = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Position::new(line_idx + 1, offset - self.line_starts[line_idx] + 1)
    }

    /// Correct a parser-reported offset that may fall slightly short of `match_text`.
    ///
    /// Scans forward up to `match_text.chars().count()` characters for the first
    /// position where the buffer starts with `match_text`. Returns `offset`
    /// unchanged when nothing matches inside the window.
    pub fn adjusted_offset(&self, offset: usize, match_text: &str) -> usize {
        if match_text.is_empty() || offset > self.text.len() {
            return offset;
        }

        let start = self.floor_char_boundary(offset);
        let window = match_text.chars().count();

        let candidates = self.text[start..]
            .char_indices()
            .map(|(i, _)| start + i)
            .take(window + 1);

        for pos in candidates {
            if self.text[pos..].starts_with(match_text) {
                return pos;
            }
        }

        offset
    }

    fn floor_char_boundary(&self, mut offset: usize) -> usize {
        offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_terminators() {
        let buffer = TextBuffer::new("a\r\nb\rc\nd");
        assert_eq!(buffer.line_count(), 4);
        assert_eq!(buffer.offset_of(2, 1), 3);
        assert_eq!(buffer.offset_of(3, 1), 5);
        assert_eq!(buffer.offset_of(4, 1), 7);
    }

    #[test]
    fn test_crlf_is_one_terminator() {
        let buffer = TextBuffer::new("\r\n\r\n");
        assert_eq!(buffer.line_count(), 3);
    }

    #[test]
    fn test_offset_of_clamps() {
        let buffer = TextBuffer::new("abc\ndef");
        assert_eq!(buffer.offset_of(0, 0), 0);
        assert_eq!(buffer.offset_of(1, 99), 4);
        assert_eq!(buffer.offset_of(99, 2), 5);
        assert_eq!(buffer.offset_of(2, 99), 7);
    }

    #[test]
    fn test_position_of() {
        let buffer = TextBuffer::new("abc\ndef");
        assert_eq!(buffer.position_of(0), Position::new(1, 1));
        assert_eq!(buffer.position_of(3), Position::new(1, 4));
        assert_eq!(buffer.position_of(4), Position::new(2, 1));
        assert_eq!(buffer.position_of(7), Position::new(2, 4));
        assert_eq!(buffer.position_of(8), Position::NONE);
    }

    #[test]
    fn test_round_trip_every_offset() {
        let text = "first line\r\nsecond\rthird\n\nfïfth ☃ line";
        let buffer = TextBuffer::new(text);

        for (offset, _) in text.char_indices() {
            let pos = buffer.position_of(offset);
            assert_eq!(buffer.offset_of(pos.line, pos.column), offset, "offset {}", offset);
        }
    }

    #[test]
    fn test_offset_of_local_origin() {
        let parent = TextBuffer::new("xx\n    /// <summary>Text</summary>\nyy");
        let origin = Position::new(2, 5);

        // first line of the sub-document is shifted by the origin column
        assert_eq!(parent.offset_of_local(1, 1, origin), 7);
        assert_eq!(parent.offset_of_local(1, 5, origin), 11);
        // later lines only shift by line
        assert_eq!(parent.offset_of_local(2, 1, origin), parent.offset_of(3, 1));
    }

    #[test]
    fn test_adjusted_offset() {
        let buffer = TextBuffer::new("value = \"some text\"");
        assert_eq!(buffer.adjusted_offset(6, "\"some"), 8);
        assert_eq!(buffer.adjusted_offset(8, "\"some"), 8);
        // not within the search window
        assert_eq!(buffer.adjusted_offset(0, "text"), 0);
        assert_eq!(buffer.adjusted_offset(0, "zzz"), 0);
    }

    #[test]
    fn test_adjusted_offset_handles_multibyte() {
        let buffer = TextBuffer::new("ä & b ö");
        assert_eq!(buffer.adjusted_offset(1, "b"), 1);
        assert_eq!(buffer.adjusted_offset(2, "& b"), 3);
    }
}
