//! Character cursor over source text.
use std::str::CharIndices;

use itertools::{multipeek, MultiPeek};

/// Stand-in character returned when the cursor has moved
/// past the last character of the source.
pub(crate) const EOF_CHAR: char = '\0';

/// Wrapper for source code that keeps a cursor position,
/// with line and column bookkeeping for diagnostics.
///
/// The cursor starts *before* the first character. Call
/// [`Cursor::next`] once to make the first character current.
pub(crate) struct Cursor<'a> {
    /// Iterator over UTF-8 encoded source code.
    ///
    /// `MultiPeek` buffers characters internally, because UTF-8
    /// characters are variable in width and the source can't be
    /// indexed per character. Peeking advances an internal peek
    /// cursor, so it must be reset before every lookahead.
    chars: MultiPeek<CharIndices<'a>>,
    /// Byte position and value of the current character.
    current: (usize, char),
    /// Number of bytes in the source.
    len: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            chars: multipeek(text.char_indices()),
            current: (0, EOF_CHAR),
            len: text.len(),
            line: 1,
            column: 0,
        }
    }

    /// Advance the cursor and return the new current character.
    ///
    /// Returns [`EOF_CHAR`] once the end of the source is reached.
    pub(crate) fn next(&mut self) -> char {
        // Leaving a newline moves the position to the next line.
        if self.current.1 == '\n' && !self.at_end() {
            self.line += 1;
            self.column = 0;
        }

        match self.chars.next() {
            Some((index, c)) => {
                self.column += 1;
                self.current = (index, c);
            }
            None => {
                // There is no end-of-file character, so the
                // offset is set to the size of the source.
                self.current = (self.len, EOF_CHAR);
            }
        }

        self.current.1
    }

    /// Character under the cursor.
    #[inline]
    pub(crate) fn current(&self) -> char {
        self.current.1
    }

    /// Character after the current one, without advancing.
    pub(crate) fn peek(&mut self) -> char {
        self.peek_char().unwrap_or(EOF_CHAR)
    }

    /// Character after the current one, or `None` at the end
    /// of the source.
    ///
    /// Unlike [`Cursor::peek`] this tells a NUL in the source
    /// apart from the end.
    pub(crate) fn peek_char(&mut self) -> Option<char> {
        self.chars.reset_peek();
        let c = self.chars.peek().map(|(_, c)| *c);
        self.chars.reset_peek();
        c
    }

    /// Byte offset of the current character.
    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.current.0
    }

    /// Byte offset directly after the current character.
    #[inline]
    pub(crate) fn peek_offset(&self) -> usize {
        if self.at_end() {
            self.len
        } else {
            self.current.0 + self.current.1.len_utf8()
        }
    }

    #[inline]
    pub(crate) fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub(crate) fn column(&self) -> u32 {
        self.column
    }

    /// Indicates if the cursor is past the last character.
    #[inline]
    pub(crate) fn at_end(&self) -> bool {
        self.current.0 >= self.len
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cursor_positions() {
        let mut cursor = Cursor::new("ab\ncé");
        assert_eq!(cursor.next(), 'a');
        assert_eq!((cursor.line(), cursor.column()), (1, 1));
        assert_eq!(cursor.peek(), 'b');
        assert_eq!(cursor.next(), 'b');
        assert_eq!(cursor.next(), '\n');
        assert_eq!((cursor.line(), cursor.column()), (1, 3));
        assert_eq!(cursor.next(), 'c');
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        assert_eq!(cursor.next(), 'é');
        assert_eq!(cursor.offset(), 4);
        assert_eq!(cursor.peek_offset(), 6);
        assert_eq!(cursor.peek(), EOF_CHAR);
        assert!(!cursor.at_end());
        assert_eq!(cursor.next(), EOF_CHAR);
        assert!(cursor.at_end());
        assert_eq!(cursor.peek_offset(), 6);
    }
}
