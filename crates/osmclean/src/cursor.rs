//! Read position over markup bytes
//!
//! Lines and columns are counted in bytes, starting at 1, so error positions
//! point at the offending byte of the decoded UTF-8 input.

use crate::error::Pos;

#[derive(Clone, Debug)]
pub(crate) struct Cursor<'a> {
    input: &'a [u8],
    offset: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    pub(crate) fn current(&self) -> Option<u8> {
        self.peek(0)
    }

    pub(crate) fn peek(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.offset.saturating_add(ahead)).copied()
    }

    /// The next `len` bytes, or `None` when fewer remain
    pub(crate) fn peek_bytes(&self, len: usize) -> Option<&'a [u8]> {
        self.input.get(self.offset..self.offset.saturating_add(len))
    }

    /// Whether markup such as `<!--` or `</` comes next
    pub(crate) fn starts_with(&self, prefix: &[u8]) -> bool {
        self.peek_bytes(prefix.len()) == Some(prefix)
    }

    /// Step over one byte; a newline moves to column 1 of the next line
    pub(crate) fn advance(&mut self) {
        let Some(b) = self.current() else {
            return;
        };
        self.offset += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }

    pub(crate) fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Skip XML whitespace (space, tab, CR, LF)
    pub(crate) fn skip_whitespace(&mut self) {
        while self
            .current()
            .is_some_and(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
        {
            self.advance();
        }
    }

    /// Step over `expected` if it is next, reporting whether it was
    pub(crate) fn consume(&mut self, expected: u8) -> bool {
        let found = self.current() == Some(expected);
        if found {
            self.advance();
        }
        found
    }

    pub(crate) const fn position(&self) -> Pos {
        Pos::new(self.offset, self.line, self.col)
    }

    pub(crate) const fn is_eof(&self) -> bool {
        self.offset >= self.input.len()
    }

    /// Byte offset, for use with [`Cursor::slice_from`]
    pub(crate) const fn pos(&self) -> usize {
        self.offset
    }

    /// Bytes consumed since offset `start`
    pub(crate) fn slice_from(&self, start: usize) -> &'a [u8] {
        self.input.get(start..self.offset).unwrap_or_default()
    }
}
