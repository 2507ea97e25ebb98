//! Sequential character sources the scanner reads from
//!
//! The scanner needs one character of lookahead and the byte offset of the
//! next character. Sources backed by stable memory additionally hand out the
//! whole input so cells can be exposed as zero-copy views.

use crate::error::Result;
use std::io::BufRead;

const REPLACEMENT: char = '\u{FFFD}';

/// Forward-only character source with one character of lookahead
pub trait CharSource<'s> {
    /// Next character without consuming it
    fn peek_char(&mut self) -> Result<Option<char>>;

    /// Consume and return the next character
    fn next_char(&mut self) -> Result<Option<char>>;

    /// Byte offset of the next character to be returned by `next_char`
    fn position(&self) -> usize;

    /// Whole input, if it lives in memory that outlives the read
    fn backing(&self) -> Option<&'s str> {
        None
    }
}

/// Source over an in-memory string
#[derive(Debug, Clone)]
pub struct StrSource<'s> {
    input: &'s str,
    pos: usize,
}

impl<'s> StrSource<'s> {
    /// Create a source positioned at the start of `input`
    pub fn new(input: &'s str) -> Self {
        Self { input, pos: 0 }
    }

    /// Unread remainder of the input
    pub fn remaining(&self) -> &'s str {
        &self.input[self.pos..]
    }
}

impl<'s> CharSource<'s> for StrSource<'s> {
    #[inline]
    fn peek_char(&mut self) -> Result<Option<char>> {
        Ok(self.input[self.pos..].chars().next())
    }

    #[inline]
    fn next_char(&mut self) -> Result<Option<char>> {
        let ch = self.input[self.pos..].chars().next();
        if let Some(c) = ch {
            self.pos += c.len_utf8();
        }
        Ok(ch)
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn backing(&self) -> Option<&'s str> {
        Some(self.input)
    }
}

/// Source decoding UTF-8 from any buffered reader
///
/// Invalid byte sequences decode to U+FFFD. Transcoding from other
/// encodings has to happen before the bytes reach this source.
pub struct ReaderSource<R> {
    inner: R,
    peeked: Option<(char, usize)>,
    consumed: usize,
}

impl<R: BufRead> ReaderSource<R> {
    /// Wrap a buffered reader
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
            consumed: 0,
        }
    }

    /// Unwrap the reader; a peeked character is lost
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        let buf = self.inner.fill_buf()?;
        Ok(buf.first().copied())
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.inner.consume(1);
        }
        Ok(byte)
    }

    /// Decode one character, returning it with its encoded byte length
    fn decode(&mut self) -> Result<Option<(char, usize)>> {
        let Some(first) = self.next_byte()? else {
            return Ok(None);
        };
        let width = utf8_width(first);
        if width == 1 {
            return Ok(Some((first as char, 1)));
        }
        if width == 0 {
            return Ok(Some((REPLACEMENT, 1)));
        }

        let mut bytes = [first, 0, 0, 0];
        let mut len = 1;
        while len < width {
            match self.peek_byte()? {
                Some(b) if b & 0xC0 == 0x80 => {
                    bytes[len] = b;
                    self.inner.consume(1);
                    len += 1;
                }
                _ => break,
            }
        }

        let ch = std::str::from_utf8(&bytes[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(REPLACEMENT);
        Ok(Some((ch, len)))
    }
}

impl<'s, R: BufRead> CharSource<'s> for ReaderSource<R> {
    fn peek_char(&mut self) -> Result<Option<char>> {
        if self.peeked.is_none() {
            self.peeked = self.decode()?;
        }
        Ok(self.peeked.map(|(c, _)| c))
    }

    fn next_char(&mut self) -> Result<Option<char>> {
        let next = match self.peeked.take() {
            Some(p) => Some(p),
            None => self.decode()?,
        };
        Ok(next.map(|(c, len)| {
            self.consumed += len;
            c
        }))
    }

    fn position(&self) -> usize {
        self.consumed
    }
}

/// Encoded length announced by a UTF-8 lead byte (0 for invalid leads)
fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain<'s>(source: &mut impl CharSource<'s>) -> String {
        let mut out = String::new();
        while let Some(c) = source.next_char().unwrap() {
            out.push(c);
        }
        out
    }

    #[test]
    fn test_str_source_positions() {
        let mut source = StrSource::new("aé,");
        assert_eq!(source.peek_char().unwrap(), Some('a'));
        assert_eq!(source.position(), 0);
        source.next_char().unwrap();
        source.next_char().unwrap();
        assert_eq!(source.position(), 3);
        assert_eq!(source.remaining(), ",");
        assert_eq!(source.backing(), Some("aé,"));
    }

    #[test]
    fn test_reader_source_decodes_utf8() {
        let mut source = ReaderSource::new(Cursor::new("größe;€".as_bytes()));
        assert_eq!(drain(&mut source), "größe;€");
        assert_eq!(source.position(), "größe;€".len());
    }

    #[test]
    fn test_reader_source_peek_does_not_advance() {
        let mut source = ReaderSource::new(Cursor::new(b"xy".to_vec()));
        assert_eq!(source.peek_char().unwrap(), Some('x'));
        assert_eq!(source.peek_char().unwrap(), Some('x'));
        assert_eq!(source.position(), 0);
        assert_eq!(source.next_char().unwrap(), Some('x'));
        assert_eq!(source.position(), 1);
        assert_eq!(CharSource::backing(&source), None);
    }

    #[test]
    fn test_reader_source_invalid_bytes() {
        let mut source = ReaderSource::new(Cursor::new(vec![b'a', 0xFF, 0xC3, b'b']));
        assert_eq!(drain(&mut source), "a\u{FFFD}\u{FFFD}b");
        assert_eq!(source.position(), 4);
    }
}
