//! Cell and row serialization, the inverse of the scanner's quoting rules

use super::format::FormatDefinition;
use crate::types::LineEnding;
use std::io::{self, Write};

/// When cells are wrapped in the enclosing char
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncloseMode {
    /// Every cell is enclosed
    Always,
    /// Only cells containing the separator, the enclosing char or a line break
    #[default]
    IfNeeded,
    /// Cells are written verbatim
    Never,
}

/// CSV encoder for writing properly formatted delimited text
#[derive(Debug, Clone)]
pub struct CsvEncoder {
    separator: Option<char>,
    enclosing: Option<char>,
    line_ending: LineEnding,
    mode: EncloseMode,
}

impl Default for CsvEncoder {
    fn default() -> Self {
        Self::new(Some(','), Some('"'), LineEnding::Lf, EncloseMode::IfNeeded)
    }
}

impl CsvEncoder {
    /// Create a new encoder
    pub fn new(
        separator: Option<char>,
        enclosing: Option<char>,
        line_ending: LineEnding,
        mode: EncloseMode,
    ) -> Self {
        Self {
            separator,
            enclosing,
            line_ending,
            mode,
        }
    }

    /// Create an encoder with custom separator and quote character
    pub fn with_chars(separator: char, enclosing: char) -> Self {
        Self::new(
            Some(separator),
            Some(enclosing),
            LineEnding::Lf,
            EncloseMode::IfNeeded,
        )
    }

    /// Create an encoder writing the control characters of `format`
    ///
    /// The format's EOL char becomes the line terminator, so content holding
    /// it is enclosed under [`EncloseMode::IfNeeded`].
    pub fn from_format(format: &FormatDefinition, mode: EncloseMode) -> Self {
        Self::new(
            format.separator,
            format.enclosing,
            LineEnding::from_eol(format.eol),
            mode,
        )
    }

    /// Line terminator written between rows
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Write a single cell with quoting/escaping as the mode requires
    pub fn write_cell<W: Write>(&self, out: &mut W, content: &str) -> io::Result<()> {
        let mut buffer = Vec::with_capacity(content.len() + 2);
        self.encode_cell(content, &mut buffer);
        out.write_all(&buffer)
    }

    /// Write one row; no line terminator is appended
    pub fn write_row<W, I, S>(&self, out: &mut W, fields: I) -> io::Result<()>
    where
        W: Write,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buffer = Vec::with_capacity(256);
        self.encode_row(fields, &mut buffer);
        out.write_all(&buffer)
    }

    /// Write rows separated by the line terminator
    ///
    /// The terminator goes between rows; `trailing_eol` adds one after the
    /// last row as well.
    pub fn write_delimited<W, R, I, S>(&self, out: &mut W, rows: R, trailing_eol: bool) -> io::Result<()>
    where
        W: Write,
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buffer = Vec::with_capacity(4096);
        let mut wrote_any = false;
        for (i, row) in rows.into_iter().enumerate() {
            if i > 0 {
                self.line_ending.append_to(&mut buffer);
            }
            self.encode_row(row, &mut buffer);
            wrote_any = true;

            if buffer.len() >= 4096 {
                out.write_all(&buffer)?;
                buffer.clear();
            }
        }
        if trailing_eol && wrote_any {
            self.line_ending.append_to(&mut buffer);
        }
        out.write_all(&buffer)
    }

    /// Encode entire row into buffer
    ///
    /// A row made of a single empty cell is written as an empty enclosure
    /// when possible, otherwise it would read back as no row at all at the
    /// end of a stream. A row without fields is written the same way and
    /// reads back as one empty cell.
    pub fn encode_row<I, S>(&self, fields: I, buffer: &mut Vec<u8>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut count = 0;
        let mut only_empty = true;
        let row_start = buffer.len();

        for (i, field) in fields.into_iter().enumerate() {
            let field = field.as_ref();
            if i > 0 {
                if let Some(sep) = self.separator {
                    push_char(buffer, sep);
                }
            }
            only_empty &= field.is_empty();
            self.encode_cell(field, buffer);
            count += 1;
        }

        if count <= 1 && only_empty && self.mode != EncloseMode::Never {
            if let Some(quote) = self.enclosing {
                buffer.truncate(row_start);
                push_char(buffer, quote);
                push_char(buffer, quote);
            }
        }
    }

    /// Encode single field with proper quoting/escaping
    pub fn encode_cell(&self, field: &str, buffer: &mut Vec<u8>) {
        let quote = match self.enclosing {
            Some(quote) if self.needs_quoting(field) => quote,
            _ => {
                buffer.extend_from_slice(field.as_bytes());
                return;
            }
        };

        push_char(buffer, quote);
        for ch in field.chars() {
            if ch == quote {
                // Escape quotes by doubling: " -> ""
                push_char(buffer, quote);
            }
            push_char(buffer, ch);
        }
        push_char(buffer, quote);
    }

    /// Check if field requires quoting under the current mode
    ///
    /// Leading whitespace alone does not trigger enclosing; a reader that
    /// skips leading whitespace needs [`EncloseMode::Always`] to keep it.
    pub fn needs_quoting(&self, field: &str) -> bool {
        match self.mode {
            EncloseMode::Always => true,
            EncloseMode::Never => false,
            EncloseMode::IfNeeded => field.chars().any(|c| {
                Some(c) == self.separator
                    || Some(c) == self.enclosing
                    || c == '\n'
                    || c == '\r'
                    || c == self.line_ending.eol_char()
            }),
        }
    }
}

#[inline]
fn push_char(buffer: &mut Vec<u8>, ch: char) {
    let mut utf8 = [0u8; 4];
    buffer.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
}
