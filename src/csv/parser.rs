//! Delimited-text scanning engine
//!
//! Cells are scanned character by character:
//!
//! - optional leading whitespace is skipped (unenclosed cells only)
//! - a cell whose first character is the enclosing char is read up to the
//!   next unescaped enclosing char; `""` stands for one literal quote and
//!   separators/EOLs inside are content
//! - anything between a closing quote and the next separator/EOL is dropped
//! - any other cell runs up to the next separator, EOL or end of stream
//!
//! The separator or EOL that ends a cell is only looked at, not consumed,
//! until the callback has decided how to continue. A `Terminate` status
//! therefore leaves the source right behind the cell content.

use super::buffer::{CellBuffer, CellData, CellStorage, OwnedBuffer};
use super::format::FormatDefinition;
use super::source::{CharSource, StrSource};
use crate::error::{CsvError, Result};
use crate::types::ReadStatus;

/// What ended a cell; the terminator itself is still unread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEnd {
    /// A separator follows; the row continues
    Separator,
    /// An EOL char follows; the row ends
    EndOfLine,
    /// Nothing follows
    EndOfStream,
}

/// How a row scan finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEnd {
    /// EOL consumed, another row may follow
    EndOfLine,
    /// Source exhausted
    EndOfStream,
    /// Callback asked to stop
    Terminated,
}

/// Totals of a whole-stream read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadSummary {
    /// Rows that delivered at least one cell
    pub rows: usize,
    /// Cells handed to the callback
    pub cells: usize,
    /// Whether the callback stopped the read early
    pub terminated: bool,
}

/// Scanner for one [`FormatDefinition`]
#[derive(Debug, Clone)]
pub struct CsvParser {
    format: FormatDefinition,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(FormatDefinition::default())
    }
}

impl CsvParser {
    /// Create a parser for `format`
    ///
    /// Auto-detection is only honoured by [`CsvParser::for_each_cell`] and
    /// [`CsvParser::parse_str`], which see the whole input up front.
    /// Streaming callers resolve the format themselves, see
    /// [`FormatDefinition::resolve`].
    pub fn new(format: FormatDefinition) -> Self {
        Self { format }
    }

    /// Create a parser with custom separator and quote character
    pub fn with_chars(separator: char, enclosing: char) -> Self {
        Self::new(FormatDefinition::new(Some(separator), Some(enclosing), '\n'))
    }

    /// Format this parser scans with
    pub fn format(&self) -> &FormatDefinition {
        &self.format
    }

    /// Scan one cell into `cell`
    ///
    /// The terminator is left in the source. An enclosed cell cut off by end
    /// of stream keeps what was read and is flagged with
    /// [`CellData::is_unterminated`].
    pub fn read_cell<'s, S, B>(&self, source: &mut S, cell: &mut CellData<B>) -> Result<CellEnd>
    where
        S: CharSource<'s>,
        B: CellBuffer,
    {
        let format = &self.format;

        if format.skip_leading_whitespace {
            while let Some(ch) = source.peek_char()? {
                if ch.is_whitespace() && !format.is_terminator(ch) && !format.is_enclosing(ch) {
                    source.next_char()?;
                } else {
                    break;
                }
            }
        }
        cell.reset(source.position());

        match source.peek_char()? {
            Some(ch) if format.is_enclosing(ch) => {
                source.next_char()?;
                cell.open_enclosure(source.position());
                self.scan_enclosed(source, cell)
            }
            _ => self.scan_unenclosed(source, cell),
        }
    }

    fn scan_unenclosed<'s, S, B>(&self, source: &mut S, cell: &mut CellData<B>) -> Result<CellEnd>
    where
        S: CharSource<'s>,
        B: CellBuffer,
    {
        let format = &self.format;
        loop {
            let Some(ch) = source.peek_char()? else {
                return Ok(CellEnd::EndOfStream);
            };
            if ch == format.eol {
                return Ok(CellEnd::EndOfLine);
            }
            if format.is_separator(ch) {
                return Ok(CellEnd::Separator);
            }

            let offset = source.position();
            source.next_char()?;
            if ch == '\r'
                && format.strip_carriage_return
                && source.peek_char()? == Some(format.eol)
            {
                continue;
            }
            cell.push(ch, offset);
        }
    }

    fn scan_enclosed<'s, S, B>(&self, source: &mut S, cell: &mut CellData<B>) -> Result<CellEnd>
    where
        S: CharSource<'s>,
        B: CellBuffer,
    {
        loop {
            let offset = source.position();
            match source.next_char()? {
                None => {
                    cell.mark_unterminated();
                    return Ok(CellEnd::EndOfStream);
                }
                Some(ch) if self.format.is_enclosing(ch) => {
                    if source.peek_char()? == Some(ch) {
                        let offset = source.position();
                        source.next_char()?;
                        cell.push(ch, offset);
                    } else {
                        return self.skip_trailing(source);
                    }
                }
                Some(ch) => cell.push(ch, offset),
            }
        }
    }

    /// Drop whatever follows a closing quote up to the next terminator
    fn skip_trailing<'s, S: CharSource<'s>>(&self, source: &mut S) -> Result<CellEnd> {
        loop {
            match source.peek_char()? {
                None => return Ok(CellEnd::EndOfStream),
                Some(ch) if ch == self.format.eol => return Ok(CellEnd::EndOfLine),
                Some(ch) if self.format.is_separator(ch) => return Ok(CellEnd::Separator),
                Some(_) => {
                    source.next_char()?;
                }
            }
        }
    }

    /// Scan one row, calling `on_cell(row, col, cell)` after every cell
    ///
    /// An exhausted source yields no cells at all, while an empty line yields
    /// one empty cell. The callback's [`ReadStatus`] decides how scanning
    /// continues.
    pub fn read_row<'s, S, B, F>(
        &self,
        source: &mut S,
        cell: &mut CellData<B>,
        row: usize,
        on_cell: F,
    ) -> Result<RowEnd>
    where
        S: CharSource<'s>,
        B: CellBuffer,
        F: FnMut(usize, usize, &CellData<B>) -> ReadStatus,
    {
        if source.peek_char()?.is_none() {
            return Ok(RowEnd::EndOfStream);
        }
        self.scan_row(source, cell, row, 0, on_cell)
    }

    /// Resume a row after the callback returned [`ReadStatus::Terminate`]
    /// on cell `(row, col)`
    ///
    /// The source must still be positioned right after that cell. The
    /// pending separator or EOL is consumed first; cells then continue at
    /// `col + 1`. A pending EOL ends the row without further cells.
    pub fn continue_row<'s, S, B, F>(
        &self,
        source: &mut S,
        cell: &mut CellData<B>,
        row: usize,
        col: usize,
        on_cell: F,
    ) -> Result<RowEnd>
    where
        S: CharSource<'s>,
        B: CellBuffer,
        F: FnMut(usize, usize, &CellData<B>) -> ReadStatus,
    {
        match source.peek_char()? {
            None => Ok(RowEnd::EndOfStream),
            Some(ch) if ch == self.format.eol => {
                source.next_char()?;
                Ok(RowEnd::EndOfLine)
            }
            Some(ch) if self.format.is_separator(ch) => {
                source.next_char()?;
                self.scan_row(source, cell, row, col + 1, on_cell)
            }
            Some(ch) => Err(CsvError::InvalidState(format!(
                "cannot resume row {row} after column {col}: found {ch:?} instead of a terminator"
            ))),
        }
    }

    fn scan_row<'s, S, B, F>(
        &self,
        source: &mut S,
        cell: &mut CellData<B>,
        row: usize,
        first_col: usize,
        mut on_cell: F,
    ) -> Result<RowEnd>
    where
        S: CharSource<'s>,
        B: CellBuffer,
        F: FnMut(usize, usize, &CellData<B>) -> ReadStatus,
    {
        let mut col = first_col;
        loop {
            let end = self.read_cell(source, cell)?;
            if cell.is_unterminated() {
                if self.format.strict {
                    return Err(CsvError::UnterminatedEnclosure { row, col });
                }
                log::warn!("enclosed cell at row {row}, column {col} not closed before end of stream");
            }

            match on_cell(row, col, cell) {
                ReadStatus::Continue => match end {
                    CellEnd::Separator => {
                        source.next_char()?;
                        col += 1;
                    }
                    CellEnd::EndOfLine => {
                        source.next_char()?;
                        log::trace!("row {row} complete with {} cells", col + 1);
                        return Ok(RowEnd::EndOfLine);
                    }
                    CellEnd::EndOfStream => return Ok(RowEnd::EndOfStream),
                },
                ReadStatus::SkipRestOfLine => return self.skip_rest_of_line(source, cell, end),
                ReadStatus::Terminate => return Ok(RowEnd::Terminated),
                ReadStatus::SkipRestOfLineAndTerminate => {
                    self.skip_rest_of_line(source, cell, end)?;
                    return Ok(RowEnd::Terminated);
                }
            }
        }
    }

    /// Consume the remaining cells of the row, honouring quoting
    fn skip_rest_of_line<'s, S, B>(
        &self,
        source: &mut S,
        cell: &mut CellData<B>,
        mut end: CellEnd,
    ) -> Result<RowEnd>
    where
        S: CharSource<'s>,
        B: CellBuffer,
    {
        loop {
            match end {
                CellEnd::Separator => {
                    source.next_char()?;
                    end = self.read_cell(source, cell)?;
                }
                CellEnd::EndOfLine => {
                    source.next_char()?;
                    return Ok(RowEnd::EndOfLine);
                }
                CellEnd::EndOfStream => return Ok(RowEnd::EndOfStream),
            }
        }
    }

    /// Scan rows until the source is exhausted or the callback terminates
    pub fn read<'s, S, B, F>(
        &self,
        source: &mut S,
        cell: &mut CellData<B>,
        on_cell: F,
    ) -> Result<ReadSummary>
    where
        S: CharSource<'s>,
        B: CellBuffer,
        F: FnMut(usize, usize, &CellData<B>) -> ReadStatus,
    {
        self.read_from(source, cell, 0, on_cell)
    }

    /// Like [`CsvParser::read`], numbering rows from `first_row`
    pub fn read_from<'s, S, B, F>(
        &self,
        source: &mut S,
        cell: &mut CellData<B>,
        first_row: usize,
        mut on_cell: F,
    ) -> Result<ReadSummary>
    where
        S: CharSource<'s>,
        B: CellBuffer,
        F: FnMut(usize, usize, &CellData<B>) -> ReadStatus,
    {
        let mut summary = ReadSummary::default();
        let mut row = first_row;

        loop {
            let mut delivered = 0;
            let end = self.read_row(source, cell, row, |r, c, data: &CellData<B>| {
                delivered += 1;
                on_cell(r, c, data)
            })?;
            if delivered > 0 {
                summary.rows += 1;
                summary.cells += delivered;
            }

            match end {
                RowEnd::EndOfLine => row += 1,
                RowEnd::EndOfStream => break,
                RowEnd::Terminated => {
                    summary.terminated = true;
                    break;
                }
            }
        }

        Ok(summary)
    }

    /// Scan an in-memory input with zero-copy cells
    ///
    /// Applies separator auto-detection to `input` when enabled.
    pub fn for_each_cell<'s, F>(&self, input: &'s str, on_cell: F) -> Result<ReadSummary>
    where
        F: FnMut(usize, usize, &CellData<CellStorage<'s>>) -> ReadStatus,
    {
        if self.format.auto_detect_separator {
            return CsvParser::new(self.format.resolve(input)).for_each_cell(input, on_cell);
        }
        let mut source = StrSource::new(input);
        let mut cell = CellData::for_source(&source);
        self.read(&mut source, &mut cell, on_cell)
    }

    /// Parse a whole in-memory input into rows of owned strings
    pub fn parse_str(&self, input: &str) -> Result<Vec<Vec<String>>> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        self.for_each_cell(input, |_, col, cell| {
            if col == 0 {
                rows.push(Vec::new());
            }
            if let Some(row) = rows.last_mut() {
                row.push(cell.as_str().to_string());
            }
            ReadStatus::Continue
        })?;
        Ok(rows)
    }

    /// Parse the first row of `line` into fields
    pub fn parse_row(&self, line: &str) -> Result<Vec<String>> {
        let mut source = StrSource::new(line);
        let mut cell = CellData::new(OwnedBuffer::new());
        let mut fields = Vec::new();
        self.read_row(&mut source, &mut cell, 0, |_, _, cell| {
            fields.push(cell.as_str().to_string());
            ReadStatus::Continue
        })?;
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::source::ReaderSource;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn parser() -> CsvParser {
        CsvParser::default()
    }

    fn cell_of(input: &str) -> String {
        let mut source = StrSource::new(input);
        let mut cell = CellData::new(OwnedBuffer::new());
        parser().read_cell(&mut source, &mut cell).unwrap();
        cell.as_str().to_string()
    }

    /// Collect `(row, col, content)` with a callback returning `status_at`
    fn collect(
        input: &str,
        status_at: impl Fn(usize, usize) -> ReadStatus,
    ) -> (Vec<(usize, usize, String)>, ReadSummary, usize) {
        let mut source = StrSource::new(input);
        let mut cell = CellData::new(OwnedBuffer::new());
        let mut seen = Vec::new();
        let summary = parser()
            .read(&mut source, &mut cell, |row, col, cell| {
                seen.push((row, col, cell.as_str().to_string()));
                status_at(row, col)
            })
            .unwrap();
        (seen, summary, source.position())
    }

    fn cells(list: &[(usize, usize, &str)]) -> Vec<(usize, usize, String)> {
        list.iter()
            .map(|&(r, c, s)| (r, c, s.to_string()))
            .collect()
    }

    #[test]
    fn test_simple() {
        assert_eq!(parser().parse_row("a,b,c").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_quoted() {
        assert_eq!(parser().parse_row(r#""a,b",c"#).unwrap(), vec!["a,b", "c"]);
    }

    #[test]
    fn test_escaped_quotes() {
        assert_eq!(
            parser().parse_row(r#""Say ""Hello""",world"#).unwrap(),
            vec![r#"Say "Hello""#, "world"]
        );
    }

    #[test]
    fn test_quote_doubling() {
        assert_eq!(cell_of("\"a\"\"b\""), "a\"b");
        assert_eq!(cell_of("\"\"\"\""), "\"");
        assert_eq!(cell_of("\"\"\"\"\"\""), "\"\"");
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(parser().parse_row("a,,b").unwrap(), vec!["a", "", "b"]);
        assert_eq!(parser().parse_row(",,").unwrap(), vec!["", "", ""]);
    }

    #[test]
    fn test_empty_input_has_no_cells() {
        assert!(parser().parse_row("").unwrap().is_empty());
        assert_eq!(parser().parse_row("\n").unwrap(), vec![""]);
        assert!(parser().parse_str("").unwrap().is_empty());
    }

    #[test]
    fn test_trailing_separator_at_end_of_stream() {
        assert_eq!(parser().parse_row("a,").unwrap(), vec!["a", ""]);
    }

    #[test]
    fn test_quoted_with_newline() {
        assert_eq!(
            parser().parse_str("\"Line 1\nLine 2\",normal\nx").unwrap(),
            vec![vec!["Line 1\nLine 2", "normal"], vec!["x"]]
        );
    }

    #[test]
    fn test_unterminated_last_line() {
        assert_eq!(
            parser().parse_str("a,b\nc,d").unwrap(),
            vec![vec!["a", "b"], vec!["c", "d"]]
        );
        assert_eq!(parser().parse_str("a,b\n").unwrap(), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_trailing_garbage_after_quote() {
        assert_eq!(
            parser().parse_row(r#""abc"xyz,next"#).unwrap(),
            vec!["abc", "next"]
        );
        assert_eq!(
            parser().parse_str("\"abc\" junk\nnext").unwrap(),
            vec![vec!["abc"], vec!["next"]]
        );
    }

    #[test]
    fn test_quote_inside_unenclosed_cell_is_literal() {
        assert_eq!(parser().parse_row(r#"ab"c,d"#).unwrap(), vec![r#"ab"c"#, "d"]);
    }

    #[test]
    fn test_unterminated_enclosure_is_lenient() {
        let mut source = StrSource::new("\"abc,def");
        let mut cell = CellData::new(OwnedBuffer::new());
        let end = parser().read_cell(&mut source, &mut cell).unwrap();
        assert_eq!(end, CellEnd::EndOfStream);
        assert_eq!(cell.as_str(), "abc,def");
        assert!(cell.is_unterminated());
    }

    #[test]
    fn test_unterminated_enclosure_strict() {
        let parser = CsvParser::new(FormatDefinition::default().with_strict(true));
        let err = parser.parse_str("a,\"open").unwrap_err();
        assert!(matches!(
            err,
            CsvError::UnterminatedEnclosure { row: 0, col: 1 }
        ));
    }

    #[test]
    fn test_skip_leading_whitespace() {
        let parser = CsvParser::new(FormatDefinition::default().with_skip_leading_whitespace(true));
        assert_eq!(
            parser.parse_row("  a, \"b, c\" ,\t d ").unwrap(),
            vec!["a", "b, c", "d "]
        );
        assert_eq!(
            CsvParser::default().parse_row(" \"b\"").unwrap(),
            vec![" \"b\""]
        );
    }

    #[test]
    fn test_whitespace_is_kept_inside_enclosure() {
        let parser = CsvParser::new(FormatDefinition::default().with_skip_leading_whitespace(true));
        assert_eq!(parser.parse_row("\"  x\"").unwrap(), vec!["  x"]);
    }

    #[test]
    fn test_whitespace_skip_keeps_tab_separator() {
        let format = FormatDefinition::tsv().with_skip_leading_whitespace(true);
        assert_eq!(
            CsvParser::new(format).parse_row("a\t\tb").unwrap(),
            vec!["a", "", "b"]
        );
    }

    #[test]
    fn test_no_enclosing_char() {
        let parser = CsvParser::new(FormatDefinition::new(Some(','), None, '\n'));
        assert_eq!(
            parser.parse_row(r#""a,b""#).unwrap(),
            vec![r#""a"#, r#"b""#]
        );
    }

    #[test]
    fn test_no_separator() {
        let parser = CsvParser::new(FormatDefinition::new(None, Some('"'), '\n'));
        assert_eq!(
            parser.parse_str("a,b;c\nd").unwrap(),
            vec![vec!["a,b;c"], vec!["d"]]
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let parser = CsvParser::with_chars(';', '\'');
        assert_eq!(parser.parse_row("a;'b;c';d").unwrap(), vec!["a", "b;c", "d"]);
    }

    #[test]
    fn test_crlf() {
        assert_eq!(
            parser().parse_str("a,b\r\nc,\"d\r\n\"\r\n").unwrap(),
            vec![vec!["a", "b"], vec!["c", "d\r\n"]]
        );
        assert_eq!(parser().parse_row("a\rb").unwrap(), vec!["a\rb"]);
    }

    #[test]
    fn test_crlf_stripping_disabled() {
        let mut format = FormatDefinition::default();
        format.strip_carriage_return = false;
        assert_eq!(
            CsvParser::new(format).parse_row("a\r\n").unwrap(),
            vec!["a\r"]
        );
    }

    #[test]
    fn test_custom_eol() {
        let parser = CsvParser::new(FormatDefinition::new(Some(','), Some('"'), ';'));
        assert_eq!(
            parser.parse_str("a,b;\"c;\",d").unwrap(),
            vec![vec!["a", "b"], vec!["c;", "d"]]
        );
    }

    #[test]
    fn test_row_major_positions() {
        let (seen, summary, _) = collect("a,b\n\"x\ny\",z,w\n\nq", |_, _| ReadStatus::Continue);
        assert_eq!(
            seen,
            cells(&[
                (0, 0, "a"),
                (0, 1, "b"),
                (1, 0, "x\ny"),
                (1, 1, "z"),
                (1, 2, "w"),
                (2, 0, ""),
                (3, 0, "q"),
            ])
        );
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.cells, 7);
        assert!(!summary.terminated);
    }

    #[test]
    fn test_skip_rest_of_line() {
        let (seen, summary, _) = collect("a,b,c,d\ne,f", |row, col| {
            if (row, col) == (0, 1) {
                ReadStatus::SkipRestOfLine
            } else {
                ReadStatus::Continue
            }
        });
        assert_eq!(
            seen,
            cells(&[(0, 0, "a"), (0, 1, "b"), (1, 0, "e"), (1, 1, "f")])
        );
        assert_eq!(summary.rows, 2);
    }

    #[test]
    fn test_skip_rest_of_line_honours_quoted_eol() {
        let (seen, _, _) = collect("a,\"x\ny\",c\nd", |row, col| {
            if (row, col) == (0, 0) {
                ReadStatus::SkipRestOfLine
            } else {
                ReadStatus::Continue
            }
        });
        assert_eq!(seen, cells(&[(0, 0, "a"), (1, 0, "d")]));
    }

    #[test]
    fn test_terminate_leaves_position_after_cell() {
        let (seen, summary, position) = collect("a,b\nc,d", |_, _| ReadStatus::Terminate);
        assert_eq!(seen, cells(&[(0, 0, "a")]));
        assert!(summary.terminated);
        assert_eq!(position, 1);
    }

    #[test]
    fn test_skip_rest_of_line_and_terminate() {
        let (seen, summary, position) = collect("a,b\nc,d", |_, _| {
            ReadStatus::SkipRestOfLineAndTerminate
        });
        assert_eq!(seen, cells(&[(0, 0, "a")]));
        assert!(summary.terminated);
        assert_eq!(position, 4);
    }

    #[test]
    fn test_skip_rest_of_line_and_terminate_on_last_line() {
        let (_, summary, position) = collect("a,b", |_, _| ReadStatus::SkipRestOfLineAndTerminate);
        assert!(summary.terminated);
        assert_eq!(position, 3);
    }

    #[test]
    fn test_continue_row_after_terminate() {
        let parser = parser();
        let mut source = StrSource::new("a,b,c\nd");
        let mut cell = CellData::new(OwnedBuffer::new());
        let mut seen = Vec::new();

        let end = parser
            .read_row(&mut source, &mut cell, 0, |_, _, _| ReadStatus::Terminate)
            .unwrap();
        assert_eq!(end, RowEnd::Terminated);

        let end = parser
            .continue_row(&mut source, &mut cell, 0, 0, |row, col, cell| {
                seen.push((row, col, cell.as_str().to_string()));
                ReadStatus::Continue
            })
            .unwrap();
        assert_eq!(end, RowEnd::EndOfLine);
        assert_eq!(seen, cells(&[(0, 1, "b"), (0, 2, "c")]));

        let mut rest = Vec::new();
        parser
            .read_row(&mut source, &mut cell, 1, |row, col, cell| {
                rest.push((row, col, cell.as_str().to_string()));
                ReadStatus::Terminate
            })
            .unwrap();
        assert_eq!(rest, cells(&[(1, 0, "d")]));
        let end = parser
            .continue_row(&mut source, &mut cell, 1, 0, |_, _, _| ReadStatus::Continue)
            .unwrap();
        assert_eq!(end, RowEnd::EndOfStream);
    }

    #[test]
    fn test_continue_row_at_pending_eol() {
        let mut source = StrSource::new("a\nb");
        let mut cell = CellData::new(OwnedBuffer::new());
        parser()
            .read_row(&mut source, &mut cell, 0, |_, _, _| ReadStatus::Terminate)
            .unwrap();
        let mut called = false;
        let end = parser()
            .continue_row(&mut source, &mut cell, 0, 0, |_, _, _| {
                called = true;
                ReadStatus::Continue
            })
            .unwrap();
        assert_eq!(end, RowEnd::EndOfLine);
        assert!(!called);
        assert_eq!(source.position(), 2);
    }

    #[test]
    fn test_zero_copy_cells() {
        let input = "plain,\"quoted\",\"dou\"\"bled\"";
        let mut borrowed = Vec::new();
        parser()
            .for_each_cell(input, |_, _, cell| {
                borrowed.push((cell.as_str().to_string(), cell.buffer().view()));
                ReadStatus::Continue
            })
            .unwrap();
        assert_eq!(borrowed[0], ("plain".to_string(), Some("plain")));
        assert_eq!(borrowed[1], ("quoted".to_string(), Some("quoted")));
        assert_eq!(borrowed[2], ("dou\"bled".to_string(), None));
    }

    #[test]
    fn test_auto_detect_in_parse_str() {
        let parser = CsvParser::new(FormatDefinition::default().with_auto_detect(true));
        assert_eq!(
            parser.parse_str("a;\"b,c\"\nd;e").unwrap(),
            vec![vec!["a", "b,c"], vec!["d", "e"]]
        );
    }

    #[test]
    fn test_reader_source_matches_str_source() {
        let input = "id,name\n1,\"Smith, J\"\n2,\"O\"\"Neil\"\n";
        let mut source = ReaderSource::new(Cursor::new(input.as_bytes()));
        let mut cell = CellData::new(OwnedBuffer::new());
        let mut rows: Vec<Vec<String>> = Vec::new();
        parser()
            .read(&mut source, &mut cell, |_, col, cell| {
                if col == 0 {
                    rows.push(Vec::new());
                }
                rows.last_mut().unwrap().push(cell.as_str().to_string());
                ReadStatus::Continue
            })
            .unwrap();
        assert_eq!(rows, parser().parse_str(input).unwrap());
    }
}
