//! CSV file reading with streaming support and decompression

use crate::csv::{
    first_row_complete, CellData, CharSource, CsvParser, FormatDefinition, OwnedBuffer,
    ReadSummary, ReaderSource, RowEnd,
};
use crate::error::{CsvError, Result};
use crate::types::ReadStatus;
use s_zip::StreamingZipReader;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

/// Upper bound of the sample buffered for separator auto-detection
const SAMPLE_LIMIT: usize = 64 * 1024;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// CSV file reader with streaming capabilities and decompression support
///
/// Reads delimited text row by row (or cell by cell through a callback)
/// without loading the input into memory. Automatically handles compressed
/// files (.csv.zst, .csv.gz, .csv.zip). Memory usage is constant and low.
///
/// # Examples
///
/// ```no_run
/// use csvstream::csv_reader::CsvReader;
///
/// let mut reader = CsvReader::open("data.csv").unwrap();
///
/// for row_result in reader.rows() {
///     let row = row_result.unwrap();
///     println!("{:?}", row);
/// }
/// ```
///
/// # Auto-detected separator with headers
///
/// ```no_run
/// use csvstream::csv_reader::CsvReader;
///
/// let mut reader = CsvReader::open("export.txt")
///     .unwrap()
///     .auto_detect(true)
///     .has_header(true);
///
/// let rows = reader.read_all().unwrap();
/// println!("Headers: {:?}", reader.headers());
/// println!("{} data rows", rows.len());
/// ```
pub struct CsvReader {
    // Input until the first read, then the scanning source
    input: Option<Box<dyn Read>>,
    source: Option<ReaderSource<Box<dyn BufRead>>>,

    // Scanner state
    parser: CsvParser,
    cell: CellData<OwnedBuffer>,
    next_row: usize,
    // row and column of a cell the callback stopped on with `Terminate`
    pending: Option<(usize, usize)>,
    row_count: u64,
    finished: bool,

    // Configuration
    format: FormatDefinition,
    has_header: bool,
    headers: Vec<String>,
}

impl CsvReader {
    /// Open CSV file - auto-detects compression from file extension
    ///
    /// # File Extensions
    /// - `.csv` → Uncompressed, direct read
    /// - `.csv.zst`, `.csv.zip` → Zstd decompression
    /// - `.csv.gz` → Deflate/Gzip decompression
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::csv_reader::CsvReader;
    ///
    /// // Plain CSV
    /// let reader = CsvReader::open("data.csv").unwrap();
    ///
    /// // Compressed CSV (auto-detected)
    /// let reader = CsvReader::open("data.csv.zst").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_str().unwrap_or("");

        if path_str.ends_with(".csv.zst")
            || path_str.ends_with(".csv.zip")
            || path_str.ends_with(".csv.gz")
        {
            let mut zip = StreamingZipReader::open(path_ref)
                .map_err(|e| CsvError::ReadError(format!("Failed to open ZIP: {}", e)))?;

            // Find first .csv entry
            let entry_name = zip
                .entries()
                .iter()
                .find(|e| e.name.ends_with(".csv"))
                .or_else(|| zip.entries().first())
                .ok_or_else(|| CsvError::ReadError("No CSV entry found in archive".to_string()))?
                .name
                .clone();

            log::debug!("reading CSV entry {entry_name} from {}", path_ref.display());

            let data = zip
                .read_entry_by_name(&entry_name)
                .map_err(|e| CsvError::ReadError(format!("Failed to read ZIP entry: {}", e)))?;

            Ok(Self::from_reader(Cursor::new(data)))
        } else {
            let file = File::open(path_ref)
                .map_err(|e| CsvError::ReadError(format!("Failed to open CSV file: {}", e)))?;

            Ok(Self::from_reader(file))
        }
    }

    /// Read delimited text from any byte stream
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::csv_reader::CsvReader;
    ///
    /// let mut reader = CsvReader::from_reader("a;b\nc;d".as_bytes()).delimiter(';');
    /// assert_eq!(reader.read_row().unwrap(), Some(vec!["a".to_string(), "b".to_string()]));
    /// ```
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        let format = FormatDefinition::default();
        CsvReader {
            input: Some(Box::new(reader)),
            source: None,
            parser: CsvParser::new(format.clone()),
            cell: CellData::new(OwnedBuffer::with_capacity(1024)),
            next_row: 0,
            pending: None,
            row_count: 0,
            finished: false,
            format,
            has_header: false,
            headers: Vec::new(),
        }
    }

    /// Set custom delimiter (builder pattern)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::csv_reader::CsvReader;
    ///
    /// let reader = CsvReader::open("data.csv")
    ///     .unwrap()
    ///     .delimiter(';');
    /// ```
    pub fn delimiter(mut self, delim: char) -> Self {
        self.format.separator = Some(delim);
        self
    }

    /// Set custom quote character (builder pattern)
    pub fn quote_char(mut self, quote: char) -> Self {
        self.format.enclosing = Some(quote);
        self
    }

    /// Disable quoting altogether (builder pattern)
    pub fn no_quote_char(mut self) -> Self {
        self.format.enclosing = None;
        self
    }

    /// Set the end-of-line character (builder pattern)
    pub fn eol(mut self, eol: char) -> Self {
        self.format.eol = eol;
        self
    }

    /// Skip whitespace at the start of unenclosed cells (builder pattern)
    pub fn skip_leading_whitespace(mut self, skip: bool) -> Self {
        self.format.skip_leading_whitespace = skip;
        self
    }

    /// Detect the separator from the first line (builder pattern)
    pub fn auto_detect(mut self, auto: bool) -> Self {
        self.format.auto_detect_separator = auto;
        self
    }

    /// Fail on enclosed cells cut off by end of file (builder pattern)
    pub fn strict(mut self, strict: bool) -> Self {
        self.format.strict = strict;
        self
    }

    /// Replace the whole format definition (builder pattern)
    pub fn format(mut self, format: FormatDefinition) -> Self {
        self.format = format;
        self
    }

    /// Indicate that the first row contains headers (builder pattern)
    ///
    /// When set to `true`, the first row will be stored and accessible via `headers()`.
    /// The iterator will skip the header row.
    pub fn has_header(mut self, has: bool) -> Self {
        self.has_header = has;
        self
    }

    /// Format in effect; carries the detected separator once reading started
    pub fn format_definition(&self) -> &FormatDefinition {
        &self.format
    }

    /// Get header row if available
    ///
    /// Returns `Some(&[String])` if headers were parsed, `None` otherwise.
    pub fn headers(&self) -> Option<&[String]> {
        if self.headers.is_empty() {
            None
        } else {
            Some(&self.headers)
        }
    }

    /// Set up the scanning source on first use
    fn prepare(&mut self) -> Result<()> {
        if self.source.is_some() {
            return Ok(());
        }

        self.format.validate()?;
        let input = self
            .input
            .take()
            .ok_or_else(|| CsvError::InvalidState("reader has no input".to_string()))?;

        let mut buffered = BufReader::new(input);
        skip_bom(&mut buffered)?;

        let stream: Box<dyn BufRead> = if self.format.auto_detect_separator {
            let sample = read_sample(&mut buffered, &self.format)?;
            self.format = self.format.resolve(&String::from_utf8_lossy(&sample));
            // replay the sample in front of the rest of the input
            Box::new(Cursor::new(sample).chain(buffered))
        } else {
            Box::new(buffered)
        };

        self.parser = CsvParser::new(self.format.clone());
        self.source = Some(ReaderSource::new(stream));
        Ok(())
    }

    /// Stream the remaining cells through `on_cell(row, col, cell)`
    ///
    /// The callback's [`ReadStatus`] can skip the rest of a row or stop the
    /// read; a later call resumes where the previous one stopped. After
    /// [`ReadStatus::Terminate`] the rest of the interrupted row follows with
    /// its original row and column numbers.
    ///
    /// With [`CsvReader::has_header`] set, row 0 is stored in
    /// [`CsvReader::headers`] instead of being passed to `on_cell`; data
    /// rows keep their position in the input, starting at row 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::csv_reader::CsvReader;
    /// use csvstream::types::ReadStatus;
    ///
    /// let mut reader = CsvReader::from_reader("id,name\n1,Alice\n2,Bob".as_bytes()).has_header(true);
    /// let mut names = Vec::new();
    /// reader
    ///     .read_with(|_, col, cell| {
    ///         if col == 1 {
    ///             names.push(cell.as_str().to_string());
    ///         }
    ///         ReadStatus::Continue
    ///     })
    ///     .unwrap();
    /// assert_eq!(names, vec!["Alice", "Bob"]);
    /// assert_eq!(reader.headers().unwrap()[1], "name");
    /// ```
    pub fn read_with<F>(&mut self, mut on_cell: F) -> Result<ReadSummary>
    where
        F: FnMut(usize, usize, &CellData<OwnedBuffer>) -> ReadStatus,
    {
        self.prepare()?;
        if self.finished {
            return Ok(ReadSummary::default());
        }
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| CsvError::InvalidState("reader source missing".to_string()))?;

        let header_row =
            (self.has_header && self.row_count == 0 && self.pending.is_none()).then_some(0);
        let headers = &mut self.headers;
        let mut summary = ReadSummary::default();
        let mut last: Option<(usize, usize, ReadStatus)> = None;
        let mut rows_touched = self.row_count;

        let mut deliver = |row: usize, col: usize, cell: &CellData<OwnedBuffer>| {
            rows_touched = rows_touched.max(row as u64 + 1);
            if header_row == Some(row) {
                headers.push(cell.as_str().to_string());
                return ReadStatus::Continue;
            }
            summary.cells += 1;
            if last.map_or(true, |(r, _, _)| r != row) {
                summary.rows += 1;
            }
            let status = on_cell(row, col, cell);
            last = Some((row, col, status));
            status
        };

        let mut end = RowEnd::EndOfLine;
        let mut first_row = self.next_row;
        if let Some((row, col)) = self.pending.take() {
            end = self
                .parser
                .continue_row(source, &mut self.cell, row, col, &mut deliver)?;
            first_row = row + 1;
        }
        if end == RowEnd::EndOfLine {
            let rest = self
                .parser
                .read_from(source, &mut self.cell, first_row, &mut deliver)?;
            end = if rest.terminated {
                RowEnd::Terminated
            } else {
                RowEnd::EndOfStream
            };
        }

        self.row_count = rows_touched;
        if end == RowEnd::Terminated {
            summary.terminated = true;
            match last {
                Some((row, col, ReadStatus::Terminate)) => {
                    self.pending = Some((row, col));
                    self.next_row = row;
                }
                Some((row, _, _)) => self.next_row = row + 1,
                None => {}
            }
        } else {
            self.finished = true;
        }
        Ok(summary)
    }

    /// Read a single row
    ///
    /// Returns `Ok(None)` when EOF is reached.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::csv_reader::CsvReader;
    ///
    /// let mut reader = CsvReader::open("data.csv").unwrap();
    ///
    /// while let Some(row) = reader.read_row().unwrap() {
    ///     println!("{:?}", row);
    /// }
    /// ```
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>> {
        self.prepare()?;
        if self.finished {
            return Ok(None);
        }
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| CsvError::InvalidState("reader source missing".to_string()))?;

        // Rest of a row interrupted by `Terminate`
        if let Some((row, col)) = self.pending.take() {
            let mut rest = Vec::new();
            let end = self
                .parser
                .continue_row(source, &mut self.cell, row, col, |_, _, cell| {
                    rest.push(cell.as_str().to_string());
                    ReadStatus::Continue
                })?;
            self.next_row = row + 1;
            if end == RowEnd::EndOfStream {
                self.finished = true;
            }
            if !rest.is_empty() {
                return Ok(Some(rest));
            }
            if self.finished {
                return Ok(None);
            }
        }

        let mut fields = Vec::new();
        let end = self
            .parser
            .read_row(source, &mut self.cell, self.next_row, |_, _, cell| {
                fields.push(cell.as_str().to_string());
                ReadStatus::Continue
            })?;

        if end == RowEnd::EndOfStream {
            self.finished = true;
            if fields.is_empty() {
                return Ok(None); // EOF
            }
        }

        // Handle header row
        if self.has_header && self.row_count == 0 {
            self.headers = fields.clone();
        }

        self.next_row += 1;
        self.row_count += 1;
        Ok(Some(fields))
    }

    /// Get iterator over rows
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::csv_reader::CsvReader;
    ///
    /// let mut reader = CsvReader::open("data.csv").unwrap();
    ///
    /// for row_result in reader.rows() {
    ///     let row = row_result.unwrap();
    ///     println!("{:?}", row);
    /// }
    /// ```
    pub fn rows(&mut self) -> CsvRowIterator<'_> {
        CsvRowIterator { reader: self }
    }

    /// Read all remaining data rows (header excluded)
    pub fn read_all(&mut self) -> Result<Vec<Vec<String>>> {
        self.rows().collect()
    }

    /// Get the number of rows read so far
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Bytes consumed by the scanner so far (after a byte order mark)
    pub fn position(&self) -> usize {
        self.source.as_ref().map_or(0, |s| s.position())
    }
}

/// Drop a UTF-8 byte order mark at the start of the input
fn skip_bom<R: BufRead>(reader: &mut R) -> Result<()> {
    if reader.fill_buf()?.starts_with(&UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

/// Buffer the input up to the first EOL that is not inside an enclosed cell
fn read_sample<R: BufRead>(reader: &mut R, format: &FormatDefinition) -> Result<Vec<u8>> {
    let mut utf8 = [0u8; 4];
    let encoded = format.eol.encode_utf8(&mut utf8);
    let eol_byte = encoded.as_bytes()[encoded.len() - 1];

    let mut sample = Vec::new();
    loop {
        let read = reader.read_until(eol_byte, &mut sample)?;
        if read == 0
            || sample.len() >= SAMPLE_LIMIT
            || first_row_complete(&String::from_utf8_lossy(&sample), format)
        {
            break;
        }
    }
    Ok(sample)
}

/// Iterator over CSV rows
pub struct CsvRowIterator<'a> {
    reader: &'a mut CsvReader,
}

impl<'a> Iterator for CsvRowIterator<'a> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_row() {
            Ok(Some(row)) => {
                // Skip header if has_header is true and this is the first row
                if self.reader.has_header && self.reader.row_count == 1 {
                    // This was the header row, read next
                    self.reader.read_row().transpose()
                } else {
                    Some(Ok(row))
                }
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
