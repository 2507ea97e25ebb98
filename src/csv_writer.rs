//! CSV file writing with streaming support and compression

use crate::csv::{CompressionMethod, CsvEncoder, EncloseMode, FormatDefinition};
use crate::error::{CsvError, Result};
use crate::types::{CellValue, LineEnding};
use s_zip::StreamingZipWriter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CSV file writer with streaming capabilities and compression support
///
/// Writes delimited text row by row, streaming data directly to disk, to a
/// compressed ZIP entry or to any [`Write`] sink. The line ending goes
/// between rows; a final one is only written when
/// [`CsvWriter::trailing_line_ending`] asks for it.
///
/// # Examples
///
/// ```no_run
/// use csvstream::csv_writer::CsvWriter;
///
/// let mut writer = CsvWriter::new("output.csv").unwrap();
/// writer.write_row(["Name", "Age", "City"]).unwrap();
/// writer.write_row(["Alice", "30", "NYC"]).unwrap();
/// writer.save().unwrap();
/// ```
///
/// # Compression
///
/// Auto-detects compression from file extension:
/// - `.csv` → Uncompressed
/// - `.csv.zst` or `.csv.zip` → Zstd compression (level 3)
/// - `.csv.gz` → Deflate/Gzip compression (level 6)
///
/// ```no_run
/// use csvstream::csv_writer::CsvWriter;
/// use csvstream::csv::CompressionMethod;
///
/// // Auto-detect from extension
/// let mut writer = CsvWriter::new("data.csv.zst").unwrap();
///
/// // Or explicit compression
/// let mut writer = CsvWriter::with_compression(
///     "data.csv.zst",
///     CompressionMethod::Zstd,
///     3
/// ).unwrap();
/// ```
pub struct CsvWriter {
    // Dual-mode output
    zip_writer: Option<StreamingZipWriter<File>>,
    direct_writer: Option<BufWriter<Box<dyn Write>>>,

    // State
    row_count: u64,
    buffer: Vec<u8>,

    // Configuration
    separator: Option<char>,
    enclosing: Option<char>,
    line_ending: LineEnding,
    mode: EncloseMode,
    trailing_eol: bool,
    encoder: CsvEncoder,
}

impl CsvWriter {
    /// Create a new CSV writer - auto-detects compression from file extension
    ///
    /// # File Extensions
    /// - `.csv` → Uncompressed
    /// - `.csv.zst` or `.csv.zip` → Zstd compression (level 3)
    /// - `.csv.gz` → Deflate compression (level 6)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::csv_writer::CsvWriter;
    ///
    /// // Plain CSV
    /// let mut writer = CsvWriter::new("data.csv").unwrap();
    ///
    /// // Zstd compressed
    /// let mut writer = CsvWriter::new("data.csv.zst").unwrap();
    ///
    /// // Gzip compressed
    /// let mut writer = CsvWriter::new("data.csv.gz").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_str().unwrap_or("");

        if path_str.ends_with(".csv.zst") || path_str.ends_with(".csv.zip") {
            Self::with_compression(path_ref, CompressionMethod::Zstd, 3)
        } else if path_str.ends_with(".csv.gz") {
            Self::with_compression(path_ref, CompressionMethod::Deflate, 6)
        } else {
            // Plain CSV - direct file write
            let file = File::create(path_ref)
                .map_err(|e| CsvError::WriteError(format!("Failed to create CSV file: {}", e)))?;

            Ok(Self::with_outputs(None, Some(BufWriter::new(Box::new(file)))))
        }
    }

    /// Create a writer with explicit compression method and level
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `method` - Compression method (Zstd or Deflate)
    /// * `level` - Compression level:
    ///   - Zstd: 1-21 (recommend 3 for balanced)
    ///   - Deflate: 0-9 (recommend 6 for balanced)
    pub fn with_compression<P: AsRef<Path>>(
        path: P,
        method: CompressionMethod,
        level: u32,
    ) -> Result<Self> {
        let path_ref = path.as_ref();

        // Create ZIP with single CSV entry
        let mut zip = StreamingZipWriter::with_method(path_ref, method, level)
            .map_err(|e| CsvError::WriteError(format!("Failed to create ZIP writer: {}", e)))?;

        let entry_name = entry_name_for(path_ref);
        log::debug!("writing CSV entry {entry_name} to {}", path_ref.display());

        zip.start_entry(&entry_name)
            .map_err(|e| CsvError::WriteError(format!("Failed to start ZIP entry: {}", e)))?;

        Ok(Self::with_outputs(Some(zip), None))
    }

    /// Write delimited text to any byte sink
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::csv_writer::CsvWriter;
    ///
    /// let mut writer = CsvWriter::from_writer(std::io::sink()).delimiter(';');
    /// writer.write_row(["a", "b;c"]).unwrap();
    /// assert_eq!(writer.row_count(), 1);
    /// writer.save().unwrap();
    /// ```
    pub fn from_writer<W: Write + 'static>(writer: W) -> Self {
        Self::with_outputs(None, Some(BufWriter::new(Box::new(writer))))
    }

    fn with_outputs(
        zip_writer: Option<StreamingZipWriter<File>>,
        direct_writer: Option<BufWriter<Box<dyn Write>>>,
    ) -> Self {
        let encoder = CsvEncoder::default();
        CsvWriter {
            zip_writer,
            direct_writer,
            row_count: 0,
            buffer: Vec::with_capacity(4096),
            separator: Some(','),
            enclosing: Some('"'),
            line_ending: LineEnding::Lf,
            mode: EncloseMode::IfNeeded,
            trailing_eol: false,
            encoder,
        }
    }

    fn rebuild_encoder(mut self) -> Self {
        self.encoder = CsvEncoder::new(self.separator, self.enclosing, self.line_ending, self.mode);
        self
    }

    /// Set custom delimiter (builder pattern)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::csv_writer::CsvWriter;
    ///
    /// let mut writer = CsvWriter::new("data.csv")
    ///     .unwrap()
    ///     .delimiter(';');
    /// ```
    pub fn delimiter(mut self, delim: char) -> Self {
        self.separator = Some(delim);
        self.rebuild_encoder()
    }

    /// Set custom quote character (builder pattern)
    pub fn quote_char(mut self, quote: char) -> Self {
        self.enclosing = Some(quote);
        self.rebuild_encoder()
    }

    /// Write cells without any quoting (builder pattern)
    pub fn no_quote_char(mut self) -> Self {
        self.enclosing = None;
        self.rebuild_encoder()
    }

    /// Set the line ending written between rows (builder pattern)
    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self.rebuild_encoder()
    }

    /// Set a single-char line ending, as read back with the same EOL char
    /// (builder pattern)
    ///
    /// Cells containing it are enclosed under [`EncloseMode::IfNeeded`].
    pub fn eol(mut self, eol: char) -> Self {
        self.line_ending = LineEnding::from_eol(eol);
        self.rebuild_encoder()
    }

    /// Take separator, enclosing char and EOL from a reader format (builder pattern)
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::csv::FormatDefinition;
    /// use csvstream::csv_writer::CsvWriter;
    ///
    /// let format = FormatDefinition::new(Some(';'), Some('"'), '|');
    /// let mut writer = CsvWriter::from_writer(std::io::sink()).format(&format);
    /// writer.write_row(["a|b", "c"]).unwrap();
    /// writer.save().unwrap();
    /// ```
    pub fn format(mut self, format: &FormatDefinition) -> Self {
        self.separator = format.separator;
        self.enclosing = format.enclosing;
        self.line_ending = LineEnding::from_eol(format.eol);
        self.rebuild_encoder()
    }

    /// Choose which cells get enclosed (builder pattern)
    pub fn enclose_mode(mut self, mode: EncloseMode) -> Self {
        self.mode = mode;
        self.rebuild_encoder()
    }

    /// End the output with a line ending after the last row (builder pattern)
    pub fn trailing_line_ending(mut self, trailing: bool) -> Self {
        self.trailing_eol = trailing;
        self
    }

    fn emit(&mut self) -> Result<()> {
        if let Some(ref mut zip) = self.zip_writer {
            zip.write_data(&self.buffer)
                .map_err(|e| CsvError::WriteError(format!("Failed to write to ZIP: {}", e)))?;
        } else if let Some(ref mut writer) = self.direct_writer {
            writer
                .write_all(&self.buffer)
                .map_err(|e| CsvError::WriteError(format!("Failed to write to file: {}", e)))?;
        } else {
            return Err(CsvError::InvalidState("writer already finished".to_string()));
        }
        Ok(())
    }

    /// Write a row of strings
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::csv_writer::CsvWriter;
    ///
    /// let mut writer = CsvWriter::new("data.csv").unwrap();
    /// writer.write_row(["Name", "Age", "City"]).unwrap();
    /// writer.write_row(["Alice", "30", "NYC"]).unwrap();
    /// writer.save().unwrap();
    /// ```
    pub fn write_row<I, S>(&mut self, data: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Reuse buffer
        self.buffer.clear();

        if self.row_count > 0 {
            self.line_ending.append_to(&mut self.buffer);
        }
        self.encoder.encode_row(data, &mut self.buffer);
        self.emit()?;

        self.row_count += 1;
        Ok(())
    }

    /// Write a row of typed values
    ///
    /// Converts CellValue types to strings before writing.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::csv_writer::CsvWriter;
    /// use csvstream::types::CellValue;
    ///
    /// let mut writer = CsvWriter::new("data.csv").unwrap();
    /// writer.write_row_typed(&[
    ///     CellValue::String("Alice".to_string()),
    ///     CellValue::Int(30),
    ///     CellValue::Float(75.5),
    /// ]).unwrap();
    /// ```
    pub fn write_row_typed(&mut self, cells: &[CellValue]) -> Result<()> {
        let strings: Vec<String> = cells.iter().map(|c| c.as_string()).collect();
        self.write_row(strings)
    }

    /// Write multiple rows at once
    pub fn write_rows_batch<I, R, S>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for row_data in rows {
            self.write_row(row_data)?;
        }
        Ok(())
    }

    /// Get the number of rows written
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Finalize and save the CSV output
    ///
    /// This must be called to properly close the file.
    /// Consumes the writer.
    pub fn save(mut self) -> Result<()> {
        if self.trailing_eol && self.row_count > 0 {
            self.buffer.clear();
            self.line_ending.append_to(&mut self.buffer);
            self.emit()?;
        }

        if let Some(zip) = self.zip_writer.take() {
            zip.finish()
                .map_err(|e| CsvError::WriteError(format!("Failed to finish ZIP: {}", e)))?;
        } else if let Some(mut writer) = self.direct_writer.take() {
            writer
                .flush()
                .map_err(|e| CsvError::WriteError(format!("Failed to flush file: {}", e)))?;
        }
        log::debug!("CSV output finished after {} rows", self.row_count);
        Ok(())
    }
}

/// Entry name inside the archive: the file stem with compression suffixes removed
fn entry_name_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| {
            let clean = s
                .trim_end_matches(".csv")
                .trim_end_matches(".zst")
                .trim_end_matches(".gz");
            format!("{}.csv", clean)
        })
        .unwrap_or_else(|| "data.csv".to_string())
}
