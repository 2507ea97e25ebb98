//! # csvstream
//!
//! Streaming reader and writer for delimited text (CSV, TSV and friends)
//! with configurable separator, enclosing char and end-of-line char.
//!
//! - Cell-by-cell reading through a callback that can skip the rest of a
//!   row or stop the read, leaving the input positioned for resumption
//! - Zero-copy cells when scanning in-memory text
//! - Separator auto-detection from the first line
//! - Compressed files (`.csv.zst`, `.csv.gz`) read and written transparently
//! - Coercion of cell text to numbers, dates, times and date-times for charts
//!
//! ## Reading
//!
//! ```no_run
//! use csvstream::CsvReader;
//!
//! let mut reader = CsvReader::open("data.csv")?.has_header(true);
//! for row in reader.rows() {
//!     println!("{:?}", row?);
//! }
//! # Ok::<(), csvstream::CsvError>(())
//! ```
//!
//! ## Writing
//!
//! ```no_run
//! use csvstream::CsvWriter;
//!
//! let mut writer = CsvWriter::new("out.csv.zst")?;
//! writer.write_row(["id", "when"])?;
//! writer.write_row(["1", "2020-04-25T10:00:00Z"])?;
//! writer.save()?;
//! # Ok::<(), csvstream::CsvError>(())
//! ```
//!
//! ## Coercion
//!
//! ```
//! use csvstream::{cell_string_to_value, ChartDataType};
//!
//! let (value, kind) = cell_string_to_value("2020-04-25");
//! assert_eq!(kind, ChartDataType::DateOnly);
//! assert_eq!(value, 1_587_772_800.0);
//! ```

pub mod chart_data;
pub mod csv;
pub mod csv_reader;
pub mod csv_writer;
pub mod error;
pub mod types;

pub use chart_data::{cell_string_to_value, ChartDataType, ColumnTypes};
pub use csv::{
    CellData, CsvEncoder, CsvParser, EncloseMode, FormatDefinition, OwnedBuffer, ReadSummary,
};
pub use csv_reader::{CsvReader, CsvRowIterator};
pub use csv_writer::CsvWriter;
pub use error::{CsvError, Result};
pub use types::{CellValue, LineEnding, ReadStatus};
