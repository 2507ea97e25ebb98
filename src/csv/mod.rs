//! Delimited-text engine: format definition, sources, cell buffers, scanner and encoder

mod buffer;
mod encoder;
mod format;
mod parser;
mod source;

pub use buffer::{BorrowedView, CellBuffer, CellData, CellStorage, OwnedBuffer};
pub use encoder::{CsvEncoder, EncloseMode};
pub use format::{auto_detect_separator, FormatDefinition, DEFAULT_SEPARATOR_CANDIDATES};
pub(crate) use format::first_row_complete;
pub use parser::{CellEnd, CsvParser, ReadSummary, RowEnd};
pub use source::{CharSource, ReaderSource, StrSource};

// Re-export CompressionMethod from s-zip for convenience
pub use s_zip::CompressionMethod;
