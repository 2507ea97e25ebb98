//! Type definitions shared by the reader, writer and encoder

use std::fmt;

/// Outcome a cell callback reports back to the scanner
///
/// Checked once per cell boundary; a cell that is being scanned cannot be
/// interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadStatus {
    /// Keep scanning as usual
    #[default]
    Continue,
    /// Drop the remaining cells of the current row without reporting them
    SkipRestOfLine,
    /// Stop immediately, leaving the stream right after the current cell
    Terminate,
    /// Consume the rest of the current row, then stop
    SkipRestOfLineAndTerminate,
}

impl ReadStatus {
    /// Whether this status ends the whole read
    pub fn terminates(&self) -> bool {
        matches!(
            self,
            ReadStatus::Terminate | ReadStatus::SkipRestOfLineAndTerminate
        )
    }
}

/// Line terminator written between rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineEnding {
    /// Unix-style (LF)
    #[default]
    Lf,
    /// Windows-style (CRLF)
    CrLf,
    /// Mac classic (CR)
    Cr,
    /// Any other single EOL character
    Custom(char),
}

impl LineEnding {
    /// Terminator for a reader EOL char
    pub fn from_eol(eol: char) -> Self {
        match eol {
            '\n' => LineEnding::Lf,
            '\r' => LineEnding::Cr,
            other => LineEnding::Custom(other),
        }
    }

    /// Append the terminator text to `buffer`
    pub fn append_to(&self, buffer: &mut Vec<u8>) {
        match self {
            LineEnding::Lf => buffer.push(b'\n'),
            LineEnding::CrLf => buffer.extend_from_slice(b"\r\n"),
            LineEnding::Cr => buffer.push(b'\r'),
            LineEnding::Custom(ch) => {
                let mut utf8 = [0u8; 4];
                buffer.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }

    /// Character the reader treats as end of line for this terminator
    ///
    /// For CRLF the reader splits on `\n` and strips the preceding `\r`.
    pub fn eol_char(&self) -> char {
        match self {
            LineEnding::Lf | LineEnding::CrLf => '\n',
            LineEnding::Cr => '\r',
            LineEnding::Custom(ch) => *ch,
        }
    }
}

/// Typed value for writing a row without pre-formatting it
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl CellValue {
    /// Convert cell value to string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Int(i) => itoa::Buffer::new().format(*i).to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_strings() {
        assert_eq!(CellValue::Int(-42).as_string(), "-42");
        assert_eq!(CellValue::Float(3.5).as_string(), "3.5");
        assert_eq!(CellValue::Bool(true).as_string(), "true");
        assert_eq!(CellValue::Empty.as_string(), "");
        assert!(CellValue::Empty.is_empty());
    }

    #[test]
    fn test_read_status_terminates() {
        assert!(!ReadStatus::Continue.terminates());
        assert!(!ReadStatus::SkipRestOfLine.terminates());
        assert!(ReadStatus::Terminate.terminates());
        assert!(ReadStatus::SkipRestOfLineAndTerminate.terminates());
    }

    #[test]
    fn test_line_endings() {
        let mut buffer = Vec::new();
        LineEnding::CrLf.append_to(&mut buffer);
        LineEnding::Custom('|').append_to(&mut buffer);
        assert_eq!(buffer, b"\r\n|");
        assert_eq!(LineEnding::CrLf.eol_char(), '\n');
        assert_eq!(LineEnding::Cr.eol_char(), '\r');
        assert_eq!(LineEnding::Custom('|').eol_char(), '|');
    }

    #[test]
    fn test_line_ending_from_eol() {
        assert_eq!(LineEnding::from_eol('\n'), LineEnding::Lf);
        assert_eq!(LineEnding::from_eol('\r'), LineEnding::Cr);
        assert_eq!(LineEnding::from_eol(';'), LineEnding::Custom(';'));
    }
}
