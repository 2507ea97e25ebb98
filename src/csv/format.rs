//! Format definition: control characters, behaviour flags and separator auto-detection

use crate::error::{CsvError, Result};

/// Separator candidates tried by auto-detection, highest priority first
pub const DEFAULT_SEPARATOR_CANDIDATES: [char; 3] = [',', '\t', ';'];

/// Control characters and flags driving one read or write pass
///
/// `separator` and `enclosing` use `None` as the "none" sentinel: without a
/// separator each line is a single cell, without an enclosing char no
/// character has quoting significance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatDefinition {
    /// Cell separator (default: comma)
    pub separator: Option<char>,
    /// Quote character (default: double quote)
    pub enclosing: Option<char>,
    /// End-of-line character (default: `\n`)
    pub eol: char,
    /// Skip whitespace at the start of unenclosed cells
    pub skip_leading_whitespace: bool,
    /// Replace the separator with one detected from the input
    pub auto_detect_separator: bool,
    /// Drop a `\r` directly preceding the EOL char outside quotes
    pub strip_carriage_return: bool,
    /// Fail on an enclosed cell truncated by end of stream
    pub strict: bool,
    /// Priority-ordered candidates for auto-detection
    pub separator_candidates: Vec<char>,
}

impl Default for FormatDefinition {
    fn default() -> Self {
        Self {
            separator: Some(','),
            enclosing: Some('"'),
            eol: '\n',
            skip_leading_whitespace: false,
            auto_detect_separator: false,
            strip_carriage_return: true,
            strict: false,
            separator_candidates: DEFAULT_SEPARATOR_CANDIDATES.to_vec(),
        }
    }
}

impl FormatDefinition {
    /// Create a format with explicit control characters and default flags
    pub fn new(separator: Option<char>, enclosing: Option<char>, eol: char) -> Self {
        Self {
            separator,
            enclosing,
            eol,
            ..Self::default()
        }
    }

    /// Tab-separated values, no quoting
    pub fn tsv() -> Self {
        Self::new(Some('\t'), None, '\n')
    }

    /// Set the separator (builder pattern)
    pub fn with_separator(mut self, separator: Option<char>) -> Self {
        self.separator = separator;
        self
    }

    /// Set the enclosing char (builder pattern)
    pub fn with_enclosing(mut self, enclosing: Option<char>) -> Self {
        self.enclosing = enclosing;
        self
    }

    /// Set the EOL char (builder pattern)
    pub fn with_eol(mut self, eol: char) -> Self {
        self.eol = eol;
        self
    }

    /// Enable leading whitespace skipping (builder pattern)
    pub fn with_skip_leading_whitespace(mut self, skip: bool) -> Self {
        self.skip_leading_whitespace = skip;
        self
    }

    /// Enable separator auto-detection (builder pattern)
    pub fn with_auto_detect(mut self, auto: bool) -> Self {
        self.auto_detect_separator = auto;
        self
    }

    /// Enable strict enclosure checking (builder pattern)
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Replace the auto-detection candidate list (builder pattern)
    pub fn with_separator_candidates(mut self, candidates: &[char]) -> Self {
        self.separator_candidates = candidates.to_vec();
        self
    }

    /// Check that the concrete control characters are pairwise distinct
    pub fn validate(&self) -> Result<()> {
        let pairs = [
            ("separator", self.separator, "enclosing char", self.enclosing),
            ("separator", self.separator, "EOL char", Some(self.eol)),
            ("enclosing char", self.enclosing, "EOL char", Some(self.eol)),
        ];
        for (a_name, a, b_name, b) in pairs {
            if let (Some(a), Some(b)) = (a, b) {
                if a == b {
                    return Err(CsvError::InvalidFormat(format!(
                        "{a_name} and {b_name} are both {a:?}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Format to use for scanning `sample`
    ///
    /// With auto-detection on, the separator is replaced by the detected one;
    /// when nothing is detected the configured separator is kept.
    pub fn resolve(&self, sample: &str) -> FormatDefinition {
        let mut resolved = self.clone();
        if self.auto_detect_separator {
            let detected = auto_detect_separator(sample, self);
            log::debug!(
                "auto-detected separator {:?} (configured {:?})",
                detected,
                self.separator
            );
            if detected.is_some() {
                resolved.separator = detected;
            }
            resolved.auto_detect_separator = false;
        }
        resolved
    }

    /// Whether `ch` is the configured separator
    #[inline]
    pub(crate) fn is_separator(&self, ch: char) -> bool {
        self.separator == Some(ch)
    }

    /// Whether `ch` is the configured enclosing char
    #[inline]
    pub(crate) fn is_enclosing(&self, ch: char) -> bool {
        self.enclosing == Some(ch)
    }

    /// Whether `ch` ends the current cell (separator or EOL)
    #[inline]
    pub(crate) fn is_terminator(&self, ch: char) -> bool {
        ch == self.eol || self.is_separator(ch)
    }
}

/// Candidates met outside enclosures on the first row of a sample
struct FirstRow {
    seen: Vec<bool>,
    complete: bool,
}

/// Scan the first row the way the parser would
///
/// Every candidate is treated as a possible cell boundary, so an enclosing
/// char only opens an enclosure at the start of the input, after an EOL or
/// after a candidate (past leading whitespace when that is skipped).
fn scan_first_row(sample: &str, format: &FormatDefinition) -> FirstRow {
    let candidates = &format.separator_candidates;
    let mut row = FirstRow {
        seen: vec![false; candidates.len()],
        complete: false,
    };
    let mut chars = sample.chars().peekable();
    let mut cell_start = true;
    let mut enclosed = false;

    while let Some(ch) = chars.next() {
        if enclosed {
            if format.is_enclosing(ch) {
                if chars.peek() == Some(&ch) {
                    chars.next();
                } else {
                    enclosed = false;
                }
            }
            continue;
        }
        if ch == format.eol {
            row.complete = true;
            break;
        }
        if let Some(idx) = candidates.iter().position(|&c| c == ch) {
            row.seen[idx] = true;
            cell_start = true;
            continue;
        }
        if cell_start {
            if format.is_enclosing(ch) {
                enclosed = true;
                cell_start = false;
                continue;
            }
            if format.skip_leading_whitespace && ch.is_whitespace() {
                continue;
            }
        }
        cell_start = false;
    }
    row
}

/// Detect the separator of `sample` for `format`
///
/// Collects the candidates of `format.separator_candidates` that occur
/// outside enclosed cells before the first unenclosed EOL and returns the
/// one listed first. Occurrence counts play no role. An enclosing char in
/// the middle of a cell is content, as it is for the parser. Returns `None`
/// when no candidate occurs.
pub fn auto_detect_separator(sample: &str, format: &FormatDefinition) -> Option<char> {
    let row = scan_first_row(sample, format);
    format
        .separator_candidates
        .iter()
        .zip(row.seen)
        .find_map(|(&c, hit)| hit.then_some(c))
}

/// Whether `sample` holds the whole first row, up to an unenclosed EOL
pub(crate) fn first_row_complete(sample: &str, format: &FormatDefinition) -> bool {
    scan_first_row(sample, format).complete
}
