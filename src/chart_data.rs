//! Cell text to numeric value coercion
//!
//! Cells that are ingested for plotting are turned into an `f64` together
//! with the temporal granularity they were written in. Dates become epoch
//! seconds (inputs without a zone are taken as UTC), bare times of day
//! become seconds since midnight, anything else is tried as a plain number.
//!
//! Recognized shapes, in the order they are tried:
//!
//! | Shape | Type |
//! |---|---|
//! | `yyyy-MM` | `DateOnlyYearMonth` |
//! | `yyyy-MM-dd` | `DateOnly` |
//! | `yyyy-MM-ddThh:mm:ss[.zzz][Z\|±hh[:mm]]` (`T` or space) | `DateAndTime*` |
//! | `[Dd[,] ]dd.MM.yyyy[ hh:mm[:ss[.zzz]]]` | `DateOnly` / `DateAndTime*` |
//! | `hh:mm[:ss[.zzz]]` | `DayTime*` |
//! | number, decimal comma allowed | `Unknown` |

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

/// Temporal granularity of a cell or a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChartDataType {
    /// Not temporal (plain number or unparseable)
    #[default]
    Unknown,
    /// `yyyy-MM-dd`
    DateOnly,
    /// `yyyy-MM`
    DateOnlyYearMonth,
    /// Date with time to the second
    DateAndTime,
    /// Date with time to the millisecond
    DateAndTimeMillisecond,
    /// Date with time and zone
    DateAndTimeTz,
    /// Date with millisecond time and zone
    DateAndTimeMillisecondTz,
    /// Time of day to the second
    DayTime,
    /// Time of day to the millisecond
    DayTimeMillisecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    DayTime,
    Date,
    DateTz,
}

impl ChartDataType {
    /// Domain and granularity rank within it
    fn rank(self) -> Option<(Domain, u8)> {
        use ChartDataType::*;
        match self {
            Unknown => None,
            DayTime => Some((Domain::DayTime, 0)),
            DayTimeMillisecond => Some((Domain::DayTime, 1)),
            DateOnlyYearMonth => Some((Domain::Date, 0)),
            DateOnly => Some((Domain::Date, 1)),
            DateAndTime => Some((Domain::Date, 2)),
            DateAndTimeMillisecond => Some((Domain::Date, 3)),
            DateAndTimeTz => Some((Domain::DateTz, 0)),
            DateAndTimeMillisecondTz => Some((Domain::DateTz, 1)),
        }
    }

    /// Whether values of this type are dates or times
    pub fn is_temporal(self) -> bool {
        self.rank().is_some()
    }

    /// Merge another observation into this one
    ///
    /// The type only ever moves to a strictly more granular variant of the
    /// same domain. `Unknown` stays `Unknown` and observations from another
    /// domain leave the type unchanged.
    pub fn expand(self, other: ChartDataType) -> ChartDataType {
        match (self.rank(), other.rank()) {
            (Some((mine, my_rank)), Some((theirs, their_rank)))
                if mine == theirs && their_rank > my_rank =>
            {
                other
            }
            _ => self,
        }
    }
}

/// Convert cell text to a number and the granularity it was written in
///
/// Returns `(NaN, Unknown)` when nothing matches.
pub fn cell_string_to_value(text: &str) -> (f64, ChartDataType) {
    let text = text.trim();
    parse_iso(text)
        .or_else(|| parse_dotted(text))
        .or_else(|| parse_day_time(text))
        .unwrap_or_else(|| {
            (
                parse_number(text).unwrap_or(f64::NAN),
                ChartDataType::Unknown,
            )
        })
}

fn digits(bytes: &[u8], range: std::ops::Range<usize>) -> Option<u32> {
    let slice = bytes.get(range)?;
    if slice.is_empty() || !slice.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(slice.iter().fold(0, |acc, b| acc * 10 + u32::from(b - b'0')))
}

fn epoch_seconds(dt: NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_millis() as f64 / 1000.0
}

fn parse_iso(text: &str) -> Option<(f64, ChartDataType)> {
    let b = text.as_bytes();

    if b.len() == 7 && b[4] == b'-' {
        let date = NaiveDate::from_ymd_opt(digits(b, 0..4)? as i32, digits(b, 5..7)?, 1)?;
        return Some((
            epoch_seconds(date.and_time(NaiveTime::MIN)),
            ChartDataType::DateOnlyYearMonth,
        ));
    }

    if b.len() < 10 || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(
        digits(b, 0..4)? as i32,
        digits(b, 5..7)?,
        digits(b, 8..10)?,
    )?;
    if b.len() == 10 {
        return Some((
            epoch_seconds(date.and_time(NaiveTime::MIN)),
            ChartDataType::DateOnly,
        ));
    }

    if b.len() < 19 || !matches!(b[10], b'T' | b' ') || b[13] != b':' || b[16] != b':' {
        return None;
    }
    let (hour, minute, second) = (digits(b, 11..13)?, digits(b, 14..16)?, digits(b, 17..19)?);

    let mut end = 19;
    let mut millis = None;
    if b.len() >= 23 && b[19] == b'.' {
        millis = Some(digits(b, 20..23)?);
        end = 23;
    }

    let rest = text.get(end..)?;
    let offset = if rest.is_empty() {
        None
    } else {
        Some(parse_zone(rest)?)
    };

    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis.unwrap_or(0))?;
    let value = epoch_seconds(NaiveDateTime::new(date, time)) - f64::from(offset.unwrap_or(0));
    let has_millis = millis.is_some_and(|m| m > 0);

    let kind = match (offset.is_some(), has_millis) {
        (false, false) => ChartDataType::DateAndTime,
        (false, true) => ChartDataType::DateAndTimeMillisecond,
        (true, false) => ChartDataType::DateAndTimeTz,
        (true, true) => ChartDataType::DateAndTimeMillisecondTz,
    };
    Some((value, kind))
}

/// Zone suffix to offset from UTC in seconds
fn parse_zone(zone: &str) -> Option<i32> {
    if zone == "Z" {
        return Some(0);
    }
    let b = zone.as_bytes();
    let sign = match b.first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let (hours, minutes) = match b.len() {
        3 => (digits(b, 1..3)?, 0),
        5 => (digits(b, 1..3)?, digits(b, 3..5)?),
        6 if b[3] == b':' => (digits(b, 1..3)?, digits(b, 4..6)?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60) as i32)
}

/// Fractional digits to milliseconds (`5` -> 500, `05` -> 50)
fn fraction_millis(fraction: &str) -> Option<u32> {
    let padded = format!("{fraction:0<3}");
    padded.get(..3)?.parse().ok()
}

fn parse_dotted(text: &str) -> Option<(f64, ChartDataType)> {
    static DOTTED_DATE: OnceLock<Regex> = OnceLock::new();
    let re = DOTTED_DATE.get_or_init(|| {
        // optional 2-letter weekday, d.M.yyyy, optional h:mm[:ss[.fff]]
        Regex::new(
            r"^(?:[A-Za-z]{2},?\s+)?(\d{1,2})\.(\d{1,2})\.(\d{4})(?:[ T]+(\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,3}))?)?)?$",
        )
        .unwrap()
    });
    let caps = re.captures(text)?;
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let date = NaiveDate::from_ymd_opt(number(3)? as i32, number(2)?, number(1)?)?;
    if caps.get(4).is_none() {
        return Some((
            epoch_seconds(date.and_time(NaiveTime::MIN)),
            ChartDataType::DateOnly,
        ));
    }

    let millis = match caps.get(7) {
        Some(m) => fraction_millis(m.as_str())?,
        None => 0,
    };
    let time = NaiveTime::from_hms_milli_opt(number(4)?, number(5)?, number(6).unwrap_or(0), millis)?;
    let kind = if millis > 0 {
        ChartDataType::DateAndTimeMillisecond
    } else {
        ChartDataType::DateAndTime
    };
    Some((epoch_seconds(NaiveDateTime::new(date, time)), kind))
}

fn parse_day_time(text: &str) -> Option<(f64, ChartDataType)> {
    let b = text.as_bytes();
    if !matches!(b.len(), 5 | 8 | 12) || b[2] != b':' {
        return None;
    }
    let (hour, minute) = (digits(b, 0..2)?, digits(b, 3..5)?);
    let mut second = 0;
    let mut millis = 0;
    if b.len() >= 8 {
        if b[5] != b':' {
            return None;
        }
        second = digits(b, 6..8)?;
    }
    if b.len() == 12 {
        if b[8] != b'.' {
            return None;
        }
        millis = digits(b, 9..12)?;
    }

    // validates ranges only; no date is attached
    NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;
    let value = f64::from(hour * 3600 + minute * 60 + second) + f64::from(millis) / 1000.0;
    let kind = if millis > 0 {
        ChartDataType::DayTimeMillisecond
    } else {
        ChartDataType::DayTime
    };
    Some((value, kind))
}

/// Plain number, with a lone comma accepted as decimal separator
fn parse_number(text: &str) -> Option<f64> {
    if text.is_empty()
        || !text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | ',' | 'e' | 'E'))
    {
        return None;
    }
    if text.contains(',') {
        if text.contains('.') || text.matches(',').count() != 1 {
            return None;
        }
        return text.replace(',', ".").parse().ok();
    }
    text.parse().ok()
}

/// Per-column type accumulator applying [`ChartDataType::expand`]
///
/// Blank cells carry no type information and are not counted.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypes {
    types: Vec<Option<ChartDataType>>,
}

impl ColumnTypes {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the type observed for a cell of column `col`
    pub fn observe(&mut self, col: usize, kind: ChartDataType) {
        if self.types.len() <= col {
            self.types.resize(col + 1, None);
        }
        let slot = &mut self.types[col];
        *slot = Some(match *slot {
            None => kind,
            Some(current) => current.expand(kind),
        });
    }

    /// Convert a cell and record its type, returning the value
    pub fn ingest(&mut self, col: usize, text: &str) -> f64 {
        let (value, kind) = cell_string_to_value(text);
        if !text.trim().is_empty() {
            self.observe(col, kind);
        }
        value
    }

    /// Type of column `col` so far (`Unknown` when nothing was observed)
    pub fn get(&self, col: usize) -> ChartDataType {
        self.types.get(col).copied().flatten().unwrap_or_default()
    }

    /// Number of columns seen
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no column was seen
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChartDataType::*;

    const APRIL_25_2020: f64 = 1_587_772_800.0;

    #[test]
    fn test_iso_date() {
        assert_eq!(cell_string_to_value("2020-04-25"), (APRIL_25_2020, DateOnly));
        assert_eq!(
            cell_string_to_value("2020-04"),
            (1_585_699_200.0, DateOnlyYearMonth)
        );
    }

    #[test]
    fn test_iso_date_time() {
        assert_eq!(
            cell_string_to_value("2020-04-25T12:34:56"),
            (APRIL_25_2020 + 45_296.0, DateAndTime)
        );
        assert_eq!(
            cell_string_to_value("2020-04-25 12:34:56"),
            (APRIL_25_2020 + 45_296.0, DateAndTime)
        );
    }

    #[test]
    fn test_zero_millis_collapse() {
        assert_eq!(
            cell_string_to_value("2020-04-25T12:34:56.000"),
            (APRIL_25_2020 + 45_296.0, DateAndTime)
        );
        assert_eq!(
            cell_string_to_value("2020-04-25T12:34:56.250"),
            (APRIL_25_2020 + 45_296.25, DateAndTimeMillisecond)
        );
    }

    #[test]
    fn test_time_zones() {
        assert_eq!(
            cell_string_to_value("2020-04-25T12:34:56Z"),
            (APRIL_25_2020 + 45_296.0, DateAndTimeTz)
        );
        assert_eq!(
            cell_string_to_value("2020-04-25T12:34:56+02:00"),
            (APRIL_25_2020 + 45_296.0 - 7_200.0, DateAndTimeTz)
        );
        assert_eq!(
            cell_string_to_value("2020-04-25T12:34:56.500-0130"),
            (APRIL_25_2020 + 45_296.5 + 5_400.0, DateAndTimeMillisecondTz)
        );
        assert_eq!(
            cell_string_to_value("2020-04-25T12:34:56.000+01"),
            (APRIL_25_2020 + 45_296.0 - 3_600.0, DateAndTimeTz)
        );
    }

    #[test]
    fn test_invalid_calendar_values() {
        assert!(cell_string_to_value("2020-13-01").0.is_nan());
        assert!(cell_string_to_value("2020-02-30").0.is_nan());
        assert!(cell_string_to_value("2020-04-25T24:00:00").0.is_nan());
        assert!(cell_string_to_value("2020-04-25T12:34:56+2").0.is_nan());
    }

    #[test]
    fn test_dotted_dates() {
        assert_eq!(cell_string_to_value("25.04.2020"), (APRIL_25_2020, DateOnly));
        assert_eq!(cell_string_to_value("Sa 25.4.2020"), (APRIL_25_2020, DateOnly));
        assert_eq!(
            cell_string_to_value("Sa, 25.04.2020 12:34"),
            (APRIL_25_2020 + 45_240.0, DateAndTime)
        );
        assert_eq!(
            cell_string_to_value("25.04.2020 12:34:56.5"),
            (APRIL_25_2020 + 45_296.5, DateAndTimeMillisecond)
        );
    }

    #[test]
    fn test_day_time() {
        assert_eq!(cell_string_to_value("12:34:56"), (45_296.0, DayTime));
        assert_eq!(cell_string_to_value("12:34"), (45_240.0, DayTime));
        assert_eq!(
            cell_string_to_value("00:00:01.125"),
            (1.125, DayTimeMillisecond)
        );
        assert_eq!(cell_string_to_value("12:34:56.000"), (45_296.0, DayTime));
        assert!(cell_string_to_value("25:00:00").0.is_nan());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(cell_string_to_value(" 42 "), (42.0, Unknown));
        assert_eq!(cell_string_to_value("-1.5e3"), (-1500.0, Unknown));
        assert_eq!(cell_string_to_value("3,25"), (3.25, Unknown));
        assert!(cell_string_to_value("1,234.5").0.is_nan());
        assert!(cell_string_to_value("1,2,3").0.is_nan());
    }

    #[test]
    fn test_not_a_value() {
        let (value, kind) = cell_string_to_value("not-a-date");
        assert!(value.is_nan());
        assert_eq!(kind, Unknown);
        assert!(cell_string_to_value("inf").0.is_nan());
        assert!(cell_string_to_value("").0.is_nan());
    }

    #[test]
    fn test_expand_within_domain() {
        assert_eq!(DateOnly.expand(DateAndTime), DateAndTime);
        assert_eq!(DateAndTime.expand(DateOnly), DateAndTime);
        assert_eq!(DateOnlyYearMonth.expand(DateOnly), DateOnly);
        assert_eq!(DayTime.expand(DayTimeMillisecond), DayTimeMillisecond);
        assert_eq!(DateAndTimeTz.expand(DateAndTimeMillisecondTz), DateAndTimeMillisecondTz);
    }

    #[test]
    fn test_expand_across_domains_is_ignored() {
        assert_eq!(DateOnly.expand(DateAndTimeTz), DateOnly);
        assert_eq!(DayTime.expand(DateAndTimeMillisecond), DayTime);
        assert_eq!(DateAndTimeTz.expand(DateAndTimeMillisecond), DateAndTimeTz);
        assert_eq!(Unknown.expand(DateOnly), Unknown);
        assert_eq!(DateOnly.expand(Unknown), DateOnly);
    }

    #[test]
    fn test_column_types() {
        let mut columns = ColumnTypes::new();
        columns.ingest(0, "2020-04-25");
        columns.ingest(0, "");
        columns.ingest(0, "2020-04-25T10:00:00.125");
        columns.ingest(1, "12:00");
        columns.ingest(1, "2020-04-25");
        columns.ingest(2, "abc");
        columns.ingest(2, "2020-04-25");

        assert_eq!(columns.len(), 3);
        assert_eq!(columns.get(0), DateAndTimeMillisecond);
        assert_eq!(columns.get(1), DayTime);
        assert_eq!(columns.get(2), Unknown);
        assert_eq!(columns.get(9), Unknown);
    }
}
