//! Date, time and datetime values with partial precision
//!
//! A temporal literal records which components were actually written.
//! Ordering between two temporal values is decided on intervals: a value at
//! month precision covers the whole month, so `@2015 < @2015-06` has no
//! verdict while `@2015 < @2016-01` is true. `compare` returns `None` for
//! the no-verdict case, which the evaluator surfaces as an empty collection.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

/// Most precise component present in a temporal literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TemporalPrecision {
    /// Year only
    Year,
    /// Year and month
    Month,
    /// Full date
    Day,
    /// Date plus hour (or bare hour for times)
    Hour,
    /// Down to the minute
    Minute,
    /// Seconds, possibly fractional
    Second,
}

static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})(?:-(\d{2})(?:-(\d{2})(?:T(\d{2})(?::(\d{2})(?::(\d{2}(?:\.\d+)?))?)?(Z|[+-]\d{2}:\d{2})?)?)?)?$",
    )
    .expect("datetime pattern is valid")
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})(?::(\d{2})(?::(\d{2}(?:\.\d+)?))?)?$").expect("time pattern is valid")
});

/// A date or datetime with partial precision and optional timezone offset
#[derive(Debug, Clone, PartialEq)]
pub struct FpDateTime {
    text: String,
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<Decimal>,
    /// Timezone offset in minutes east of UTC; absent offsets compare as zero
    tz_minutes: Option<i32>,
}

impl FpDateTime {
    /// Parse a date or datetime literal (`2015`, `2015-02-04T14:34:28Z`).
    pub fn parse(text: &str) -> Option<Self> {
        let caps = DATETIME_RE.captures(text)?;
        let year: i32 = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2).map(|m| m.as_str().parse::<u32>()).transpose().ok()?;
        let day = caps.get(3).map(|m| m.as_str().parse::<u32>()).transpose().ok()?;
        let hour = caps.get(4).map(|m| m.as_str().parse::<u32>()).transpose().ok()?;
        let minute = caps.get(5).map(|m| m.as_str().parse::<u32>()).transpose().ok()?;
        let second = caps.get(6).map(|m| m.as_str().parse::<Decimal>()).transpose().ok()?;
        let tz_minutes = match caps.get(7) {
            Some(m) => Some(parse_offset(m.as_str())?),
            None => None,
        };

        let dt = FpDateTime {
            text: text.to_string(),
            year,
            month,
            day,
            hour,
            minute,
            second,
            tz_minutes,
        };
        dt.in_range().then_some(dt)
    }

    fn in_range(&self) -> bool {
        self.month.is_none_or(|m| (1..=12).contains(&m))
            && self.day.is_none_or(|d| (1..=31).contains(&d))
            && self.hour.is_none_or(|h| h < 24)
            && self.minute.is_none_or(|m| m < 60)
            && self.second.is_none_or(|s| s >= Decimal::ZERO && s < Decimal::from(60))
    }

    /// The precision actually written in the literal.
    pub fn precision(&self) -> TemporalPrecision {
        if self.second.is_some() {
            TemporalPrecision::Second
        } else if self.minute.is_some() {
            TemporalPrecision::Minute
        } else if self.hour.is_some() {
            TemporalPrecision::Hour
        } else if self.day.is_some() {
            TemporalPrecision::Day
        } else if self.month.is_some() {
            TemporalPrecision::Month
        } else {
            TemporalPrecision::Year
        }
    }

    /// True when the literal carries a time component.
    pub fn has_time(&self) -> bool {
        self.hour.is_some()
    }

    /// Original literal text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Inclusive start of the instant range this value covers, in
    /// milliseconds from the epoch, normalized to UTC.
    fn start_ms(&self) -> Decimal {
        let days = days_from_civil(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1));
        let mut ms = Decimal::from(days) * Decimal::from(86_400_000i64)
            + Decimal::from(self.hour.unwrap_or(0)) * Decimal::from(3_600_000)
            + Decimal::from(self.minute.unwrap_or(0)) * Decimal::from(60_000)
            + self.second.unwrap_or(Decimal::ZERO) * Decimal::from(1_000);
        if let Some(tz) = self.tz_minutes {
            ms -= Decimal::from(tz) * Decimal::from(60_000);
        }
        ms
    }

    /// Exclusive end of the covered range; equals `start_ms` at second
    /// precision (a point in time).
    fn end_ms(&self) -> Decimal {
        match self.precision() {
            TemporalPrecision::Year => {
                let days = days_from_civil(self.year + 1, 1, 1);
                offset_ms(Decimal::from(days) * Decimal::from(86_400_000i64), self.tz_minutes)
            }
            TemporalPrecision::Month => {
                let (y, m) = match self.month.unwrap_or(1) {
                    12 => (self.year + 1, 1),
                    m => (self.year, m + 1),
                };
                let days = days_from_civil(y, m, 1);
                offset_ms(Decimal::from(days) * Decimal::from(86_400_000i64), self.tz_minutes)
            }
            TemporalPrecision::Day => self.start_ms() + Decimal::from(86_400_000),
            TemporalPrecision::Hour => self.start_ms() + Decimal::from(3_600_000),
            TemporalPrecision::Minute => self.start_ms() + Decimal::from(60_000),
            TemporalPrecision::Second => self.start_ms(),
        }
    }

    /// Partial ordering: `None` when the covered ranges overlap without
    /// being identical, i.e. the precisions make the comparison ambiguous.
    pub fn compare(&self, other: &FpDateTime) -> Option<Ordering> {
        compare_ranges(
            self.start_ms(),
            self.end_ms(),
            other.start_ms(),
            other.end_ms(),
        )
    }

    /// Equivalence (`~`): same precision and equal range.
    pub fn equivalent(&self, other: &FpDateTime) -> bool {
        self.precision() == other.precision() && self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for FpDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A time-of-day value with partial precision
#[derive(Debug, Clone, PartialEq)]
pub struct FpTime {
    text: String,
    hour: u32,
    minute: Option<u32>,
    second: Option<Decimal>,
}

impl FpTime {
    /// Parse a time literal (`14`, `14:30`, `14:30:14.559`).
    pub fn parse(text: &str) -> Option<Self> {
        let caps = TIME_RE.captures(text)?;
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute = caps.get(2).map(|m| m.as_str().parse::<u32>()).transpose().ok()?;
        let second = caps.get(3).map(|m| m.as_str().parse::<Decimal>()).transpose().ok()?;
        if hour >= 24
            || minute.is_some_and(|m| m >= 60)
            || second.is_some_and(|s| s < Decimal::ZERO || s >= Decimal::from(60))
        {
            return None;
        }
        Some(FpTime {
            text: text.to_string(),
            hour,
            minute,
            second,
        })
    }

    /// The precision actually written.
    pub fn precision(&self) -> TemporalPrecision {
        if self.second.is_some() {
            TemporalPrecision::Second
        } else if self.minute.is_some() {
            TemporalPrecision::Minute
        } else {
            TemporalPrecision::Hour
        }
    }

    /// Original literal text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn start_ms(&self) -> Decimal {
        Decimal::from(self.hour) * Decimal::from(3_600_000)
            + Decimal::from(self.minute.unwrap_or(0)) * Decimal::from(60_000)
            + self.second.unwrap_or(Decimal::ZERO) * Decimal::from(1_000)
    }

    fn end_ms(&self) -> Decimal {
        match self.precision() {
            TemporalPrecision::Hour => self.start_ms() + Decimal::from(3_600_000),
            TemporalPrecision::Minute => self.start_ms() + Decimal::from(60_000),
            _ => self.start_ms(),
        }
    }

    /// Partial ordering with the same no-verdict rule as [`FpDateTime`].
    pub fn compare(&self, other: &FpTime) -> Option<Ordering> {
        compare_ranges(
            self.start_ms(),
            self.end_ms(),
            other.start_ms(),
            other.end_ms(),
        )
    }

    /// Equivalence (`~`): same precision and equal range.
    pub fn equivalent(&self, other: &FpTime) -> bool {
        self.precision() == other.precision() && self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for FpTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn offset_ms(ms: Decimal, tz_minutes: Option<i32>) -> Decimal {
    match tz_minutes {
        Some(tz) => ms - Decimal::from(tz) * Decimal::from(60_000),
        None => ms,
    }
}

fn parse_offset(text: &str) -> Option<i32> {
    if text == "Z" {
        return Some(0);
    }
    let sign = match text.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = text.get(1..3)?.parse().ok()?;
    let minutes: i32 = text.get(4..6)?.parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

fn compare_ranges(
    a_start: Decimal,
    a_end: Decimal,
    b_start: Decimal,
    b_end: Decimal,
) -> Option<Ordering> {
    if a_start == b_start && a_end == b_end {
        Some(Ordering::Equal)
    } else if a_end <= b_start && a_start < b_start {
        Some(Ordering::Less)
    } else if b_end <= a_start && b_start < a_start {
        Some(Ordering::Greater)
    } else {
        None
    }
}

/// Days from 1970-01-01 for a proleptic Gregorian civil date.
fn days_from_civil(year: i32, month: u32, day: u32) -> i64 {
    let y = i64::from(year) - i64::from(month <= 2);
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = (i64::from(month) + 9) % 12;
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_day_math() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(days_from_civil(1970, 1, 2), 1);
        assert_eq!(days_from_civil(1969, 12, 31), -1);
        assert_eq!(days_from_civil(2000, 3, 1), 11017);
    }

    #[test]
    fn equal_dates_compare_equal() {
        let a = FpDateTime::parse("2015-02-04").unwrap();
        let b = FpDateTime::parse("2015-02-04").unwrap();
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
    }

    #[test]
    fn mismatched_precision_has_no_verdict_when_ambiguous() {
        let year = FpDateTime::parse("2015").unwrap();
        let june = FpDateTime::parse("2015-06").unwrap();
        assert_eq!(year.compare(&june), None);
    }

    #[test]
    fn mismatched_precision_still_orders_disjoint_ranges() {
        let year = FpDateTime::parse("2015").unwrap();
        let later = FpDateTime::parse("2016-01").unwrap();
        assert_eq!(year.compare(&later), Some(Ordering::Less));
    }

    #[test]
    fn timezone_offsets_normalize() {
        let utc = FpDateTime::parse("2015-02-04T14:00:00Z").unwrap();
        let east = FpDateTime::parse("2015-02-04T15:00:00+01:00").unwrap();
        assert_eq!(utc.compare(&east), Some(Ordering::Equal));
        let west = FpDateTime::parse("2015-02-04T09:00:00-05:00").unwrap();
        assert_eq!(utc.compare(&west), Some(Ordering::Equal));
        assert!(FpDateTime::parse("2015-02-04T09:00:00-5:00").is_none());
    }

    #[test]
    fn time_ordering() {
        let a = FpTime::parse("12:00:00").unwrap();
        let b = FpTime::parse("14:30:00").unwrap();
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        let minute = FpTime::parse("12:00").unwrap();
        assert_eq!(a.compare(&minute), None);
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(FpDateTime::parse("2015-13").is_none());
        assert!(FpTime::parse("25:00").is_none());
    }
}
