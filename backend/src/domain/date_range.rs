//! Date-range validation for audit queries.
//!
//! Inputs are literal `YYYY-MM-DD` strings; validation is deterministic
//! and never consults the wall clock.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::error::{DateField, ValidationError};

/// A validated, immutable `from..to` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
    day_count: i64,
}

impl DateRange {
    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Whole days between `from` and `to` (0 for a single-day range).
    pub fn day_count(&self) -> i64 {
        self.day_count
    }

    /// Lower query bound: `from` at midnight UTC.
    pub fn start_instant(&self) -> DateTime<Utc> {
        start_of_day(self.from)
    }

    /// Upper query bound: `to` at midnight UTC, compared inclusively.
    pub fn end_instant(&self) -> DateTime<Utc> {
        start_of_day(self.to)
    }
}

/// Half-open window `[date 00:00, next day 00:00)` selecting exactly one
/// calendar day's records.
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDate::MAX);
    (start_of_day(date), start_of_day(next))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Clone, Copy)]
pub struct DateRangeValidator {
    max_historical_days: i64,
}

impl DateRangeValidator {
    pub fn new(max_historical_days: i64) -> Self {
        Self { max_historical_days }
    }

    /// Validate a `from`/`to` pair.
    ///
    /// Fails with `INVALID_DATE_FORMAT` (naming the offending field),
    /// `INVALID_DATE_RANGE` when `from > to`, or `RANGE_TOO_LARGE` when
    /// the span exceeds the configured historical window.
    pub fn validate(&self, from: &str, to: &str) -> Result<DateRange, ValidationError> {
        let from = parse_strict(from)
            .ok_or(ValidationError::InvalidDateFormat { field: DateField::From })?;
        let to = parse_strict(to)
            .ok_or(ValidationError::InvalidDateFormat { field: DateField::To })?;

        if from > to {
            return Err(ValidationError::InvalidDateRange);
        }

        let day_count = (to - from).num_days();
        if day_count > self.max_historical_days {
            return Err(ValidationError::RangeTooLarge {
                max_days: self.max_historical_days,
            });
        }

        Ok(DateRange { from, to, day_count })
    }

    /// Validate a single date (the daily-summary case): the same routine
    /// with `from == to`, but format failures name the `date` field.
    pub fn validate_single(&self, date: &str) -> Result<NaiveDate, ValidationError> {
        match self.validate(date, date) {
            Ok(range) => Ok(range.from()),
            Err(ValidationError::InvalidDateFormat { .. }) => {
                Err(ValidationError::InvalidDateFormat { field: DateField::Date })
            }
            Err(other) => Err(other),
        }
    }
}

/// Parse a date that matches `YYYY-MM-DD` exactly and names a real
/// calendar day. Chrono alone would accept variants like `2026-1-5`.
fn parse_strict(input: &str) -> Option<NaiveDate> {
    let bytes = input.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}
