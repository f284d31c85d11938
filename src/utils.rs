use crate::error::{DayTrackerError, Result};
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Canonical storage format of a marked day.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Anything that can be reduced to a calendar day. Time-of-day is dropped.
pub trait IntoDay {
    fn into_day(self) -> NaiveDate;
}

impl IntoDay for NaiveDate {
    fn into_day(self) -> NaiveDate {
        self
    }
}

impl IntoDay for &NaiveDate {
    fn into_day(self) -> NaiveDate {
        *self
    }
}

impl IntoDay for NaiveDateTime {
    fn into_day(self) -> NaiveDate {
        self.date()
    }
}

/// Uses the calendar day in the timestamp's own offset.
impl<Tz: TimeZone> IntoDay for DateTime<Tz> {
    fn into_day(self) -> NaiveDate {
        self.date_naive()
    }
}

pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

pub fn parse_day_key(key: &str) -> Result<NaiveDate> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(DayTrackerError::InvalidDateKey(key.to_string()));
    }

    NaiveDate::parse_from_str(trimmed, DAY_KEY_FORMAT)
        .map_err(|_| DayTrackerError::InvalidDateKey(key.to_string()))
}

/// Parses either an RFC 3339 timestamp (truncated to its UTC day) or a bare
/// `YYYY-MM-DD` key.
pub fn parse_day_or_timestamp(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc).date_naive());
    }

    parse_day_key(trimmed).map_err(|_| DayTrackerError::InvalidTimestamp(value.to_string()))
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g.
/// `2024-03-01T00:00:00.000Z`.
pub fn format_timestamp_millis(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// UTC midnight of `date`.
pub fn day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

pub fn first_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    first_day_of_month(year, month)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// First day of the month `offset` months away from the month containing `date`.
pub fn shift_month_start(date: NaiveDate, offset: i32) -> Option<NaiveDate> {
    let start = first_day_of_month(date.year(), date.month())?;
    if offset >= 0 {
        start.checked_add_months(Months::new(offset.unsigned_abs()))
    } else {
        start.checked_sub_months(Months::new(offset.unsigned_abs()))
    }
}

/// Whole days from `from` to `to`; negative when `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// `M/D/YYYY`, the en-US short date used in status lines.
pub fn us_short_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}
