use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime};

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Days per year used when converting elapsed days into fractional years.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), ISO_DATE).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

pub fn format_date(date: Date) -> String {
    date.format(ISO_DATE)
        .unwrap_or_else(|_| String::from("<unformattable>"))
}

/// Current UTC calendar date.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Absolute distance between two dates in whole days.
pub fn days_between(a: Date, b: Date) -> i64 {
    (a - b).whole_days().abs()
}

/// Shift a date back by whole calendar years, clamping Feb 29 to Feb 28.
pub fn years_before(date: Date, years: i32) -> Date {
    let year = date.year() - years;
    date.replace_year(year).unwrap_or_else(|_| {
        Date::from_calendar_date(year, Month::February, 28).unwrap_or(Date::MIN)
    })
}

/// Serde adapter for `YYYY-MM-DD` dates.
pub mod iso_date {
    use super::*;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format_date(*date).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse_date(&value).map_err(D::Error::custom)
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedDateRange {
                start: format_date(start),
                end: format_date(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Intersect with `bounds`; `None` when the ranges do not overlap.
    pub fn clamp_to(&self, bounds: DateRange) -> Option<DateRange> {
        let start = self.start.max(bounds.start);
        let end = self.end.min(bounds.end);
        (start <= end).then_some(DateRange { start, end })
    }
}
