//! Helpers for the timestamps stored on expenses and budgets.
//!
//! Timestamps are kept in UTC with whole-second precision and stored as unix seconds, which keeps
//! range queries a plain integer comparison.

use rusqlite::{Row, types::Type};
use time::{
    Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::well_known::Rfc3339,
    macros::{format_description, time},
};

use crate::{Error, timezone::LocalTimezone};

/// Which end of the day a bare `YYYY-MM-DD` date refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    /// Midnight at the start of the day.
    Start,
    /// The last second of the day, 23:59:59.
    End,
}

/// The current time in UTC, truncated to the second.
pub fn now() -> OffsetDateTime {
    truncate_to_second(OffsetDateTime::now_utc())
}

/// Drop the sub-second part of `date_time`.
pub fn truncate_to_second(date_time: OffsetDateTime) -> OffsetDateTime {
    date_time - Duration::nanoseconds(i64::from(date_time.nanosecond()))
}

/// Parse either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
///
/// Bare dates are interpreted in `timezone` at the start or end of the day depending on
/// `boundary`, using the offset in effect on that day. The result is always in UTC and truncated to the second.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is in neither format.
pub fn parse_timestamp(
    text: &str,
    boundary: DayBoundary,
    timezone: LocalTimezone,
) -> Result<OffsetDateTime, Error> {
    let text = text.trim();

    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(truncate_to_second(date_time.to_offset(UtcOffset::UTC)));
    }

    let date = Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDate(text.to_owned()))?;

    let time_of_day = match boundary {
        DayBoundary::Start => Time::MIDNIGHT,
        DayBoundary::End => time!(23:59:59),
    };

    Ok(timezone
        .assume_local(PrimitiveDateTime::new(date, time_of_day))
        .to_offset(UtcOffset::UTC))
}

/// Read a timestamp that was stored as unix seconds.
pub fn timestamp_from_column(row: &Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    let seconds: i64 = row.get(index)?;

    OffsetDateTime::from_unix_timestamp(seconds).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}
