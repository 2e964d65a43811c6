//! Calendar month ranges used to match expenses to budgets.
//!
//! A month is the half-open range `[first instant of the month, first instant of the next month)`
//! in the server's local timezone. Since timestamps are stored with whole-second precision, this
//! is the same set of expenses as the closed range ending at 23:59:59 on the last day of the
//! month, see [MonthRange::end_inclusive].

use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::{Error, timezone::LocalTimezone};

/// The range of instants that make up a calendar month in a particular timezone.
///
/// The start and end are each resolved with the offset in effect at that instant, so a month
/// that spans a daylight saving change is an hour shorter or longer than its days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    start: OffsetDateTime,
    next_month_start: OffsetDateTime,
    timezone: LocalTimezone,
}

impl MonthRange {
    /// Create the range for `month` of `year` where midnight is taken in `timezone`.
    ///
    /// # Errors
    /// Returns [Error::InvalidYear] if the year is outside of the range supported by [Date].
    pub fn new(year: i32, month: Month, timezone: LocalTimezone) -> Result<Self, Error> {
        let (next_year, next_month) = match month {
            Month::December => (year + 1, Month::January),
            month => (year, month.next()),
        };

        Ok(Self {
            start: first_instant_of(year, month, timezone)?,
            next_month_start: first_instant_of(next_year, next_month, timezone)?,
            timezone,
        })
    }

    /// The month that `instant` falls in when viewed in `timezone`.
    ///
    /// # Errors
    /// Returns [Error::InvalidYear] if the month is at the very end of the range supported by
    /// [Date].
    pub fn containing(instant: OffsetDateTime, timezone: LocalTimezone) -> Result<Self, Error> {
        let local = timezone.to_local(instant);

        Self::new(local.year(), local.month(), timezone)
    }

    /// The month before this one.
    ///
    /// # Errors
    /// Returns [Error::InvalidYear] if the month is at the very start of the range supported by
    /// [Date].
    pub fn previous(&self) -> Result<Self, Error> {
        let (year, month) = match self.month() {
            Month::January => (self.year() - 1, Month::December),
            month => (self.year(), month.previous()),
        };

        Self::new(year, month, self.timezone)
    }

    /// The first instant of the month.
    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// The first instant of the next month, i.e. the exclusive end of the range.
    pub fn end_exclusive(&self) -> OffsetDateTime {
        self.next_month_start
    }

    /// The last whole second of the month, 23:59:59 on the last day.
    pub fn end_inclusive(&self) -> OffsetDateTime {
        self.next_month_start - Duration::SECOND
    }

    /// The calendar year of the month.
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// The calendar month.
    pub fn month(&self) -> Month {
        self.start.month()
    }

    /// Whether `instant` falls within the month.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.next_month_start
    }
}

/// Convert a month number, 1 for January to 12 for December, into a [Month].
///
/// # Errors
/// Returns [Error::InvalidMonth] if `number` is outside of 1 to 12.
pub fn month_from_number(number: i64) -> Result<Month, Error> {
    u8::try_from(number)
        .ok()
        .and_then(|number| Month::try_from(number).ok())
        .ok_or(Error::InvalidMonth(number))
}

fn first_instant_of(
    year: i32,
    month: Month,
    timezone: LocalTimezone,
) -> Result<OffsetDateTime, Error> {
    let date =
        Date::from_calendar_date(year, month, 1).map_err(|_| Error::InvalidYear(year.into()))?;

    Ok(timezone.assume_local(PrimitiveDateTime::new(date, Time::MIDNIGHT)))
}
