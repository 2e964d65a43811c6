//! The server's local timezone, which decides when days and months start.

use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, OffsetResult, PrimitiveDateTimeExt, TimeZone, Tz};

use crate::Error;

/// A timezone for turning local calendar dates into instants and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTimezone {
    /// A timezone from the IANA database whose offset may change over the year, e.g. for
    /// daylight saving time.
    Named(&'static Tz),
    /// A timezone that is always the same offset from UTC.
    Fixed(UtcOffset),
}

impl LocalTimezone {
    /// Coordinated Universal Time.
    pub const UTC: Self = Self::Fixed(UtcOffset::UTC);

    /// The offset from UTC in effect at `instant`.
    pub fn offset_at(&self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            Self::Named(tz) => tz.get_offset_utc(&instant).to_utc(),
            Self::Fixed(offset) => *offset,
        }
    }

    /// `instant` as a local date and time.
    pub fn to_local(&self, instant: OffsetDateTime) -> OffsetDateTime {
        instant.to_offset(self.offset_at(instant))
    }

    /// The instant at which the local clock reads `date_time`.
    ///
    /// When the clocks go back and `date_time` happens twice, the earlier instant is used. When
    /// the clocks go forward and `date_time` is skipped, it is read with the offset from before
    /// the change.
    pub fn assume_local(&self, date_time: PrimitiveDateTime) -> OffsetDateTime {
        let tz = match self {
            Self::Named(tz) => *tz,
            Self::Fixed(offset) => return date_time.assume_offset(*offset),
        };

        match date_time.assume_timezone(tz) {
            OffsetResult::Some(instant) | OffsetResult::Ambiguous(instant, _) => instant,
            OffsetResult::None => {
                let offset_before = tz
                    .get_offset_utc(&(date_time.assume_utc() - Duration::DAY))
                    .to_utc();
                date_time.assume_offset(offset_before)
            }
        }
    }
}

/// Get the timezone for a canonical timezone name, e.g. "Asia/Kolkata".
///
/// Returns `None` if the timezone name is not known.
pub fn get_local_timezone(canonical_timezone: &str) -> Option<LocalTimezone> {
    time_tz::timezones::get_by_name(canonical_timezone).map(LocalTimezone::Named)
}

/// Like [get_local_timezone], but logs and returns [Error::InvalidTimezone] for unknown names.
pub(crate) fn local_timezone_or_error(canonical_timezone: &str) -> Result<LocalTimezone, Error> {
    get_local_timezone(canonical_timezone).ok_or_else(|| {
        tracing::error!("Could not find the timezone \"{canonical_timezone}\"");
        Error::InvalidTimezone(canonical_timezone.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use time::{UtcOffset, macros::datetime};

    use crate::Error;

    use super::{LocalTimezone, get_local_timezone, local_timezone_or_error};

    fn new_york() -> LocalTimezone {
        get_local_timezone("America/New_York").unwrap()
    }

    #[test]
    fn utc_has_zero_offset() {
        let utc = get_local_timezone("Etc/UTC").unwrap();

        assert_eq!(utc.offset_at(datetime!(2024-01-15 12:00 UTC)), UtcOffset::UTC);
        assert_eq!(utc.offset_at(datetime!(2024-07-15 12:00 UTC)), UtcOffset::UTC);
    }

    #[test]
    fn india_has_fixed_offset() {
        let kolkata = get_local_timezone("Asia/Kolkata").unwrap();

        assert_eq!(
            kolkata.offset_at(datetime!(2024-01-15 12:00 UTC)),
            UtcOffset::from_hms(5, 30, 0).unwrap()
        );
    }

    #[test]
    fn offset_follows_daylight_saving_time() {
        let tz = new_york();

        assert_eq!(
            tz.offset_at(datetime!(2024-01-15 12:00 UTC)),
            UtcOffset::from_hms(-5, 0, 0).unwrap()
        );
        assert_eq!(
            tz.offset_at(datetime!(2024-07-15 12:00 UTC)),
            UtcOffset::from_hms(-4, 0, 0).unwrap()
        );
    }

    #[test]
    fn assume_local_uses_offset_of_that_date() {
        let tz = new_york();

        assert_eq!(
            tz.assume_local(datetime!(2024-01-15 00:00)),
            datetime!(2024-01-15 05:00 UTC)
        );
        assert_eq!(
            tz.assume_local(datetime!(2024-07-15 00:00)),
            datetime!(2024-07-15 04:00 UTC)
        );
    }

    #[test]
    fn repeated_local_time_takes_the_earlier_instant() {
        // Clocks went back from 02:00 EDT to 01:00 EST on 2024-11-03.
        let got = new_york().assume_local(datetime!(2024-11-03 01:30));

        assert_eq!(got, datetime!(2024-11-03 05:30 UTC));
    }

    #[test]
    fn skipped_local_time_uses_offset_from_before_the_change() {
        // Clocks went forward from 02:00 EST to 03:00 EDT on 2024-03-10.
        let got = new_york().assume_local(datetime!(2024-03-10 02:30));

        assert_eq!(got, datetime!(2024-03-10 07:30 UTC));
    }

    #[test]
    fn fixed_timezone_ignores_the_date() {
        let tz = LocalTimezone::Fixed(UtcOffset::from_hms(5, 30, 0).unwrap());

        assert_eq!(
            tz.to_local(datetime!(2024-03-31 20:00 UTC)),
            datetime!(2024-04-01 01:30 +05:30)
        );
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            local_timezone_or_error("Middle/Earth"),
            Err(Error::InvalidTimezone("Middle/Earth".to_owned()))
        );
    }
}
