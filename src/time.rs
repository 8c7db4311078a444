//! Points in time
//!
//! Every time-dependent derivation in the crate is evaluated against an explicit
//! [`PointInTime`] rather than the wall clock, so a whole pipeline run sees one
//! consistent "now".

use jiff::{Timestamp, civil::Date, tz::TimeZone};
use thiserror::Error;

/// Seconds in one day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Errors produced while parsing source date strings.
#[derive(Debug, Error)]
pub enum TimeError {
    /// The date string did not match the expected layout.
    #[error("malformed date {input:?}, expected {layout}")]
    Malformed {
        /// Offending input
        input: String,

        /// Human readable layout that was expected
        layout: &'static str,
    },

    /// The date components do not describe a real date or instant.
    #[error("invalid date {input:?}: {source}")]
    Invalid {
        /// Offending input
        input: String,

        /// Underlying calendar error
        source: jiff::Error,
    },
}

/// The instant and zone a pipeline run is evaluated at.
#[derive(Debug, Clone)]
pub struct PointInTime {
    now: Timestamp,
    time_zone: TimeZone,
}

impl PointInTime {
    /// Create a point in time from an explicit timestamp.
    pub fn new(now: Timestamp, time_zone: TimeZone) -> Self {
        Self { now, time_zone }
    }

    /// Capture the current wall clock.
    pub fn now(time_zone: TimeZone) -> Self {
        Self::new(Timestamp::now(), time_zone)
    }

    /// The instant.
    pub fn timestamp(&self) -> Timestamp {
        self.now
    }

    /// The zone used to interpret calendar dates.
    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    /// Seconds elapsed since `earlier`; negative when `earlier` is in the future.
    pub fn seconds_since(&self, earlier: Timestamp) -> i64 {
        self.now.as_second().saturating_sub(earlier.as_second())
    }
}

/// Parse a `D.M.YYYY` date as printed on paper coupons (e.g. `8.11.2024`).
///
/// # Errors
///
/// Returns [`TimeError::Malformed`] if the input is not three dot separated numbers
/// and [`TimeError::Invalid`] if they do not form a calendar date.
pub fn parse_dotted_date(input: &str) -> Result<Date, TimeError> {
    const LAYOUT: &str = "D.M.YYYY";

    let malformed = || TimeError::Malformed {
        input: input.to_string(),
        layout: LAYOUT,
    };

    let mut parts = input.trim().split('.');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    let day: i8 = day.parse().map_err(|_err| malformed())?;
    let month: i8 = month.parse().map_err(|_err| malformed())?;
    let year: i16 = year.parse().map_err(|_err| malformed())?;

    Date::new(year, month, day).map_err(|source| TimeError::Invalid {
        input: input.to_string(),
        source,
    })
}

/// Parse an ISO `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`TimeError::Invalid`] if the input is not a valid ISO 8601 date.
pub fn parse_iso_date(input: &str) -> Result<Date, TimeError> {
    input
        .trim()
        .parse::<Date>()
        .map_err(|source| TimeError::Invalid {
            input: input.to_string(),
            source,
        })
}

/// First second of `date` in `time_zone`.
///
/// # Errors
///
/// Returns [`TimeError::Invalid`] if the civil time cannot be resolved in the zone.
pub fn start_of_day(date: Date, time_zone: &TimeZone) -> Result<Timestamp, TimeError> {
    resolve(date, 0, 0, 0, time_zone)
}

/// Last second (23:59:59) of `date` in `time_zone`.
///
/// # Errors
///
/// Returns [`TimeError::Invalid`] if the civil time cannot be resolved in the zone.
pub fn end_of_day(date: Date, time_zone: &TimeZone) -> Result<Timestamp, TimeError> {
    resolve(date, 23, 59, 59, time_zone)
}

fn resolve(
    date: Date,
    hour: i8,
    minute: i8,
    second: i8,
    time_zone: &TimeZone,
) -> Result<Timestamp, TimeError> {
    date.at(hour, minute, second, 0)
        .to_zoned(time_zone.clone())
        .map(|zoned| zoned.timestamp())
        .map_err(|source| TimeError::Invalid {
            input: date.to_string(),
            source,
        })
}

/// Format a timestamp as `DD.MM.YYYY` in `time_zone`.
pub fn format_date(timestamp: Timestamp, time_zone: &TimeZone) -> String {
    let date = timestamp.to_zoned(time_zone.clone()).date();

    format!("{:02}.{:02}.{}", date.day(), date.month(), date.year())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_dotted_date_accepts_unpadded_parts() -> TestResult {
        let date = parse_dotted_date("8.11.2024")?;

        assert_eq!(date, Date::new(2024, 11, 8)?);

        Ok(())
    }

    #[test]
    fn parse_dotted_date_rejects_other_layouts() {
        assert!(matches!(
            parse_dotted_date("2024-11-08"),
            Err(TimeError::Malformed { .. })
        ));
        assert!(matches!(
            parse_dotted_date("1.2.3.4"),
            Err(TimeError::Malformed { .. })
        ));
    }

    #[test]
    fn parse_dotted_date_rejects_impossible_dates() {
        assert!(matches!(
            parse_dotted_date("31.02.2024"),
            Err(TimeError::Invalid { .. })
        ));
    }

    #[test]
    fn parse_iso_date_rejects_garbage() {
        assert!(parse_iso_date("next tuesday").is_err());
    }

    #[test]
    fn end_of_day_is_last_second() -> TestResult {
        let date = Date::new(2024, 11, 8)?;
        let start = start_of_day(date, &TimeZone::UTC)?;
        let end = end_of_day(date, &TimeZone::UTC)?;

        assert_eq!(end.as_second() - start.as_second(), SECONDS_PER_DAY - 1);

        Ok(())
    }

    #[test]
    fn format_date_pads_day_and_month() -> TestResult {
        let timestamp = end_of_day(Date::new(2024, 3, 5)?, &TimeZone::UTC)?;

        assert_eq!(format_date(timestamp, &TimeZone::UTC), "05.03.2024");

        Ok(())
    }

    #[test]
    fn seconds_since_is_negative_for_future() -> TestResult {
        let at = PointInTime::new(Timestamp::from_second(1_000)?, TimeZone::UTC);

        assert_eq!(at.seconds_since(Timestamp::from_second(400)?), 600);
        assert_eq!(at.seconds_since(Timestamp::from_second(1_600)?), -600);

        Ok(())
    }
}
