//! Date and time display utilities.

use std::fmt;

use jiff::{Timestamp, civil::Date, tz::TimeZone};

/// A timestamp shown in a given zone as `YYYY-MM-DD HH:MM TZ`.
pub struct LocalDateTime<'a> {
    timestamp: &'a Timestamp,
    time_zone: TimeZone,
}

impl<'a> LocalDateTime<'a> {
    pub fn new(timestamp: &'a Timestamp, time_zone: &TimeZone) -> Self {
        Self {
            timestamp,
            time_zone: time_zone.clone(),
        }
    }

    /// Shows the timestamp in the system zone.
    pub fn system(timestamp: &'a Timestamp) -> Self {
        Self::new(timestamp, &TimeZone::system())
    }
}

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.timestamp
                .to_zoned(self.time_zone.clone())
                .strftime("%Y-%m-%d %H:%M %Z")
        )
    }
}

/// Heading for a day of the list, e.g. `Monday, 1 January 2024`.
pub struct DayHeading<'a>(pub &'a Date);

impl fmt::Display for DayHeading<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.strftime("%A, %-d %B %Y"))
    }
}
