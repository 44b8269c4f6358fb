//! Timestamp value object with calendar-aware arithmetic.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps an existing chrono DateTime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner chrono DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Calendar-aware month addition.
    ///
    /// Clamps to the last valid day of the target month, so
    /// Jan 31 + 1 month = Feb 28 (or 29 in a leap year).
    pub fn add_months(&self, months: u32) -> Self {
        match self.0.checked_add_months(Months::new(months)) {
            Some(dt) => Self(dt),
            // Only reachable at the far edge of the representable range.
            None => *self,
        }
    }

    /// Calendar-aware year addition.
    ///
    /// Feb 29 + 1 year lands on Feb 28 of the non-leap target year.
    pub fn add_years(&self, years: u32) -> Self {
        self.add_months(years * 12)
    }

    /// Returns the later of the two timestamps.
    pub fn max(self, other: Self) -> Self {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    #[test]
    fn add_months_regular() {
        assert_eq!(ts(2024, 3, 15).add_months(1), ts(2024, 4, 15));
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        assert_eq!(ts(2024, 1, 31).add_months(1), ts(2024, 2, 29));
        assert_eq!(ts(2023, 1, 31).add_months(1), ts(2023, 2, 28));
        assert_eq!(ts(2024, 3, 31).add_months(1), ts(2024, 4, 30));
    }

    #[test]
    fn add_months_crosses_year_boundary() {
        assert_eq!(ts(2024, 12, 10).add_months(1), ts(2025, 1, 10));
    }

    #[test]
    fn add_years_leap_day_clamps() {
        assert_eq!(ts(2024, 2, 29).add_years(1), ts(2025, 2, 28));
    }

    #[test]
    fn add_years_regular() {
        assert_eq!(ts(2024, 6, 1).add_years(1), ts(2025, 6, 1));
    }

    #[test]
    fn max_picks_later() {
        let a = ts(2024, 1, 1);
        let b = ts(2024, 6, 1);
        assert_eq!(a.max(b), b);
        assert_eq!(b.max(a), b);
    }
}
