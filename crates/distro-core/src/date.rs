//! Calendar dates used as rate-limit buckets
//!
//! A `DistributionDate` is a calendar day with no time-of-day component.
//! Its only accepted text form is `YYYY-MM-DD`, so one day always maps to
//! one store key and one signed payload.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Text format of every date the module reads or writes
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reasons a date string is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("unparseable date '{0}'")]
    Unparseable(String),

    #[error("date '{0}' is not in canonical YYYY-MM-DD form")]
    NotCanonical(String),
}

/// A calendar day
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistributionDate(NaiveDate);

impl DistributionDate {
    /// Build from year, month and day; `None` if the day does not exist
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The UTC calendar day containing `time`
    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        Self(time.date_naive())
    }

    /// Parse the canonical `YYYY-MM-DD` form
    pub fn parse(s: &str) -> Result<Self, DateError> {
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|_| DateError::Unparseable(s.to_string()))?;
        let parsed = Self(date);
        if parsed.to_string() != s {
            return Err(DateError::NotCanonical(s.to_string()));
        }
        Ok(parsed)
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Add whole calendar months
    ///
    /// A day-of-month past the end of the target month rolls over into the
    /// next month instead of clamping: 2024-01-31 + 1 month is 2024-03-02.
    pub fn checked_add_months(&self, months: u32) -> Option<Self> {
        let month0 = i64::from(self.0.month0()) + i64::from(months);
        let year = i32::try_from(i64::from(self.0.year()) + month0 / 12).ok()?;
        let month = u32::try_from(month0 % 12).ok()? + 1;
        NaiveDate::from_ymd_opt(year, month, 1)?
            .checked_add_days(Days::new(u64::from(self.0.day() - 1)))
            .map(Self)
    }

    /// The previous calendar day
    pub fn pred(&self) -> Option<Self> {
        self.0.checked_sub_days(Days::new(1)).map(Self)
    }

    /// The next calendar day
    pub fn succ(&self) -> Option<Self> {
        self.0.checked_add_days(Days::new(1)).map(Self)
    }

    /// Signed number of days from `earlier` to `self`
    pub fn days_since(&self, earlier: &Self) -> i64 {
        (self.0 - earlier.0).num_days()
    }
}

impl fmt::Debug for DistributionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DistributionDate({})", self)
    }
}

impl fmt::Display for DistributionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for DistributionDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DistributionDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DistributionDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        let date = DistributionDate::parse("2024-09-15").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 9);
        assert_eq!(date.day(), 15);
        assert_eq!(date.to_string(), "2024-09-15");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            DistributionDate::parse("not-a-date"),
            Err(DateError::Unparseable(_))
        ));
        assert!(matches!(
            DistributionDate::parse("2024/09/15"),
            Err(DateError::Unparseable(_))
        ));
        assert!(matches!(
            DistributionDate::parse("2023-02-29"),
            Err(DateError::Unparseable(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert!(matches!(
            DistributionDate::parse("2024-9-5"),
            Err(DateError::NotCanonical(_)) | Err(DateError::Unparseable(_))
        ));
    }

    #[test]
    fn test_month_arithmetic_rolls_over() {
        let jan31 = DistributionDate::parse("2024-01-31").unwrap();
        assert_eq!(jan31.checked_add_months(1).unwrap().to_string(), "2024-03-02");
        assert_eq!(jan31.checked_add_months(12).unwrap().to_string(), "2025-01-31");
        assert_eq!(jan31.checked_add_months(13).unwrap().to_string(), "2025-03-03");

        let leap = DistributionDate::parse("2024-02-29").unwrap();
        assert_eq!(leap.checked_add_months(12).unwrap().to_string(), "2025-03-01");
        assert_eq!(leap.checked_add_months(48).unwrap().to_string(), "2028-02-29");

        let mid = DistributionDate::parse("2024-09-15").unwrap();
        assert_eq!(mid.checked_add_months(4).unwrap().to_string(), "2025-01-15");
        assert_eq!(mid.checked_add_months(0), Some(mid));
    }

    #[test]
    fn test_days_since() {
        let start = DistributionDate::parse("2024-09-15").unwrap();
        let end = DistributionDate::parse("2025-09-14").unwrap();
        assert_eq!(end.days_since(&start), 364);
        assert_eq!(start.days_since(&end), -364);
        assert_eq!(end.succ().unwrap().to_string(), "2025-09-15");
        assert_eq!(start.pred().unwrap().to_string(), "2024-09-14");
    }

    #[test]
    fn test_serde_as_string() {
        let date = DistributionDate::parse("2025-03-01").unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2025-03-01\"");
        let back: DistributionDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date);
    }
}
