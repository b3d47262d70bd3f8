//! ISO week keys, the partition key of persisted state

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Canonical ISO-week identifier, rendered as `YYYY-Www` (e.g. `2024-W17`)
///
/// Ordering is chronological: by ISO year, then by week number. The year is
/// the ISO week-numbering year, which differs from the calendar year for a
/// few days around New Year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    year: i32,
    week: u32,
}

impl WeekKey {
    /// Create a week key, validating that the week exists in that ISO year
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_domain::WeekKey;
    ///
    /// let key = WeekKey::new(2024, 17).unwrap();
    /// assert_eq!(key.to_string(), "2024-W17");
    /// assert!(WeekKey::new(2024, 54).is_err());
    /// ```
    pub fn new(year: i32, week: u32) -> Result<Self, String> {
        if NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
            return Err(format!("ISO year {} has no week {}", year, week));
        }
        Ok(Self { year, week })
    }

    /// The ISO week containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// ISO week-numbering year
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Week number (1–53)
    pub fn week(&self) -> u32 {
        self.week
    }

    /// Monday of this week
    pub fn monday(&self) -> NaiveDate {
        // Validated in the constructors
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Sunday of this week, used as the report's "week ending" date
    pub fn sunday(&self) -> NaiveDate {
        self.monday() + Duration::days(6)
    }

    /// The week immediately before this one
    pub fn previous(&self) -> Self {
        Self::from_date(self.monday() - Duration::days(7))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, week) = s
            .trim()
            .split_once("-W")
            .ok_or_else(|| format!("Expected format YYYY-Www, got '{}'", s))?;
        let year: i32 = year
            .parse()
            .map_err(|e| format!("Invalid year in '{}': {}", s, e))?;
        let week: u32 = week
            .parse()
            .map_err(|e| format!("Invalid week in '{}': {}", s, e))?;
        Self::new(year, week)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let key: WeekKey = "2024-W07".parse().unwrap();
        assert_eq!(key.year(), 2024);
        assert_eq!(key.week(), 7);
        assert_eq!(key.to_string(), "2024-W07");
    }

    #[test]
    fn test_invalid_keys() {
        assert!("2024-17".parse::<WeekKey>().is_err());
        assert!("2024-W00".parse::<WeekKey>().is_err());
        assert!("2023-W53".parse::<WeekKey>().is_err());
        assert!("abcd-W01".parse::<WeekKey>().is_err());
    }

    #[test]
    fn test_iso_year_boundary() {
        // 2024-12-30 is a Monday belonging to ISO week 1 of 2025
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(WeekKey::from_date(date).to_string(), "2025-W01");

        // 2021-01-03 is a Sunday still in 2020-W53
        let date = NaiveDate::from_ymd_opt(2021, 1, 3).unwrap();
        assert_eq!(WeekKey::from_date(date).to_string(), "2020-W53");
    }

    #[test]
    fn test_ordering_across_years() {
        let a: WeekKey = "2023-W52".parse().unwrap();
        let b: WeekKey = "2024-W01".parse().unwrap();
        let c: WeekKey = "2024-W10".parse().unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_previous_and_bounds() {
        let key: WeekKey = "2025-W01".parse().unwrap();
        assert_eq!(key.previous().to_string(), "2024-W52");
        assert_eq!(key.monday(), NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
        assert_eq!(key.sunday(), NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
    }

    #[test]
    fn test_serde_as_string() {
        let key: WeekKey = "2024-W17".parse().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2024-W17\"");
        let back: WeekKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
