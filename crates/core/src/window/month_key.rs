//! `YYYY-MM` month keys.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A month key could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid month key '{0}', expected YYYY-MM")]
pub struct MonthKeyError(pub String);

/// A validated `YYYY-MM` month key.
///
/// Only the key is validated. Record dates are compared to it as raw strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey(String);

impl MonthKey {
    /// Parses a `YYYY-MM` key with a month between 01 and 12.
    pub fn parse(key: &str) -> Result<Self, MonthKeyError> {
        let bytes = key.as_bytes();
        let shape_ok = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !shape_ok {
            return Err(MonthKeyError(key.to_string()));
        }

        let month: u32 = key[5..].parse().map_err(|_| MonthKeyError(key.to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError(key.to_string()));
        }

        Ok(Self(key.to_string()))
    }

    /// The month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the ISO date string falls in this month (string prefix match).
    #[must_use]
    pub fn contains(&self, date: &str) -> bool {
        date.starts_with(self.0.as_str())
    }

    /// Calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0[..4].parse().unwrap_or_default()
    }

    /// Calendar month (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0[5..].parse().unwrap_or(1)
    }

    /// First calendar day of the month.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1).unwrap_or_default()
    }

    /// Number of days in the month (28-31).
    #[must_use]
    pub fn days_in_month(&self) -> u32 {
        let (year, month) = if self.month() == 12 {
            (self.year() + 1, 1)
        } else {
            (self.year(), self.month() + 1)
        };
        let next = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default();
        let days = (next - self.first_day()).num_days();
        u32::try_from(days).unwrap_or(30)
    }

    /// The calendar date of `day` in this month, if it exists.
    #[must_use]
    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), day)
    }
}

/// Parses a strict `YYYY-MM-DD` date, as written by every form.
#[must_use]
pub fn parse_iso_date(date: &str) -> Option<NaiveDate> {
    if date.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2025-01")]
    #[case("2025-12")]
    #[case("1999-07")]
    fn test_parse_valid(#[case] key: &str) {
        assert_eq!(MonthKey::parse(key).unwrap().as_str(), key);
    }

    #[rstest]
    #[case("2025-13")]
    #[case("2025-00")]
    #[case("2025-1")]
    #[case("25-01")]
    #[case("2025/01")]
    #[case("")]
    #[case("2025-01-05")]
    fn test_parse_invalid(#[case] key: &str) {
        assert!(MonthKey::parse(key).is_err());
    }

    #[rstest]
    #[case("2024-02", 29)]
    #[case("2025-02", 28)]
    #[case("2025-04", 30)]
    #[case("2025-12", 31)]
    fn test_days_in_month(#[case] key: &str, #[case] days: u32) {
        assert_eq!(MonthKey::parse(key).unwrap().days_in_month(), days);
    }

    #[test]
    fn test_from_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(MonthKey::from_date(date).as_str(), "2025-03");
    }

    #[test]
    fn test_contains_is_prefix_match() {
        let key = MonthKey::parse("2025-05").unwrap();
        assert!(key.contains("2025-05-01"));
        assert!(key.contains("2025-05-31"));
        assert!(!key.contains("2025-06-01"));
        assert!(!key.contains("05-2025"));
        assert!(!key.contains(""));
    }

    #[rstest]
    #[case("2025-05-01", true)]
    #[case("2025-02-29", false)]
    #[case("2025-13-05", false)]
    #[case("2025-5-1", false)]
    #[case("", false)]
    fn test_parse_iso_date(#[case] date: &str, #[case] valid: bool) {
        assert_eq!(parse_iso_date(date).is_some(), valid);
    }

    #[test]
    fn test_serde_validates() {
        let key: MonthKey = serde_json::from_str("\"2025-08\"").unwrap();
        assert_eq!(key.month(), 8);
        assert!(serde_json::from_str::<MonthKey>("\"2025-13\"").is_err());
    }
}
