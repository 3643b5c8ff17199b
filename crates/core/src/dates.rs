//! Canonical calendar dates (`YYYY-MM-DD`).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// A validated calendar date in canonical `YYYY-MM-DD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Parse a date, rejecting anything that is not exactly `YYYY-MM-DD`.
    pub fn parse(input: &str) -> Result<Self, DashboardError> {
        let bytes = input.as_bytes();
        let shaped = bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shaped {
            return Err(DashboardError::Validation(format!(
                "expected a date in YYYY-MM-DD format, got '{}'",
                input
            )));
        }

        NaiveDate::parse_from_str(input, CANONICAL_FORMAT)
            .map(CalendarDate)
            .map_err(|_| {
                DashboardError::Validation(format!("'{}' is not a valid calendar date", input))
            })
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CalendarDate::parse(s)
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = DashboardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CalendarDate::parse(&value)
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_date() {
        let date = CalendarDate::parse("2024-03-05").unwrap();
        assert_eq!(date.to_string(), "2024-03-05");
        assert_eq!(date.naive(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_parse_rejects_impossible_date() {
        let err = CalendarDate::parse("2024-13-40").unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));

        assert!(CalendarDate::parse("2023-02-29").is_err());
        assert!(CalendarDate::parse("2024-02-29").is_ok());
    }

    #[test]
    fn test_parse_rejects_non_canonical_shapes() {
        for input in [
            "",
            "2024-3-5",
            "03/05/2024",
            "2024/03/05",
            "20240305",
            " 2024-03-05",
            "+202-03-05",
        ] {
            assert!(CalendarDate::parse(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let date: CalendarDate = serde_json::from_str("\"2024-03-05\"").unwrap();
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-03-05\"");

        let bad: Result<CalendarDate, _> = serde_json::from_str("\"2024-13-40\"");
        assert!(bad.is_err());
    }
}
