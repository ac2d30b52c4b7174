//! API version type and parsing
//!
//! Versions are calendar dates (`YYYY-MM-DD`). A client pinned to a date
//! receives the newest declared version released on or before that date.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// API version identified by its release date
///
/// Supports the format `2024-05-01` (leading and trailing whitespace is ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiVersion(NaiveDate);

impl ApiVersion {
    /// Create a version from year, month and day
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, VersionParseError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| VersionParseError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
    }

    /// Create a version from an existing date
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The release date of this version
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Self)
            .map_err(|_| VersionParseError::InvalidDate(s.to_string()))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// Empty version string
    #[error("empty version string")]
    Empty,
    /// Not a valid `YYYY-MM-DD` date
    #[error("invalid version \"{0}\", expected a date in YYYY-MM-DD format")]
    InvalidDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!(
            "2022-11-16".parse::<ApiVersion>().unwrap(),
            ApiVersion::new(2022, 11, 16).unwrap()
        );
        assert_eq!(
            "  2001-01-01 ".parse::<ApiVersion>().unwrap(),
            ApiVersion::new(2001, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_version_parsing_errors() {
        assert_eq!("".parse::<ApiVersion>(), Err(VersionParseError::Empty));
        assert_eq!("   ".parse::<ApiVersion>(), Err(VersionParseError::Empty));
        assert!("v1".parse::<ApiVersion>().is_err());
        assert!("2022-13-01".parse::<ApiVersion>().is_err());
        assert!("2022-02-30".parse::<ApiVersion>().is_err());
        assert!(ApiVersion::new(2023, 2, 29).is_err());
    }

    #[test]
    fn test_version_display() {
        assert_eq!(ApiVersion::new(2000, 1, 5).unwrap().to_string(), "2000-01-05");
    }

    #[test]
    fn test_version_serde() {
        let version = ApiVersion::new(2024, 3, 9).unwrap();
        let json = serde_json::to_value(version).unwrap();
        assert_eq!(json, serde_json::json!("2024-03-09"));
        assert_eq!(serde_json::from_value::<ApiVersion>(json).unwrap(), version);
        assert!(serde_json::from_value::<ApiVersion>(serde_json::json!("yesterday")).is_err());
    }

    proptest! {
        #[test]
        fn prop_ordering_follows_dates(a in 0u32..20_000, b in 0u32..20_000) {
            let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
            let da = base + chrono::Duration::days(a as i64);
            let db = base + chrono::Duration::days(b as i64);
            let va = ApiVersion::from_date(da);
            let vb = ApiVersion::from_date(db);
            prop_assert_eq!(va.cmp(&vb), da.cmp(&db));
            prop_assert_eq!(va.to_string().parse::<ApiVersion>().unwrap(), va);
        }
    }
}
