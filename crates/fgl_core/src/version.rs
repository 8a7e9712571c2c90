//! Language version marker.
//!
//! Grammar productions and completion rules carry a minimum version; a
//! construct is active when `min_version <= active`. Versions are written as
//! `major.minor` with a two-digit minor part (`"2.50"`, `"3.20"`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A `major.minor` language version. Ordering is lexicographic on
/// `(major, minor)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct LanguageVersion {
    pub major: u16,
    pub minor: u16,
}

impl LanguageVersion {
    pub const V2_10: LanguageVersion = LanguageVersion::new(2, 10);
    pub const V2_20: LanguageVersion = LanguageVersion::new(2, 20);
    pub const V2_30: LanguageVersion = LanguageVersion::new(2, 30);
    pub const V2_40: LanguageVersion = LanguageVersion::new(2, 40);
    pub const V2_50: LanguageVersion = LanguageVersion::new(2, 50);
    pub const V3_00: LanguageVersion = LanguageVersion::new(3, 0);
    pub const V3_10: LanguageVersion = LanguageVersion::new(3, 10);
    pub const V3_20: LanguageVersion = LanguageVersion::new(3, 20);
    pub const V4_00: LanguageVersion = LanguageVersion::new(4, 0);

    /// The oldest version the front end understands. Rules without an
    /// explicit minimum version use this.
    pub const BASELINE: LanguageVersion = Self::V2_10;
    /// The newest version the front end understands.
    pub const LATEST: LanguageVersion = Self::V4_00;

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Whether something introduced in `self` is available when `active` is
    /// the running language version.
    #[inline]
    pub fn is_available_in(self, active: LanguageVersion) -> bool {
        self <= active
    }
}

impl Default for LanguageVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

/// Error returned when a version string is not `major[.minor]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid language version '{text}' (expected major.minor, e.g. 3.20)")]
pub struct VersionParseError {
    pub text: String,
}

impl FromStr for LanguageVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError {
            text: s.to_string(),
        };
        let trimmed = s.trim();
        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed, "0"),
        };
        let major = major.parse::<u16>().map_err(|_| err())?;
        if minor.is_empty() || minor.len() > 2 {
            return Err(err());
        }
        let mut minor_value = minor.parse::<u16>().map_err(|_| err())?;
        // "2.5" means 2.50
        if minor.len() == 1 {
            minor_value *= 10;
        }
        Ok(LanguageVersion::new(major, minor_value))
    }
}

impl Serialize for LanguageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LanguageVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
