//! Platform API version handling.
//!
//! The platform releases new API versions quarterly and names them
//! `YYYY-MM`; a rolling `unstable` version exists for development. Versions
//! are opaque to this crate beyond format validation; they only select the
//! path of the platform's versioned API endpoints.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// A validated platform API version.
///
/// # Example
///
/// ```rust
/// use shopauth::ApiVersion;
///
/// let version: ApiVersion = "2025-01".parse().unwrap();
/// assert_eq!(version.as_ref(), "2025-01");
///
/// assert!("January".parse::<ApiVersion>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiVersion(String);

impl ApiVersion {
    /// The rolling development version.
    pub const UNSTABLE: &'static str = "unstable";

    /// Creates a validated API version from a `YYYY-MM` or `unstable` string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiVersion`] if the string matches
    /// neither format.
    pub fn new(version: impl Into<String>) -> Result<Self, ConfigError> {
        let version = version.into();
        if version == Self::UNSTABLE || Self::is_dated(&version) {
            Ok(Self(version))
        } else {
            Err(ConfigError::InvalidApiVersion { version })
        }
    }

    /// Returns the latest stable version this crate defaults to.
    #[must_use]
    pub fn latest() -> Self {
        Self("2025-07".to_string())
    }

    /// Returns `true` if this is a dated (stable) version.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.0 != Self::UNSTABLE
    }

    /// Checks the `YYYY-MM` shape with a valid month.
    fn is_dated(version: &str) -> bool {
        let Some((year, month)) = version.split_once('-') else {
            return false;
        };
        if year.len() != 4 || month.len() != 2 {
            return false;
        }
        if !year.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        matches!(month.parse::<u8>(), Ok(1..=12))
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::latest()
    }
}

impl AsRef<str> for ApiVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_dated_versions() {
        for input in ["2024-10", "2025-01", "2025-07"] {
            let version = ApiVersion::new(input).unwrap();
            assert_eq!(version.as_ref(), input);
            assert!(version.is_stable());
        }
    }

    #[test]
    fn test_accepts_unstable() {
        let version = ApiVersion::new("unstable").unwrap();
        assert!(!version.is_stable());
    }

    #[test]
    fn test_rejects_malformed_versions() {
        for input in ["", "2025", "2025-13", "2025-00", "25-01", "2025/01", "latest"] {
            assert!(ApiVersion::new(input).is_err(), "expected rejection for: {input}");
        }
    }

    #[test]
    fn test_latest_is_stable() {
        assert!(ApiVersion::latest().is_stable());
        assert_eq!(ApiVersion::default(), ApiVersion::latest());
    }

    #[test]
    fn test_parse_from_str() {
        let version: ApiVersion = "2025-04".parse().unwrap();
        assert_eq!(version.to_string(), "2025-04");
    }
}
