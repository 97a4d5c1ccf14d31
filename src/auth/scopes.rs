//! Access-scope handling.
//!
//! This module provides the [`AccessScopes`] type for managing the scope set
//! granted to a session, including parsing and implied-scope handling.

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A set of access scopes granted to a session.
///
/// This type handles parsing, deduplication, and implied-scope logic:
/// `write_products` implies `read_products`, so the read scope is expanded
/// automatically when parsing.
///
/// # Serialization
///
/// `AccessScopes` serializes to and deserializes from a comma-separated
/// string, matching the `scope` field of the platform's token responses:
///
/// ```rust
/// use shopauth::AccessScopes;
///
/// let scopes: AccessScopes = "write_orders".parse().unwrap();
/// let json = serde_json::to_string(&scopes).unwrap();
/// assert_eq!(json, "\"read_orders,write_orders\"");
/// ```
///
/// # Example
///
/// ```rust
/// use shopauth::AccessScopes;
///
/// let scopes: AccessScopes = "read_products, write_orders".parse().unwrap();
/// let required: AccessScopes = "read_orders".parse().unwrap();
/// assert!(scopes.covers(&required));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AccessScopes {
    scopes: BTreeSet<String>,
}

impl AccessScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns `true` if this scope set covers all scopes in `other`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.iter().all(|s| self.scopes.contains(s))
    }

    /// Returns an iterator over the scopes in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    /// Adds implied scopes: `write_foo` implies `read_foo`.
    fn add_implied_scopes(&mut self) {
        let implied: Vec<String> = self
            .scopes
            .iter()
            .filter_map(|scope| {
                scope
                    .strip_prefix("write_")
                    .map(|rest| format!("read_{rest}"))
            })
            .collect();

        for scope in implied {
            self.scopes.insert(scope);
        }
    }
}

impl FromStr for AccessScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();

        for scope in s.split(',') {
            let scope = scope.trim();
            if scope.is_empty() {
                continue;
            }
            if scope.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("scope '{scope}' contains whitespace"),
                });
            }
            scopes.insert(scope.to_string());
        }

        let mut result = Self { scopes };
        result.add_implied_scopes();
        Ok(result)
    }
}

impl fmt::Display for AccessScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

impl Serialize for AccessScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccessScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
