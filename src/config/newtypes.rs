//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear
//! error messages.

use crate::error::{ConfigError, ValidationError};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated app client id.
///
/// This newtype ensures the client id is non-empty and provides type safety
/// to prevent accidental misuse of raw strings.
///
/// # Example
///
/// ```rust
/// use shopauth::ClientId;
///
/// let id = ClientId::new("my-client-id").unwrap();
/// assert_eq!(id.as_ref(), "my-client-id");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientId(String);

impl ClientId {
    /// Creates a new validated client id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyClientId`] if the id is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ConfigError::EmptyClientId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated app client secret.
///
/// This newtype ensures the secret is non-empty and masks its value in
/// debug output to prevent accidental exposure in logs.
///
/// # Security
///
/// The `Debug` implementation masks the secret value, displaying only
/// `ClientSecret(*****)` instead of the actual key.
///
/// # Example
///
/// ```rust
/// use shopauth::ClientSecret;
///
/// let secret = ClientSecret::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ClientSecret(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    /// Creates a new validated client secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyClientSecret`] if the secret is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptyClientSecret);
        }
        Ok(Self(secret))
    }
}

impl AsRef<str> for ClientSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(*****)")
    }
}

/// A validated shop domain.
///
/// A shop is a tenant of the embedding application, identified by a domain
/// under one of the platform suffixes the app allows (configured via
/// [`AppConfigBuilder::allowed_shop_domains`](crate::AppConfigBuilder::allowed_shop_domains)).
///
/// # Accepted Forms
///
/// - A direct shop domain: `name.<allowed-suffix>`, where `name` starts with
///   an ASCII alphanumeric character and continues with alphanumerics,
///   hyphens, or underscores. A trailing `/` is tolerated and stripped.
/// - An admin-console store URL: `[scheme://]admin.<host>/store/<handle>[/]`,
///   normalized to `<handle>.<primary-suffix>` where the primary suffix is
///   the first entry in the allow-list.
///
/// Anything else is an explicit [`ValidationError::InvalidShopDomain`],
/// never an empty success.
///
/// # Serialization
///
/// `ShopDomain` serializes to the plain domain string. Deserialization
/// validates shape only (a persisted session is trusted); allow-list
/// enforcement happens at [`ShopDomain::parse`].
///
/// # Example
///
/// ```rust
/// use shopauth::ShopDomain;
///
/// let allowed = vec!["myplatform.com".to_string()];
///
/// let shop = ShopDomain::parse("my-store.myplatform.com", &allowed).unwrap();
/// assert_eq!(shop.as_ref(), "my-store.myplatform.com");
///
/// // Admin-console URLs normalize to the direct form.
/// let shop = ShopDomain::parse("https://admin.platform.com/store/my-store", &allowed).unwrap();
/// assert_eq!(shop.as_ref(), "my-store.myplatform.com");
///
/// assert!(ShopDomain::parse("my-store.evil.com", &allowed).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Parses and validates a shop identifier against the allowed suffixes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidShopDomain`] if the input matches
    /// neither recognized shape.
    pub fn parse(input: impl Into<String>, allowed_suffixes: &[String]) -> Result<Self, ValidationError> {
        let input = input.into();
        let candidate = input.trim().trim_end_matches('/');

        if let Some(domain) = Self::match_direct(candidate, allowed_suffixes) {
            return Ok(Self(domain));
        }

        if let Some(domain) = Self::match_admin_url(candidate, allowed_suffixes) {
            return Ok(Self(domain));
        }

        Err(ValidationError::InvalidShopDomain { domain: input })
    }

    /// Returns the shop-name portion of the domain.
    ///
    /// For `my-store.myplatform.com`, this returns `my-store`.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Matches the direct `name.<suffix>` form. Returns the domain unchanged.
    fn match_direct(candidate: &str, allowed_suffixes: &[String]) -> Option<String> {
        for suffix in allowed_suffixes {
            if let Some(name) = candidate
                .strip_suffix(suffix.as_str())
                .and_then(|rest| rest.strip_suffix('.'))
            {
                if Self::is_valid_shop_name(name) {
                    return Some(candidate.to_string());
                }
            }
        }
        None
    }

    /// Matches the admin-console form and maps it onto the primary suffix.
    fn match_admin_url(candidate: &str, allowed_suffixes: &[String]) -> Option<String> {
        let primary = allowed_suffixes.first()?;

        let without_scheme = candidate
            .strip_prefix("https://")
            .or_else(|| candidate.strip_prefix("http://"))
            .unwrap_or(candidate);

        if !without_scheme.starts_with("admin.") {
            return None;
        }

        let (_, rest) = without_scheme.split_once("/store/")?;
        let handle = rest.split('/').next().unwrap_or(rest);
        if Self::is_valid_shop_name(handle) {
            return Some(format!("{handle}.{primary}"));
        }
        None
    }

    fn is_valid_shop_name(name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_ascii_alphanumeric() {
            return false;
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    /// Shape check used by deserialization, where no allow-list is in scope.
    fn is_plausible_domain(candidate: &str) -> bool {
        match candidate.split_once('.') {
            Some((name, suffix)) => {
                Self::is_valid_shop_name(name)
                    && !suffix.is_empty()
                    && suffix
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            }
            None => false,
        }
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if Self::is_plausible_domain(&s) {
            Ok(Self(s))
        } else {
            Err(de::Error::custom(format!("invalid shop domain '{s}'")))
        }
    }
}

/// A validated endpoint URL for the application.
///
/// This is the public base URL of the embedding application, used to build
/// webhook callback URLs. The URL must carry a scheme.
///
/// # Example
///
/// ```rust
/// use shopauth::EndpointUrl;
///
/// let url = EndpointUrl::new("https://myapp.example.com").unwrap();
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.join("/webhooks"), "https://myapp.example.com/webhooks");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointUrl {
    url: String,
    scheme_end: usize,
}

impl EndpointUrl {
    /// Creates a new validated endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpointUrl`] if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().to_string();

        let scheme_end = url
            .find("://")
            .ok_or_else(|| ConfigError::InvalidEndpointUrl { url: url.clone() })?;

        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidEndpointUrl { url });
        }

        let host_start = scheme_end + 3;
        if host_start >= url.len() {
            return Err(ConfigError::InvalidEndpointUrl { url });
        }

        Ok(Self { url, scheme_end })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Joins a path onto the base URL, normalizing the separating slash.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl AsRef<str> for EndpointUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
