//! Crate-level error types.
//!
//! This module contains the errors raised while constructing configuration
//! ([`ConfigError`]) and while validating untrusted request inputs
//! ([`ValidationError`]).
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation: a missing credential is an error at startup, never
//! at request time. `ValidationError` is the request-time counterpart and is
//! always recoverable: callers answer it with a bounce or a 401, never a
//! crash.
//!
//! # Example
//!
//! ```rust
//! use shopauth::{ClientId, ConfigError};
//!
//! let result = ClientId::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyClientId)));
//! ```

use thiserror::Error;

/// Errors that can occur while building an [`AppConfig`](crate::AppConfig).
///
/// Each variant carries a clear, actionable message. Configuration errors
/// are fatal at construction time and are never deferred to request time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Client id cannot be empty.
    #[error("Client id cannot be empty. Provide the app's client id issued by the platform.")]
    EmptyClientId,

    /// Client secret cannot be empty.
    #[error("Client secret cannot be empty. Provide the app's client secret issued by the platform.")]
    EmptyClientSecret,

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM' (e.g., '2025-01') or 'unstable'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Endpoint URL is invalid.
    #[error("Invalid endpoint URL '{url}'. Provide a valid URL with scheme (e.g., 'https://myapp.example.com').")]
    InvalidEndpointUrl {
        /// The invalid URL that was provided.
        url: String,
    },
}

/// Errors raised while validating untrusted request inputs.
///
/// Validation failures are non-fatal: the orchestrator answers them with a
/// bounce redirect or a 401 response for the offending request and carries
/// on serving other tenants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The shop identifier did not match any allowed platform domain.
    #[error("Invalid shop domain '{domain}'. Expected '<name>.<allowed-suffix>' or an admin-console store URL.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_client_id_error_message() {
        let error = ConfigError::EmptyClientId;
        let message = error.to_string();
        assert!(message.contains("Client id cannot be empty"));
    }

    #[test]
    fn test_invalid_shop_domain_error_message() {
        let error = ValidationError::InvalidShopDomain {
            domain: "bad domain!".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("bad domain!"));
        assert!(message.contains("allowed-suffix"));
    }

    #[test]
    fn test_missing_required_field_error_message() {
        let error = ConfigError::MissingRequiredField { field: "client_id" };
        let message = error.to_string();
        assert!(message.contains("client_id"));
        assert!(message.contains("must be set"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let _: &dyn std::error::Error = &ConfigError::EmptyClientId;
        let _: &dyn std::error::Error = &ValidationError::InvalidShopDomain {
            domain: "x".to_string(),
        };
    }
}
