//! Authentication and token-exchange error types.
//!
//! The error types here map onto the crate's fatality boundaries:
//!
//! - [`AuthError`]: a session token failed verification. Non-fatal; the
//!   orchestrator answers with a bounce redirect.
//! - [`ExchangeError`]: a token-exchange round trip failed. Fatal to the
//!   initiating request only; always recoverable by the caller.
//! - [`CallbackError`]: an install/update callback was rejected or its
//!   exchange failed, with distinct variants per route.
//! - [`AuthRequestError`]: the request-fatal failures `authenticate` can
//!   surface (exchange or session-store trouble).
//!
//! # Example
//!
//! ```rust
//! use shopauth::auth::AuthError;
//!
//! let error = AuthError::Expired;
//! assert_eq!(error.to_string(), "session token has expired");
//! ```

use crate::error::ValidationError;
use crate::session_store::SessionStoreError;
use crate::transport::TransportError;
use thiserror::Error;

/// Reasons a session token fails verification.
///
/// Each failure mode is a distinct variant so that callers can log and
/// meter them separately; none of them is ever coerced into a defaulted
/// shop identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token was found on the request (neither the `id_token` parameter
    /// nor a bearer header).
    #[error("no session token on the request")]
    MissingToken,

    /// The token signature did not verify against the client secret.
    #[error("session token signature is invalid")]
    InvalidSignature,

    /// The token's `nbf` lies beyond the allowed clock drift.
    #[error("session token is not yet valid")]
    NotYetValid,

    /// The token's `exp` lies beyond the allowed clock drift.
    #[error("session token has expired")]
    Expired,

    /// The token's `aud` claim does not match the app's client id.
    #[error("session token audience does not match the app client id")]
    AudienceMismatch,

    /// A required claim is absent.
    #[error("session token is missing required claim '{claim}'")]
    MissingClaim {
        /// The claim that was expected.
        claim: &'static str,
    },

    /// The token could not be decoded at all.
    #[error("session token is malformed: {reason}")]
    Malformed {
        /// Decoder-level detail.
        reason: String,
    },
}

/// A failed token-exchange round trip.
///
/// Non-2xx responses and transport failures are deliberately the same type:
/// both are recoverable conditions the caller decides how to handle, and
/// neither is ever raised as a panic.
#[derive(Debug, Error)]
#[error("token exchange for shop '{shop}' failed: {kind}")]
pub struct ExchangeError {
    /// The shop the exchange was performed for.
    pub shop: String,

    /// What went wrong.
    #[source]
    pub kind: ExchangeErrorKind,
}

impl ExchangeError {
    /// Creates an exchange error for a shop.
    #[must_use]
    pub fn new(shop: impl Into<String>, kind: ExchangeErrorKind) -> Self {
        Self {
            shop: shop.into(),
            kind,
        }
    }
}

/// The underlying cause of an [`ExchangeError`].
#[derive(Debug, Error)]
pub enum ExchangeErrorKind {
    /// The request never produced an HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The platform answered with a non-2xx status.
    #[error("platform returned status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnostics.
        body: String,
    },

    /// The platform answered 2xx but the body violated the protocol.
    #[error("malformed token response: {reason}")]
    MalformedResponse {
        /// What was wrong with the body.
        reason: String,
    },

    /// Token exchange requires an embedded app.
    #[error("token exchange requires an embedded app configuration")]
    NotEmbeddedApp,
}

/// Errors raised by the install/update callback routes.
///
/// The exchange failures are wrapped per route so embedders can distinguish
/// a failed installation from a failed re-authorization.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The callback's query signature did not verify. Answer with 401.
    #[error("callback signature mismatch for shop '{shop}'")]
    SignatureMismatch {
        /// The shop parameter of the rejected callback.
        shop: String,
    },

    /// The `shop` parameter failed domain validation.
    #[error(transparent)]
    InvalidShop(#[from] ValidationError),

    /// A required callback parameter is absent.
    #[error("callback is missing required parameter '{name}'")]
    MissingParam {
        /// The parameter that was expected.
        name: &'static str,
    },

    /// The authorization-code exchange failed during installation.
    #[error("install failed: {0}")]
    Install(#[source] ExchangeError),

    /// The authorization-code exchange failed during an update.
    #[error("update failed: {0}")]
    Update(#[source] ExchangeError),

    /// Persisting the exchanged session failed.
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

impl CallbackError {
    /// The HTTP status an embedder should answer this error with.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::SignatureMismatch { .. } | Self::InvalidShop(_) => 401,
            Self::MissingParam { .. } => 400,
            Self::Install(_) | Self::Update(_) => 502,
            Self::Store(_) => 500,
        }
    }
}

/// Request-fatal failures of the embedded authentication flow.
///
/// Everything recoverable (missing, expired, or invalid tokens) becomes a
/// bounce outcome instead; only exchange and store trouble surfaces here.
#[derive(Debug, Error)]
pub enum AuthRequestError {
    /// The token exchange for a new session failed.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// The session store failed.
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthError>();
    assert_send_sync::<ExchangeError>();
    assert_send_sync::<CallbackError>();
    assert_send_sync::<AuthRequestError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_messages_are_distinct() {
        let variants = [
            AuthError::MissingToken,
            AuthError::InvalidSignature,
            AuthError::NotYetValid,
            AuthError::Expired,
            AuthError::AudienceMismatch,
            AuthError::MissingClaim { claim: "dest" },
            AuthError::Malformed {
                reason: "bad header".to_string(),
            },
        ];

        let messages: Vec<String> = variants.iter().map(ToString::to_string).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_exchange_error_includes_shop_and_status() {
        let error = ExchangeError::new(
            "my-store.myplatform.com",
            ExchangeErrorKind::Status {
                status: 401,
                body: "invalid client".to_string(),
            },
        );
        let message = error.to_string();
        assert!(message.contains("my-store.myplatform.com"));
        assert!(message.contains("401"));
    }

    #[test]
    fn test_callback_error_status_mapping() {
        let mismatch = CallbackError::SignatureMismatch {
            shop: "x".to_string(),
        };
        assert_eq!(mismatch.http_status(), 401);

        let missing = CallbackError::MissingParam { name: "code" };
        assert_eq!(missing.http_status(), 400);

        let exchange = ExchangeError::new(
            "x",
            ExchangeErrorKind::Status {
                status: 500,
                body: String::new(),
            },
        );
        assert_eq!(CallbackError::Install(exchange).http_status(), 502);
    }

    #[test]
    fn test_install_and_update_render_distinctly() {
        let make = || {
            ExchangeError::new(
                "x",
                ExchangeErrorKind::Status {
                    status: 500,
                    body: String::new(),
                },
            )
        };
        assert!(CallbackError::Install(make()).to_string().starts_with("install"));
        assert!(CallbackError::Update(make()).to_string().starts_with("update"));
    }
}
