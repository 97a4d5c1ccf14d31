//! Session management for authenticated shops.
//!
//! This module provides the [`Session`] type representing an authenticated
//! connection to one shop, and the [`AccessTokenResponse`] wire type both
//! token-exchange protocols deserialize.
//!
//! # Session Identity
//!
//! Session ids are deterministic so that every component derives the same
//! key for the same shop/user pair:
//!
//! - offline (shop-level): `offline_<shop>`
//! - online (user-level): `<shop>_<user-id>`
//!
//! Between requests a session is owned exclusively by the configured
//! [`SessionStore`](crate::SessionStore); the orchestrator only holds it for
//! the duration of one request.

use crate::auth::{AccessScopes, AssociatedUser};
use crate::config::ShopDomain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated session for one shop.
///
/// Sessions hold the access token and metadata needed to call the platform
/// API on a shop's behalf. They can be either online (user-scoped, expiring)
/// or offline (shop-scoped, long-lived).
///
/// # Invariants
///
/// - `access_token` is never empty; the token-exchange layer rejects
///   responses that would violate this.
/// - `expires`, when present, was in the future at creation time.
///
/// # Thread Safety
///
/// `Session` is `Send + Sync` and serializable for external stores.
///
/// # Example
///
/// ```rust
/// use shopauth::{AccessScopes, Session, ShopDomain};
///
/// let allowed = vec!["myplatform.com".to_string()];
/// let shop = ShopDomain::parse("my-store.myplatform.com", &allowed).unwrap();
///
/// let session = Session::new(
///     Session::offline_id(&shop),
///     shop,
///     "access-token".to_string(),
///     "read_products".parse().unwrap(),
///     false,
///     None,
/// );
///
/// assert_eq!(session.id, "offline_my-store.myplatform.com");
/// assert!(session.is_active());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Deterministic identifier for this session.
    pub id: String,

    /// The shop this session is for.
    pub shop: ShopDomain,

    /// The access token for API authentication.
    pub access_token: String,

    /// The scopes granted to this session.
    pub scopes: AccessScopes,

    /// Whether this is an online (user-scoped) session.
    pub is_online: bool,

    /// When this session expires. Online sessions only.
    pub expires: Option<DateTime<Utc>>,

    /// The user this session is scoped to. Online sessions only.
    pub associated_user: Option<AssociatedUser>,
}

impl Session {
    /// Creates a new session with the specified parameters.
    #[must_use]
    pub const fn new(
        id: String,
        shop: ShopDomain,
        access_token: String,
        scopes: AccessScopes,
        is_online: bool,
        expires: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            shop,
            access_token,
            scopes,
            is_online,
            expires,
            associated_user: None,
        }
    }

    /// Derives the deterministic id of a shop's offline session.
    #[must_use]
    pub fn offline_id(shop: &ShopDomain) -> String {
        format!("offline_{}", shop.as_ref())
    }

    /// Derives the deterministic id of a user's online session for a shop.
    #[must_use]
    pub fn online_id(shop: &ShopDomain, user_id: u64) -> String {
        format!("{}_{user_id}", shop.as_ref())
    }

    /// Returns `true` if this session has expired.
    ///
    /// Sessions without an expiration time never expire.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if this session is usable: it has an access token and
    /// has not expired.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty() && !self.expired()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

/// Successful response body of the platform's token endpoint.
///
/// Shared by both grant protocols: the authorization-code exchange returns
/// only `access_token` and `scope`; the token-exchange grant additionally
/// returns `expires_in` and `associated_user` for online tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    /// The issued access token.
    pub access_token: String,

    /// Comma-separated scopes granted to the token.
    pub scope: AccessScopes,

    /// Seconds until the token expires. Online tokens only.
    pub expires_in: Option<i64>,

    /// Scopes the associated user holds. Online tokens only.
    pub associated_user_scope: Option<String>,

    /// The user the token is scoped to. Online tokens only.
    pub associated_user: Option<AssociatedUser>,
}
