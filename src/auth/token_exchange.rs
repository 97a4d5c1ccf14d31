//! Token exchange against the platform's OAuth endpoint.
//!
//! Two grant protocols obtain API access tokens, both as JSON POSTs to
//! `https://<shop>/admin/oauth/access_token`:
//!
//! - [`exchange_code`]: the authorization-code grant used by the
//!   install/update callback routes: `{client_id, client_secret, code}`.
//! - [`exchange_session_token`]: the RFC 8693 token-exchange grant used by
//!   embedded requests: a verified session token is exchanged for an online
//!   or offline access token without any redirect round trip.
//!
//! # Token Kinds
//!
//! - **Online tokens** are scoped to the viewing user and expire; the
//!   response carries `expires_in` and an `associated_user`, and the session
//!   id is derived from shop and user.
//! - **Offline tokens** are scoped to the shop and long-lived; the session
//!   id is the deterministic `offline_<shop>`.
//!
//! # Failure Semantics
//!
//! Non-2xx statuses, transport failures, and protocol-violating bodies are
//! all the recoverable [`ExchangeError`]; the caller decides whether to
//! fail the request or retry. Nothing in this module panics.

use crate::auth::error::{ExchangeError, ExchangeErrorKind};
use crate::auth::session::{AccessTokenResponse, Session};
use crate::config::{AppConfig, ShopDomain};
use crate::transport::Transport;
use chrono::{Duration, Utc};
use serde_json::json;

/// Grant type for token exchange (RFC 8693).
const TOKEN_EXCHANGE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// Subject token type for platform session tokens (ID tokens).
const ID_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:id_token";

/// The kind of access token requested from a token exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedTokenKind {
    /// User-scoped token that expires.
    Online,
    /// Shop-scoped token, long-lived.
    Offline,
}

impl RequestedTokenKind {
    /// Returns the wire value for the `requested_token_type` field.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Online => "online-access-token",
            Self::Offline => "offline-access-token",
        }
    }
}

/// Exchanges an authorization code for an offline-shaped session.
///
/// Used by the install/update callback routes after their query signature
/// has been verified. The response carries only `access_token` and `scope`;
/// the resulting session is shop-scoped with the deterministic offline id.
///
/// # Errors
///
/// Returns [`ExchangeError`] for transport failures, non-2xx statuses, and
/// protocol-violating response bodies.
pub async fn exchange_code(
    config: &AppConfig,
    transport: &dyn Transport,
    shop: &ShopDomain,
    code: &str,
) -> Result<Session, ExchangeError> {
    let body = json!({
        "client_id": config.client_id().as_ref(),
        "client_secret": config.client_secret().as_ref(),
        "code": code,
    });

    let response = post_token_request(transport, shop, &body).await?;
    Ok(offline_session(shop, response))
}

/// Exchanges a verified session token for an access token.
///
/// Implements the RFC 8693 token-exchange grant. The caller must have
/// verified the session token first; this function forwards it verbatim as
/// the subject token.
///
/// # Errors
///
/// Returns [`ExchangeError`] for transport failures, non-2xx statuses,
/// protocol-violating response bodies, and when the app is not configured
/// as embedded (token exchange only exists for embedded apps).
pub async fn exchange_session_token(
    config: &AppConfig,
    transport: &dyn Transport,
    shop: &ShopDomain,
    session_token: &str,
    kind: RequestedTokenKind,
) -> Result<Session, ExchangeError> {
    if !config.is_embedded_app() {
        return Err(ExchangeError::new(
            shop.as_ref(),
            ExchangeErrorKind::NotEmbeddedApp,
        ));
    }

    let body = json!({
        "client_id": config.client_id().as_ref(),
        "client_secret": config.client_secret().as_ref(),
        "grant_type": TOKEN_EXCHANGE_GRANT_TYPE,
        "subject_token": session_token,
        "subject_token_type": ID_TOKEN_TYPE,
        "requested_token_type": kind.as_wire(),
    });

    let response = post_token_request(transport, shop, &body).await?;

    match kind {
        RequestedTokenKind::Offline => Ok(offline_session(shop, response)),
        RequestedTokenKind::Online => online_session(shop, response),
    }
}

/// POSTs a grant body to the shop's token endpoint and parses the response.
async fn post_token_request(
    transport: &dyn Transport,
    shop: &ShopDomain,
    body: &serde_json::Value,
) -> Result<AccessTokenResponse, ExchangeError> {
    let url = format!("https://{}/admin/oauth/access_token", shop.as_ref());

    let response = transport
        .post(&url, body, &[])
        .await
        .map_err(|e| ExchangeError::new(shop.as_ref(), e.into()))?;

    if !response.is_success() {
        return Err(ExchangeError::new(
            shop.as_ref(),
            ExchangeErrorKind::Status {
                status: response.status,
                body: response.body,
            },
        ));
    }

    let parsed: AccessTokenResponse =
        serde_json::from_str(&response.body).map_err(|e| malformed(shop, e.to_string()))?;

    if parsed.access_token.is_empty() {
        return Err(malformed(shop, "empty access token".to_string()));
    }

    Ok(parsed)
}

/// Builds the shop-scoped session both offline-producing grants yield.
fn offline_session(shop: &ShopDomain, response: AccessTokenResponse) -> Session {
    Session::new(
        Session::offline_id(shop),
        shop.clone(),
        response.access_token,
        response.scope,
        false,
        None,
    )
}

/// Builds a user-scoped session from an online token response.
///
/// Online responses must name the user and a positive lifetime; a session
/// is never created with an expiry that is already in the past.
fn online_session(
    shop: &ShopDomain,
    response: AccessTokenResponse,
) -> Result<Session, ExchangeError> {
    let user = response
        .associated_user
        .ok_or_else(|| malformed(shop, "online token response missing associated_user".to_string()))?;

    let expires_in = response
        .expires_in
        .filter(|secs| *secs > 0)
        .ok_or_else(|| malformed(shop, "online token response missing a positive expires_in".to_string()))?;

    let mut session = Session::new(
        Session::online_id(shop, user.id),
        shop.clone(),
        response.access_token,
        response.scope,
        true,
        Some(Utc::now() + Duration::seconds(expires_in)),
    );
    session.associated_user = Some(user);
    Ok(session)
}

fn malformed(shop: &ShopDomain, reason: String) -> ExchangeError {
    ExchangeError::new(
        shop.as_ref(),
        ExchangeErrorKind::MalformedResponse { reason },
    )
}
