//! Session-token verification for embedded requests.
//!
//! The platform issues a short-lived signed token (a JWT) to the embedded
//! frontend on every page load, proving the current viewer's identity for
//! one shop. This module decodes and verifies those tokens and exposes the
//! claims the orchestrator needs.
//!
//! # Verification Rules
//!
//! - Only HS256 and HS512 signatures are accepted, keyed with the app's
//!   client secret.
//! - The configured clock drift is applied as leeway to both the `exp` and
//!   `nbf` checks (`nbf` validation is enabled, unlike the decoder's
//!   default).
//! - The `aud` claim must equal the app's client id.
//! - Claims are parsed into a strict structure; a missing required claim is
//!   a named [`AuthError`] variant, never a defaulted shop.
//!
//! # Shop Extraction
//!
//! The shop domain is taken from the `dest` claim with its URL scheme
//! stripped, falling back to the `sub` claim when `dest` is absent. The
//! extracted value is still untrusted text: the orchestrator validates it
//! against the configured domain allow-list before use.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopauth::auth::session_token::decode_session_token;
//!
//! let claims = decode_session_token(token, &config)?;
//! println!("shop: {}", claims.shop_domain()?);
//! ```

use crate::auth::error::AuthError;
use crate::config::AppConfig;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Claims of a verified session token.
///
/// Instances only exist after signature and time-window verification; the
/// claims of an unverified token are never surfaced.
///
/// # Thread Safety
///
/// `SessionTokenClaims` is `Send + Sync`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionTokenClaims {
    /// Audience. Must match the app's client id.
    pub aud: String,

    /// Destination shop, as a URL (e.g. `https://shop.myplatform.com`).
    pub dest: Option<String>,

    /// Subject. Carries the shop when `dest` is absent; a numeric value
    /// names the viewing user for online-token apps.
    pub sub: Option<String>,

    /// Expiration timestamp (Unix seconds).
    pub exp: i64,

    /// Not-before timestamp (Unix seconds).
    pub nbf: i64,

    /// Issued-at timestamp (Unix seconds).
    pub iat: i64,

    /// The viewer's locale, when the platform provides it.
    pub locale: Option<String>,

    /// The encoded admin host the app is embedded under.
    pub host: Option<String>,

    /// Platform session id, when present.
    pub sid: Option<String>,
}

impl SessionTokenClaims {
    /// Returns the shop domain, preferring `dest` and falling back to `sub`.
    ///
    /// The URL scheme and any trailing slash are stripped, so
    /// `https://x.myplatform.com/` yields `x.myplatform.com`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingClaim`] when neither claim is present.
    pub fn shop_domain(&self) -> Result<String, AuthError> {
        self.dest
            .as_deref()
            .or(self.sub.as_deref())
            .map(|raw| strip_scheme(raw).to_string())
            .ok_or(AuthError::MissingClaim { claim: "dest" })
    }

    /// Returns the viewing user's id when `sub` is numeric.
    ///
    /// Apps configured for online tokens use this to derive the session id
    /// to look up; a non-numeric `sub` yields `None` and forces a fresh
    /// exchange.
    #[must_use]
    pub fn user_id(&self) -> Option<u64> {
        self.sub.as_deref().and_then(|sub| {
            if !sub.is_empty() && sub.chars().all(|c| c.is_ascii_digit()) {
                sub.parse().ok()
            } else {
                None
            }
        })
    }
}

// Verify SessionTokenClaims is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SessionTokenClaims>();
};

/// Decodes and verifies a session token.
///
/// # Errors
///
/// Each failure mode surfaces as its own [`AuthError`] variant:
/// [`InvalidSignature`](AuthError::InvalidSignature),
/// [`Expired`](AuthError::Expired),
/// [`NotYetValid`](AuthError::NotYetValid),
/// [`AudienceMismatch`](AuthError::AudienceMismatch),
/// [`MissingClaim`](AuthError::MissingClaim), or
/// [`Malformed`](AuthError::Malformed) for everything else.
pub fn decode_session_token(
    token: &str,
    config: &AppConfig,
) -> Result<SessionTokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS512];
    validation.leeway = config.allowed_clock_drift().as_secs();
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["exp", "nbf"]);
    // The audience is checked manually below so a mismatch gets its own
    // error kind.
    validation.validate_aud = false;

    let key = DecodingKey::from_secret(config.client_secret().as_ref().as_bytes());
    let data =
        decode::<SessionTokenClaims>(token, &key, &validation).map_err(map_decode_error)?;

    let claims = data.claims;
    if claims.aud != config.client_id().as_ref() {
        return Err(AuthError::AudienceMismatch);
    }

    Ok(claims)
}

/// Maps decoder failures onto the crate's distinguishable error kinds.
fn map_decode_error(error: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::ImmatureSignature => AuthError::NotYetValid,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => {
            AuthError::MissingClaim { claim: "exp" }
        }
        ErrorKind::MissingRequiredClaim(claim) if claim == "nbf" => {
            AuthError::MissingClaim { claim: "nbf" }
        }
        _ => AuthError::Malformed {
            reason: error.to_string(),
        },
    }
}

/// Strips a URL scheme and trailing slash from a claim value.
fn strip_scheme(raw: &str) -> &str {
    raw.strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw)
        .trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientId, ClientSecret};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    #[derive(Debug, Serialize)]
    struct TestClaims {
        aud: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        dest: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sub: Option<String>,
        exp: i64,
        nbf: i64,
        iat: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        host: Option<String>,
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    fn valid_claims() -> TestClaims {
        let now = now();
        TestClaims {
            aud: "test-client-id".to_string(),
            dest: Some("https://x.example.com".to_string()),
            sub: Some("12345".to_string()),
            exp: now + 300,
            nbf: now - 5,
            iat: now,
            locale: Some("en".to_string()),
            host: Some("encoded-host".to_string()),
        }
    }

    fn test_config(drift: Duration) -> AppConfig {
        AppConfig::builder()
            .client_id(ClientId::new("test-client-id").unwrap())
            .client_secret(ClientSecret::new("test-secret").unwrap())
            .allowed_shop_domains(["example.com"])
            .allowed_clock_drift(drift)
            .build()
            .unwrap()
    }

    fn sign(claims: &TestClaims, secret: &str, algorithm: Algorithm) -> String {
        let header = Header::new(algorithm);
        let key = EncodingKey::from_secret(secret.as_bytes());
        encode(&header, claims, &key).unwrap()
    }

    #[test]
    fn test_round_trip_extracts_shop_from_dest() {
        let config = test_config(Duration::from_secs(10));
        let token = sign(&valid_claims(), "test-secret", Algorithm::HS256);

        let claims = decode_session_token(&token, &config).unwrap();
        assert_eq!(claims.shop_domain().unwrap(), "x.example.com");
        assert_eq!(claims.locale.as_deref(), Some("en"));
        assert_eq!(claims.host.as_deref(), Some("encoded-host"));
    }

    #[test]
    fn test_falls_back_to_sub_when_dest_absent() {
        let config = test_config(Duration::from_secs(10));
        let mut claims = valid_claims();
        claims.dest = None;
        claims.sub = Some("x.example.com".to_string());
        let token = sign(&claims, "test-secret", Algorithm::HS256);

        let decoded = decode_session_token(&token, &config).unwrap();
        assert_eq!(decoded.shop_domain().unwrap(), "x.example.com");
    }

    #[test]
    fn test_missing_dest_and_sub_is_a_named_error() {
        let config = test_config(Duration::from_secs(10));
        let mut claims = valid_claims();
        claims.dest = None;
        claims.sub = None;
        let token = sign(&claims, "test-secret", Algorithm::HS256);

        let decoded = decode_session_token(&token, &config).unwrap();
        assert_eq!(
            decoded.shop_domain(),
            Err(AuthError::MissingClaim { claim: "dest" })
        );
    }

    #[test]
    fn test_hs512_tokens_are_accepted() {
        let config = test_config(Duration::from_secs(10));
        let token = sign(&valid_claims(), "test-secret", Algorithm::HS512);
        assert!(decode_session_token(&token, &config).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let config = test_config(Duration::from_secs(10));
        let token = sign(&valid_claims(), "other-secret", Algorithm::HS256);

        let result = decode_session_token(&token, &config);
        assert_eq!(result, Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_nbf_within_drift_is_accepted() {
        let config = test_config(Duration::from_secs(10));
        let mut claims = valid_claims();
        claims.nbf = now() + 5;
        let token = sign(&claims, "test-secret", Algorithm::HS256);

        assert!(decode_session_token(&token, &config).is_ok());
    }

    #[test]
    fn test_nbf_beyond_drift_is_not_yet_valid() {
        let config = test_config(Duration::from_secs(10));
        let mut claims = valid_claims();
        claims.nbf = now() + 15;
        let token = sign(&claims, "test-secret", Algorithm::HS256);

        let result = decode_session_token(&token, &config);
        assert_eq!(result, Err(AuthError::NotYetValid));
    }

    #[test]
    fn test_expired_token_is_distinct_error() {
        let config = test_config(Duration::from_secs(10));
        let mut claims = valid_claims();
        claims.exp = now() - 3600;
        let token = sign(&claims, "test-secret", Algorithm::HS256);

        let result = decode_session_token(&token, &config);
        assert_eq!(result, Err(AuthError::Expired));
    }

    #[test]
    fn test_expiry_within_drift_is_accepted() {
        let config = test_config(Duration::from_secs(10));
        let mut claims = valid_claims();
        claims.exp = now() - 5;
        let token = sign(&claims, "test-secret", Algorithm::HS256);

        assert!(decode_session_token(&token, &config).is_ok());
    }

    #[test]
    fn test_audience_mismatch_is_distinct_error() {
        let config = test_config(Duration::from_secs(10));
        let mut claims = valid_claims();
        claims.aud = "some-other-app".to_string();
        let token = sign(&claims, "test-secret", Algorithm::HS256);

        let result = decode_session_token(&token, &config);
        assert_eq!(result, Err(AuthError::AudienceMismatch));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let config = test_config(Duration::from_secs(10));
        let result = decode_session_token("not-a-token", &config);
        assert!(matches!(result, Err(AuthError::Malformed { .. })));
    }

    #[test]
    fn test_user_id_requires_numeric_sub() {
        let config = test_config(Duration::from_secs(10));

        let token = sign(&valid_claims(), "test-secret", Algorithm::HS256);
        let claims = decode_session_token(&token, &config).unwrap();
        assert_eq!(claims.user_id(), Some(12345));

        let mut non_numeric = valid_claims();
        non_numeric.sub = Some("x.example.com".to_string());
        let token = sign(&non_numeric, "test-secret", Algorithm::HS256);
        let claims = decode_session_token(&token, &config).unwrap();
        assert_eq!(claims.user_id(), None);
    }
}
