//! HMAC signature verification for inbound platform requests.
//!
//! The platform signs two kinds of inbound traffic differently:
//!
//! - **GET requests** (install/update callbacks, embedded-app loads) carry
//!   the signature in a query parameter and are verified against a
//!   canonicalized form of the remaining query string, hex-encoded.
//! - **POST requests** (webhook deliveries) carry the signature in a header
//!   and are verified against the raw, unparsed body bytes, base64-encoded.
//!
//! The encoding asymmetry and the GET canonicalization quirks below are
//! load-bearing compatibility behavior and must not be "cleaned up".
//!
//! # Canonicalization (GET)
//!
//! The signature parameter is `hmac` or, for legacy callers, `signature`;
//! whichever is present is removed before signing. Remaining parameters are
//! grouped by key in lexicographic order and serialized as `key=value`
//! fragments. Repeated keys emit one fragment per value, except the
//! literal key `ids`, which collapses to `ids=["v1", "v2"]` to match a
//! long-standing platform client bug. Fragments are joined with `&` when
//! the signature came in `hmac`, and with nothing at all when it came in
//! `signature`.
//!
//! # Security
//!
//! All signature comparisons are constant-time via [`subtle`]. The source
//! system compared with plain equality; that weakness is corrected here.
//!
//! # Example
//!
//! ```rust
//! use shopauth::auth::signature::{compute_query_signature, verify_query_signature};
//!
//! let secret = "s3cr3t";
//! let expected = compute_query_signature("a=1", secret);
//!
//! let query = vec![
//!     ("a".to_string(), "1".to_string()),
//!     ("hmac".to_string(), expected),
//! ];
//! assert!(verify_query_signature(&query, secret));
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Query parameter names that may carry the signature, in precedence order.
const SIGNATURE_PARAMS: [SignatureField; 2] = [SignatureField::Hmac, SignatureField::Signature];

/// Which query parameter carried the inbound signature.
///
/// The field determines the joiner used when reconstructing the canonical
/// string: `&` for [`Hmac`](Self::Hmac), nothing for
/// [`Signature`](Self::Signature).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureField {
    /// The `hmac` parameter (current form).
    Hmac,
    /// The `signature` parameter (legacy form).
    Signature,
}

impl SignatureField {
    /// Returns the query-parameter name of this field.
    #[must_use]
    pub const fn param_name(self) -> &'static str {
        match self {
            Self::Hmac => "hmac",
            Self::Signature => "signature",
        }
    }

    /// Returns the fragment joiner this field mandates.
    #[must_use]
    pub const fn joiner(self) -> &'static str {
        match self {
            Self::Hmac => "&",
            Self::Signature => "",
        }
    }
}

/// Computes the HMAC-SHA256 signature of a canonical query string.
///
/// The signature is returned as lowercase hexadecimal, the encoding the
/// platform uses for query-parameter signatures.
///
/// # Note
///
/// This function uses `expect()` internally but this will never panic
/// because HMAC-SHA256 accepts keys of any length.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_query_signature(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Computes the HMAC-SHA256 signature of raw body bytes.
///
/// The signature is returned as standard base64, the encoding the platform
/// uses in the `X-Platform-Hmac-Sha256` header on webhook deliveries. The
/// input is raw bytes, not a string, to preserve the exact payload without
/// UTF-8 interpretation.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_body_signature(body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Performs constant-time comparison of two strings.
///
/// Used for every signature comparison in this crate to prevent timing
/// side-channels. Handles differing lengths securely.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Reconstructs the canonical string the platform signed for a GET request.
///
/// `pairs` are the decoded query parameters, `field` the signature parameter
/// that was present (and is excluded from the output).
#[must_use]
pub fn canonical_query_string(pairs: &[(String, String)], field: SignatureField) -> String {
    // Group values per key; BTreeMap gives the lexicographic key order the
    // canonical form requires, and the Vec keeps repeated values in request
    // order.
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in pairs {
        if key == field.param_name() {
            continue;
        }
        grouped.entry(key.as_str()).or_default().push(value.as_str());
    }

    let mut fragments: Vec<String> = Vec::new();
    for (key, values) in grouped {
        if key == "ids" {
            // Workaround for a platform client bug: repeated `ids` values
            // are signed as a bracketed, quoted, comma-space-joined list.
            let quoted: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
            fragments.push(format!("ids=[{}]", quoted.join(", ")));
        } else {
            for value in values {
                fragments.push(format!("{key}={value}"));
            }
        }
    }

    fragments.join(field.joiner())
}

/// Verifies the query-parameter signature of a GET request.
///
/// Detects the signature field (`hmac` preferred over `signature`),
/// reconstructs the canonical string from the remaining parameters, and
/// compares the hex HMAC-SHA256 in constant time.
///
/// Returns `false` when no signature parameter is present. A mismatch is
/// not fatal at this layer; callers decide the consequence (401, bounce).
#[must_use]
pub fn verify_query_signature(pairs: &[(String, String)], secret: &str) -> bool {
    let Some((field, provided)) = detect_signature_field(pairs) else {
        return false;
    };

    let canonical = canonical_query_string(pairs, field);
    let computed = compute_query_signature(&canonical, secret);
    constant_time_compare(&computed, provided)
}

/// Verifies the raw-body signature of a POST request.
///
/// `provided` is the base64 signature taken from the request (typically the
/// `X-Platform-Hmac-Sha256` header).
#[must_use]
pub fn verify_body_signature(body: &[u8], provided: &str, secret: &str) -> bool {
    let computed = compute_body_signature(body, secret);
    constant_time_compare(&computed, provided)
}

/// Finds the signature parameter on a request, `hmac` taking precedence.
fn detect_signature_field(pairs: &[(String, String)]) -> Option<(SignatureField, &str)> {
    for field in SIGNATURE_PARAMS {
        if let Some((_, value)) = pairs.iter().find(|(key, _)| key == field.param_name()) {
            return Some((field, value.as_str()));
        }
    }
    None
}

// Internal hex encoding since we don't want to add another dependency
mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let bytes = bytes.as_ref();
        let mut result = String::with_capacity(bytes.len() * 2);
        for &byte in bytes {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }
}
