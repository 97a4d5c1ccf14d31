//! Inbound webhook verification.
//!
//! The platform signs every webhook delivery with HMAC-SHA256 over the raw
//! request body, base64-encoded into the `X-Platform-Hmac-Sha256` header.
//! [`verify_webhook`] checks that signature in constant time and, on
//! success, exposes the delivery metadata headers as a [`WebhookContext`].
//!
//! # Example
//!
//! ```rust
//! use shopauth::{AppConfig, ClientId, ClientSecret, InboundRequest};
//! use shopauth::auth::signature::compute_body_signature;
//! use shopauth::webhooks::{verify_webhook, HEADER_WEBHOOK_SIGNATURE, HEADER_TOPIC};
//!
//! let config = AppConfig::builder()
//!     .client_id(ClientId::new("client-id").unwrap())
//!     .client_secret(ClientSecret::new("secret").unwrap())
//!     .allowed_shop_domains(["myplatform.com"])
//!     .build()
//!     .unwrap();
//!
//! let body = br#"{"id": 1}"#;
//! let signature = compute_body_signature(body, "secret");
//!
//! let request = InboundRequest::new("/webhooks")
//!     .with_body(body.to_vec())
//!     .with_header(HEADER_WEBHOOK_SIGNATURE, signature)
//!     .with_header(HEADER_TOPIC, "orders/create");
//!
//! let context = verify_webhook(&config, &request).unwrap();
//! assert_eq!(context.topic(), Some("orders/create"));
//! ```

use crate::auth::signature::verify_body_signature;
use crate::config::AppConfig;
use crate::request::InboundRequest;
use crate::webhooks::errors::WebhookError;

/// Header carrying the base64 HMAC-SHA256 of the request body.
pub const HEADER_WEBHOOK_SIGNATURE: &str = "X-Platform-Hmac-Sha256";

/// Header carrying the topic of the delivery (e.g. `orders/create`).
pub const HEADER_TOPIC: &str = "X-Platform-Topic";

/// Header carrying the shop domain the delivery is for.
pub const HEADER_SHOP_DOMAIN: &str = "X-Platform-Shop-Domain";

/// Header carrying the API version the payload was rendered with.
pub const HEADER_API_VERSION: &str = "X-Platform-Api-Version";

/// Header carrying the unique delivery id, useful for idempotency.
pub const HEADER_WEBHOOK_ID: &str = "X-Platform-Webhook-Id";

/// Metadata of a verified webhook delivery.
///
/// Only produced by [`verify_webhook`]; holding one means the body
/// signature checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookContext {
    topic: Option<String>,
    shop_domain: Option<String>,
    api_version: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookContext {
    /// The delivery's topic, when the header was present.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// The shop the delivery is for, when the header was present.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    /// The API version of the payload, when the header was present.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// The unique delivery id, when the header was present.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

/// Verifies an inbound webhook delivery.
///
/// # Errors
///
/// - [`WebhookError::MissingSignature`] when the signature header is absent.
/// - [`WebhookError::InvalidSignature`] when the body signature does not
///   verify; callers should answer with 401.
pub fn verify_webhook(
    config: &AppConfig,
    request: &InboundRequest,
) -> Result<WebhookContext, WebhookError> {
    let provided = request
        .header(HEADER_WEBHOOK_SIGNATURE)
        .ok_or(WebhookError::MissingSignature)?;

    if !verify_body_signature(request.body(), provided, config.client_secret().as_ref()) {
        return Err(WebhookError::InvalidSignature);
    }

    Ok(WebhookContext {
        topic: request.header(HEADER_TOPIC).map(ToString::to_string),
        shop_domain: request.header(HEADER_SHOP_DOMAIN).map(ToString::to_string),
        api_version: request.header(HEADER_API_VERSION).map(ToString::to_string),
        webhook_id: request.header(HEADER_WEBHOOK_ID).map(ToString::to_string),
    })
}
