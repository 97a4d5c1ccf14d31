//! Webhook configuration and subscription types.
//!
//! The desired webhook set is static per-app configuration: a mapping from
//! topic name to an optional per-topic [`WebhookRegistration`], with
//! [`WebhookDefaults`] filling in whatever a topic leaves unspecified.

use serde::{Deserialize, Serialize};

/// Payload format of a webhook subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookFormat {
    /// JSON payloads.
    #[default]
    Json,
    /// XML payloads.
    Xml,
}

impl WebhookFormat {
    /// Returns the wire value the platform API expects.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
        }
    }
}

/// Per-topic delivery configuration.
///
/// Both fields are optional; an unset field falls back to the corresponding
/// [`WebhookDefaults`] field at reconciliation time.
///
/// # Example
///
/// ```rust
/// use shopauth::webhooks::{WebhookFormat, WebhookRegistration};
///
/// // Everything from defaults:
/// let plain = WebhookRegistration::default();
/// assert!(plain.path.is_none());
///
/// // Topic-specific callback path:
/// let orders = WebhookRegistration::at_path("/webhooks/orders").format(WebhookFormat::Json);
/// assert_eq!(orders.path.as_deref(), Some("/webhooks/orders"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WebhookRegistration {
    /// Callback path, joined onto the app's endpoint URL.
    pub path: Option<String>,
    /// Payload format.
    pub format: Option<WebhookFormat>,
}

impl WebhookRegistration {
    /// Creates a registration with a topic-specific callback path.
    #[must_use]
    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            format: None,
        }
    }

    /// Sets the payload format.
    #[must_use]
    pub const fn format(mut self, format: WebhookFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Fallback delivery configuration for topics without overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookDefaults {
    /// Default callback path.
    pub path: String,
    /// Default payload format.
    pub format: WebhookFormat,
}

impl Default for WebhookDefaults {
    fn default() -> Self {
        Self {
            path: "/webhooks".to_string(),
            format: WebhookFormat::Json,
        }
    }
}

/// A webhook subscription that exists on the platform.
///
/// Created by the reconciler and never mutated afterwards; this crate has
/// no update or delete path for subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSubscription {
    /// Platform-assigned subscription id.
    pub id: String,
    /// The topic, in the platform's API form.
    pub topic: String,
    /// Where deliveries are sent.
    #[serde(rename = "callbackUrl")]
    pub callback_url: String,
    /// Payload format.
    pub format: WebhookFormat,
}

/// Converts a topic name to the platform's API identifier form.
///
/// `orders/create` becomes `ORDERS_CREATE`; names already in API form pass
/// through unchanged. Comparisons between desired and current topics happen
/// in this form.
#[must_use]
pub fn topic_api_format(topic: &str) -> String {
    topic
        .chars()
        .map(|c| match c {
            '/' | '.' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}
