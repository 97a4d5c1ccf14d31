//! Configuration types for the embedded-app toolkit.
//!
//! This module provides the core configuration types used to initialize the
//! crate for one tenant application (per app, not per shop).
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`AppConfig`]: The main configuration struct holding all settings
//! - [`AppConfigBuilder`]: A builder for constructing [`AppConfig`] instances
//! - [`ClientId`]: A validated client id newtype
//! - [`ClientSecret`]: A validated client secret newtype with masked debug output
//! - [`ShopDomain`]: A validated shop domain
//! - [`EndpointUrl`]: A validated application endpoint URL
//! - [`ApiVersion`]: The platform API version to use
//!
//! # Example
//!
//! ```rust
//! use shopauth::{AppConfig, ClientId, ClientSecret};
//!
//! let config = AppConfig::builder()
//!     .client_id(ClientId::new("my-client-id").unwrap())
//!     .client_secret(ClientSecret::new("my-secret").unwrap())
//!     .allowed_shop_domains(["myplatform.com"])
//!     .build()
//!     .unwrap();
//!
//! assert!(config.is_embedded_app());
//! ```

mod newtypes;
mod version;

pub use newtypes::{ClientId, ClientSecret, EndpointUrl, ShopDomain};
pub use version::ApiVersion;

use crate::error::{ConfigError, ValidationError};
use crate::webhooks::{WebhookDefaults, WebhookRegistration};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default tolerance applied to session-token `nbf`/`exp` checks.
const DEFAULT_CLOCK_DRIFT: Duration = Duration::from_secs(10);

/// Default route the orchestrator bounces invalid-token requests to.
const DEFAULT_BOUNCE_PATH: &str = "/session-token-bounce";

/// Configuration for one tenant application.
///
/// This struct holds everything the crate needs to authenticate requests and
/// synchronize webhooks: API credentials, the allowed shop-domain suffixes,
/// token-type preferences, and the desired webhook set. It is constructed
/// once at startup and shared (typically via `Arc`) with every component.
/// There are no global or environment lookups at request time.
///
/// # Thread Safety
///
/// `AppConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Example
///
/// ```rust
/// use shopauth::{AppConfig, ClientId, ClientSecret};
///
/// let config = AppConfig::builder()
///     .client_id(ClientId::new("client-id").unwrap())
///     .client_secret(ClientSecret::new("secret").unwrap())
///     .allowed_shop_domains(["myplatform.com"])
///     .use_online_tokens(true)
///     .build()
///     .unwrap();
///
/// assert!(config.use_online_tokens());
/// ```
#[derive(Clone, Debug)]
pub struct AppConfig {
    client_id: ClientId,
    client_secret: ClientSecret,
    api_version: ApiVersion,
    endpoint_url: Option<EndpointUrl>,
    is_embedded_app: bool,
    use_online_tokens: bool,
    allowed_clock_drift: Duration,
    allowed_shop_domains: Vec<String>,
    bounce_path: String,
    desired_webhooks: BTreeMap<String, WebhookRegistration>,
    default_webhook_options: WebhookDefaults,
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Returns the client id.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Returns the client secret.
    #[must_use]
    pub const fn client_secret(&self) -> &ClientSecret {
        &self.client_secret
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the application endpoint URL, if configured.
    #[must_use]
    pub const fn endpoint_url(&self) -> Option<&EndpointUrl> {
        self.endpoint_url.as_ref()
    }

    /// Returns whether the app runs embedded in the platform admin.
    #[must_use]
    pub const fn is_embedded_app(&self) -> bool {
        self.is_embedded_app
    }

    /// Returns whether per-user (online) access tokens are requested.
    #[must_use]
    pub const fn use_online_tokens(&self) -> bool {
        self.use_online_tokens
    }

    /// Returns the tolerance applied to session-token time checks.
    #[must_use]
    pub const fn allowed_clock_drift(&self) -> Duration {
        self.allowed_clock_drift
    }

    /// Returns the allowed shop-domain suffixes.
    #[must_use]
    pub fn allowed_shop_domains(&self) -> &[String] {
        &self.allowed_shop_domains
    }

    /// Returns the route invalid-token requests are bounced to.
    #[must_use]
    pub fn bounce_path(&self) -> &str {
        &self.bounce_path
    }

    /// Returns the desired webhook subscriptions, keyed by topic.
    #[must_use]
    pub const fn desired_webhooks(&self) -> &BTreeMap<String, WebhookRegistration> {
        &self.desired_webhooks
    }

    /// Returns the fallback options for topics without overrides.
    #[must_use]
    pub const fn default_webhook_options(&self) -> &WebhookDefaults {
        &self.default_webhook_options
    }

    /// Validates a shop identifier against this app's allowed suffixes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidShopDomain`] if the input matches
    /// no allowed domain.
    pub fn parse_shop(&self, input: impl Into<String>) -> Result<ShopDomain, ValidationError> {
        ShopDomain::parse(input, &self.allowed_shop_domains)
    }
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

/// Builder for constructing [`AppConfig`] instances.
///
/// Required fields are `client_id`, `client_secret`, and a non-empty
/// `allowed_shop_domains` set. `endpoint_url` becomes required as soon as
/// webhooks are configured, because callback URLs are built from it.
///
/// # Defaults
///
/// - `api_version`: latest stable version
/// - `is_embedded_app`: `true`
/// - `use_online_tokens`: `false`
/// - `allowed_clock_drift`: 10 seconds
/// - `bounce_path`: `/session-token-bounce`
/// - `desired_webhooks`: empty
/// - `default_webhook_options`: `/webhooks`, JSON payloads
///
/// # Example
///
/// ```rust
/// use shopauth::{AppConfig, ApiVersion, ClientId, ClientSecret, EndpointUrl};
/// use shopauth::webhooks::WebhookRegistration;
///
/// let config = AppConfig::builder()
///     .client_id(ClientId::new("client-id").unwrap())
///     .client_secret(ClientSecret::new("secret").unwrap())
///     .allowed_shop_domains(["myplatform.com"])
///     .api_version(ApiVersion::new("2025-01").unwrap())
///     .endpoint_url(EndpointUrl::new("https://myapp.example.com").unwrap())
///     .desired_webhook("orders/create", WebhookRegistration::at_path("/webhooks/orders"))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.desired_webhooks().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    client_id: Option<ClientId>,
    client_secret: Option<ClientSecret>,
    api_version: Option<ApiVersion>,
    endpoint_url: Option<EndpointUrl>,
    is_embedded_app: Option<bool>,
    use_online_tokens: Option<bool>,
    allowed_clock_drift: Option<Duration>,
    allowed_shop_domains: Vec<String>,
    bounce_path: Option<String>,
    desired_webhooks: BTreeMap<String, WebhookRegistration>,
    default_webhook_options: Option<WebhookDefaults>,
}

impl AppConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client id (required).
    #[must_use]
    pub fn client_id(mut self, id: ClientId) -> Self {
        self.client_id = Some(id);
        self
    }

    /// Sets the client secret (required).
    #[must_use]
    pub fn client_secret(mut self, secret: ClientSecret) -> Self {
        self.client_secret = Some(secret);
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets the application endpoint URL.
    #[must_use]
    pub fn endpoint_url(mut self, url: EndpointUrl) -> Self {
        self.endpoint_url = Some(url);
        self
    }

    /// Sets whether the app is embedded in the platform admin.
    #[must_use]
    pub const fn is_embedded_app(mut self, embedded: bool) -> Self {
        self.is_embedded_app = Some(embedded);
        self
    }

    /// Sets whether per-user (online) access tokens are requested.
    #[must_use]
    pub const fn use_online_tokens(mut self, online: bool) -> Self {
        self.use_online_tokens = Some(online);
        self
    }

    /// Sets the tolerance applied to session-token time checks.
    #[must_use]
    pub const fn allowed_clock_drift(mut self, drift: Duration) -> Self {
        self.allowed_clock_drift = Some(drift);
        self
    }

    /// Sets the allowed shop-domain suffixes (required, non-empty).
    ///
    /// The first entry is the primary suffix, used when normalizing
    /// admin-console URLs to direct shop domains.
    #[must_use]
    pub fn allowed_shop_domains<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_shop_domains = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the route invalid-token requests are bounced to.
    #[must_use]
    pub fn bounce_path(mut self, path: impl Into<String>) -> Self {
        self.bounce_path = Some(path.into());
        self
    }

    /// Adds a desired webhook subscription for a topic.
    ///
    /// Adding the same topic twice replaces the earlier registration.
    #[must_use]
    pub fn desired_webhook(
        mut self,
        topic: impl Into<String>,
        registration: WebhookRegistration,
    ) -> Self {
        self.desired_webhooks.insert(topic.into(), registration);
        self
    }

    /// Sets the fallback options for topics without overrides.
    #[must_use]
    pub fn default_webhook_options(mut self, defaults: WebhookDefaults) -> Self {
        self.default_webhook_options = Some(defaults);
        self
    }

    /// Builds the [`AppConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `client_id` or
    /// `client_secret` are not set, if `allowed_shop_domains` is empty, or
    /// if webhooks are configured without an `endpoint_url`.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let client_id = self
            .client_id
            .ok_or(ConfigError::MissingRequiredField { field: "client_id" })?;
        let client_secret = self
            .client_secret
            .ok_or(ConfigError::MissingRequiredField {
                field: "client_secret",
            })?;

        if self.allowed_shop_domains.is_empty() {
            return Err(ConfigError::MissingRequiredField {
                field: "allowed_shop_domains",
            });
        }

        if !self.desired_webhooks.is_empty() && self.endpoint_url.is_none() {
            return Err(ConfigError::MissingRequiredField {
                field: "endpoint_url",
            });
        }

        Ok(AppConfig {
            client_id,
            client_secret,
            api_version: self.api_version.unwrap_or_default(),
            endpoint_url: self.endpoint_url,
            is_embedded_app: self.is_embedded_app.unwrap_or(true),
            use_online_tokens: self.use_online_tokens.unwrap_or(false),
            allowed_clock_drift: self.allowed_clock_drift.unwrap_or(DEFAULT_CLOCK_DRIFT),
            allowed_shop_domains: self.allowed_shop_domains,
            bounce_path: self
                .bounce_path
                .unwrap_or_else(|| DEFAULT_BOUNCE_PATH.to_string()),
            desired_webhooks: self.desired_webhooks,
            default_webhook_options: self.default_webhook_options.unwrap_or_default(),
        })
    }
}
