//! # shopauth
//!
//! Per-shop authentication, token exchange, and webhook synchronization for
//! multi-tenant apps embedded in a commerce platform's admin.
//!
//! ## Overview
//!
//! The platform embeds your app in an iframe for each shop and hands the
//! frontend a short-lived signed session token on every page load. This
//! crate turns those tokens, along with the signed install/update callbacks
//! and webhook deliveries the platform sends, into trustworthy per-shop state:
//!
//! - Type-safe configuration via [`AppConfig`] and [`AppConfigBuilder`]
//! - Shop-domain validation against a configurable allow-list
//! - HMAC verification for signed queries and webhook bodies, in constant
//!   time
//! - Session-token (JWT) verification with configurable clock drift
//! - OAuth token exchange (authorization-code and RFC 8693 grants) for
//!   online and offline access tokens
//! - The [`Authenticator`] state machine: bounce, exchange, or pass through
//! - [`webhooks::WebhookReconciler`]: converge each shop's webhook
//!   subscriptions onto the configured desired set
//!
//! ## Quick Start
//!
//! ```rust
//! use shopauth::{AppConfig, ClientId, ClientSecret};
//!
//! let config = AppConfig::builder()
//!     .client_id(ClientId::new("your-client-id").unwrap())
//!     .client_secret(ClientSecret::new("your-client-secret").unwrap())
//!     .allowed_shop_domains(["myplatform.com"])
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Authenticating Embedded Requests
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopauth::{Authenticator, AuthOutcome, HttpTransport, InboundRequest, MemorySessionStore};
//!
//! let authenticator = Authenticator::new(
//!     Arc::new(config),
//!     Arc::new(HttpTransport::new()),
//!     Arc::new(MemorySessionStore::new()),
//! );
//!
//! // In your request handler:
//! let request = InboundRequest::new("/app")
//!     .with_query_param("id_token", token_from_query)
//!     .with_query_param("shop", shop_from_query);
//!
//! match authenticator.authenticate(&request).await? {
//!     AuthOutcome::Authenticated(session) => {
//!         // session.access_token is ready for API calls
//!     }
//!     AuthOutcome::Bounce(redirect) => {
//!         // answer 302 with redirect.location so the frontend
//!         // fetches a fresh session token
//!     }
//! }
//! ```
//!
//! ## Install Callbacks and Webhooks
//!
//! ```rust,ignore
//! // Install/update callback routes (signature-checked, then exchanged):
//! let session = authenticator.handle_install_callback(&request).await?;
//!
//! // Webhook deliveries (raw-body HMAC check before parsing anything):
//! let context = shopauth::webhooks::verify_webhook(&config, &request)?;
//!
//! // Converge a shop's subscriptions onto the configured set:
//! let created = authenticator.reconcile_webhooks(&session).await?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed
//!   explicitly
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Injected collaborators**: transport, session store, and lifecycle
//!   hooks are traits the embedding application implements
//! - **Tenant isolation**: sessions are keyed deterministically per shop
//!   (and user), and one tenant's failure never corrupts another's state
//! - **Async-first**: designed for use with the Tokio runtime

pub mod auth;
pub mod config;
pub mod error;
pub mod request;
pub mod session_store;
pub mod transport;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use auth::{
    AccessScopes, AppHooks, AssociatedUser, AuthError, AuthOutcome, AuthRequestError,
    Authenticator, BounceRedirect, CallbackError, ExchangeError, ExchangeErrorKind, NoopHooks,
    RequestedTokenKind, Session, SessionTokenClaims,
};
pub use config::{
    ApiVersion, AppConfig, AppConfigBuilder, ClientId, ClientSecret, EndpointUrl, ShopDomain,
};
pub use error::{ConfigError, ValidationError};
pub use request::InboundRequest;
pub use session_store::{MemorySessionStore, SessionStore, SessionStoreError};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
