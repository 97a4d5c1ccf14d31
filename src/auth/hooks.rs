//! Lifecycle hooks for the embedding application.
//!
//! The source of customization here is an injected strategy object rather
//! than method overriding: the embedding application implements [`AppHooks`]
//! for the events it cares about and passes it to the
//! [`Authenticator`](crate::Authenticator) at construction. Every method has
//! a default no-op body, so implementors only write what they use.
//!
//! Hooks are infallible by contract: a hook that can fail should handle
//! and log its own errors, because by the time a hook runs the session it
//! receives has already been established and persisted.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use shopauth::{AppHooks, Session};
//!
//! struct RegisterWebhooks;
//!
//! #[async_trait]
//! impl AppHooks for RegisterWebhooks {
//!     async fn after_auth(&self, session: &Session) {
//!         tracing::info!(shop = %session.shop, "session established");
//!         // e.g. kick off webhook reconciliation here
//!     }
//! }
//! ```

use crate::auth::Session;
use async_trait::async_trait;

/// Lifecycle callbacks invoked by the [`Authenticator`](crate::Authenticator).
///
/// All methods default to no-ops.
#[async_trait]
pub trait AppHooks: Send + Sync {
    /// Invoked after a new session is exchanged and persisted during the
    /// embedded authentication flow.
    ///
    /// Not invoked when an existing stored session is reused.
    async fn after_auth(&self, session: &Session) {
        let _ = session;
    }

    /// Invoked after a successful install callback, with the callback's
    /// `state` parameter when present.
    async fn after_install(&self, session: &Session, state: Option<&str>) {
        let _ = (session, state);
    }

    /// Invoked after a successful update callback, with the callback's
    /// `state` parameter when present.
    async fn after_update(&self, session: &Session, state: Option<&str>) {
        let _ = (session, state);
    }
}

/// The default hook set: does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl AppHooks for NoopHooks {}
