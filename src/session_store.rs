//! Session persistence seam.
//!
//! Between requests, sessions are owned exclusively by a [`SessionStore`].
//! The contract is the minimal keyed get/put the orchestrator needs;
//! backends (databases, caches) live in the embedding application. The
//! store must be at-most-once-consistent per key; no cross-key
//! coordination is required, and tenants never share keys.
//!
//! [`MemorySessionStore`] is the bundled implementation, suitable for
//! tests and single-process deployments.

use crate::auth::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// A failed session-store operation.
#[derive(Debug, Error, Clone)]
#[error("session store failure: {message}")]
pub struct SessionStoreError {
    /// Human-readable failure detail.
    pub message: String,
}

impl SessionStoreError {
    /// Creates a store error with the given detail.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Minimal session persistence contract.
///
/// Keys are the deterministic session ids produced by
/// [`Session::offline_id`] and [`Session::online_id`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session stored under `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] if the backend failed; a missing
    /// session is `Ok(None)`, not an error.
    async fn get(&self, id: &str) -> Result<Option<Session>, SessionStoreError>;

    /// Stores `session` under its own id, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] if the backend failed.
    async fn put(&self, session: Session) -> Result<(), SessionStoreError>;
}

/// In-memory [`SessionStore`] over a read-write-locked map.
///
/// # Example
///
/// ```rust
/// use shopauth::{AccessScopes, MemorySessionStore, Session, SessionStore, ShopDomain};
///
/// # tokio_test::block_on(async {
/// let store = MemorySessionStore::new();
/// let allowed = vec!["myplatform.com".to_string()];
/// let shop = ShopDomain::parse("my-store.myplatform.com", &allowed).unwrap();
/// let session = Session::new(
///     Session::offline_id(&shop),
///     shop,
///     "token".to_string(),
///     AccessScopes::new(),
///     false,
///     None,
/// );
///
/// store.put(session.clone()).await.unwrap();
/// let loaded = store.get(&session.id).await.unwrap();
/// assert_eq!(loaded, Some(session));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn put(&self, session: Session) -> Result<(), SessionStoreError> {
        self.entries
            .write()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }
}

// Verify MemorySessionStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MemorySessionStore>();
};
