//! The per-request authentication state machine.
//!
//! [`Authenticator`] coordinates the verification, exchange, and persistence
//! components for every inbound request. A request moves through three
//! states (unauthenticated, token-validated, session-established) or ends
//! in a bounce redirect that forces the embedded frontend to fetch a fresh
//! session token.
//!
//! # Embedded Requests
//!
//! 1. The session token is taken from the `id_token` query parameter or the
//!    `Authorization: Bearer` header.
//! 2. Any verification failure (missing token, bad signature, expired,
//!    not-yet-valid, malformed, invalid shop domain) produces a
//!    [`BounceRedirect`]: the original query minus the token parameter,
//!    plus a `reload` parameter recording the original path and query so
//!    the frontend can restore the request after re-authentication. The
//!    bounce target is a fixed, distinct route, so bouncing cannot loop.
//! 3. On success, the deterministic session id is looked up in the store.
//!    An active stored session is reused as-is. A missing or expired one
//!    triggers a token exchange; the exchange-and-persist step is
//!    serialized per session id so concurrent first requests for the same
//!    shop perform exactly one exchange.
//!
//! # Install/Update Callbacks
//!
//! Raw (non-embedded) callback requests skip the session-token machinery:
//! their query-string HMAC is verified against the client secret, the
//! authorization code is exchanged, the session is persisted, and the
//! matching lifecycle hook runs. Signature mismatches map to 401; exchange
//! failures are typed per route ([`CallbackError::Install`] vs
//! [`CallbackError::Update`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopauth::{Authenticator, AuthOutcome, HttpTransport, MemorySessionStore};
//!
//! let authenticator = Authenticator::new(
//!     Arc::new(config),
//!     Arc::new(HttpTransport::new()),
//!     Arc::new(MemorySessionStore::new()),
//! );
//!
//! match authenticator.authenticate(&request).await? {
//!     AuthOutcome::Authenticated(session) => { /* serve the request */ }
//!     AuthOutcome::Bounce(redirect) => { /* 302 to redirect.location */ }
//! }
//! ```

use crate::auth::error::{AuthRequestError, CallbackError};
use crate::auth::hooks::{AppHooks, NoopHooks};
use crate::auth::session::Session;
use crate::auth::session_token::decode_session_token;
use crate::auth::signature::verify_query_signature;
use crate::auth::token_exchange::{exchange_code, exchange_session_token, RequestedTokenKind};
use crate::config::{AppConfig, ShopDomain};
use crate::request::InboundRequest;
use crate::session_store::SessionStore;
use crate::transport::Transport;
use crate::webhooks::{WebhookError, WebhookReconciler, WebhookSubscription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Query parameter carrying the session token on embedded requests.
const TOKEN_PARAM: &str = "id_token";

/// Bounce parameter recording the original path and query.
const RELOAD_PARAM: &str = "reload";

/// Outcome of authenticating an embedded request.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// A session is established; the request proceeds unchanged.
    Authenticated(Session),
    /// The client must be redirected to re-authenticate.
    Bounce(BounceRedirect),
}

impl AuthOutcome {
    /// Returns the established session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Bounce(_) => None,
        }
    }
}

/// A redirect forcing the embedded frontend to fetch a fresh session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BounceRedirect {
    /// The `Location` value to answer with (302).
    pub location: String,
}

/// Which callback route is being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallbackKind {
    Install,
    Update,
}

/// Per-key advisory locks serializing exchange-and-persist.
///
/// The map grows by one entry per distinct session id and is bounded by the
/// number of tenants; entries are tiny.
#[derive(Default)]
struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

/// The authentication orchestrator.
///
/// Holds the per-app configuration and the injected collaborator seams;
/// cheap to share behind an `Arc` across every request handler.
pub struct Authenticator {
    config: Arc<AppConfig>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    hooks: Arc<dyn AppHooks>,
    exchange_locks: KeyedLocks,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Creates an authenticator with no-op lifecycle hooks.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            hooks: Arc::new(NoopHooks),
            exchange_locks: KeyedLocks::default(),
        }
    }

    /// Replaces the lifecycle hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn AppHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Returns the configuration this authenticator serves.
    #[must_use]
    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    /// Authenticates an embedded request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthRequestError`] only for request-fatal conditions: a
    /// failed token exchange or a failing session store. All token
    /// verification failures resolve to [`AuthOutcome::Bounce`] instead.
    pub async fn authenticate(
        &self,
        request: &InboundRequest,
    ) -> Result<AuthOutcome, AuthRequestError> {
        let Some(token) = request
            .query_param(TOKEN_PARAM)
            .or_else(|| request.bearer_token())
        else {
            tracing::debug!(path = request.path(), "request carries no session token; bouncing");
            return Ok(AuthOutcome::Bounce(self.bounce(request)));
        };

        let claims = match decode_session_token(token, &self.config) {
            Ok(claims) => claims,
            Err(error) => {
                tracing::debug!(%error, "session token rejected; bouncing");
                return Ok(AuthOutcome::Bounce(self.bounce(request)));
            }
        };

        let shop = match claims
            .shop_domain()
            .map_err(|e| e.to_string())
            .and_then(|raw| self.config.parse_shop(raw).map_err(|e| e.to_string()))
        {
            Ok(shop) => shop,
            Err(error) => {
                tracing::debug!(%error, "session token names no valid shop; bouncing");
                return Ok(AuthOutcome::Bounce(self.bounce(request)));
            }
        };

        // A non-numeric subject yields no lookup id for online-token apps;
        // the exchange response then names the session.
        let session_id = if self.config.use_online_tokens() {
            claims.user_id().map(|uid| Session::online_id(&shop, uid))
        } else {
            Some(Session::offline_id(&shop))
        };

        if let Some(id) = &session_id {
            if let Some(session) = self.load_active(id).await? {
                return Ok(AuthOutcome::Authenticated(session));
            }
        }

        // Serialize exchange-and-persist per session id, then re-check the
        // store: the loser of a concurrent race finds the winner's session.
        let lock_key = session_id
            .clone()
            .unwrap_or_else(|| format!("exchange:{}", shop.as_ref()));
        let _guard = self.exchange_locks.acquire(&lock_key).await;

        if let Some(id) = &session_id {
            if let Some(session) = self.load_active(id).await? {
                return Ok(AuthOutcome::Authenticated(session));
            }
        }

        let kind = if self.config.use_online_tokens() {
            RequestedTokenKind::Online
        } else {
            RequestedTokenKind::Offline
        };
        let session =
            exchange_session_token(&self.config, self.transport.as_ref(), &shop, token, kind)
                .await?;

        self.store.put(session.clone()).await?;
        self.hooks.after_auth(&session).await;

        Ok(AuthOutcome::Authenticated(session))
    }

    /// Handles the install callback route.
    ///
    /// Verifies the query signature, exchanges the authorization code,
    /// persists the session, and invokes the install hook with the
    /// callback's `state`.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError`]; exchange failures surface as
    /// [`CallbackError::Install`].
    pub async fn handle_install_callback(
        &self,
        request: &InboundRequest,
    ) -> Result<Session, CallbackError> {
        self.run_callback(request, CallbackKind::Install).await
    }

    /// Handles the update (re-authorization) callback route.
    ///
    /// Same pipeline as [`handle_install_callback`](Self::handle_install_callback),
    /// but failures surface as [`CallbackError::Update`] and the update
    /// hook is invoked instead.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError`].
    pub async fn handle_update_callback(
        &self,
        request: &InboundRequest,
    ) -> Result<Session, CallbackError> {
        self.run_callback(request, CallbackKind::Update).await
    }

    /// Brings the session's shop up to the configured webhook set.
    ///
    /// Convenience delegate for use inside `after_auth` hooks.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] when the subscription query fails.
    pub async fn reconcile_webhooks(
        &self,
        session: &Session,
    ) -> Result<Vec<WebhookSubscription>, WebhookError> {
        WebhookReconciler::new(Arc::clone(&self.config), Arc::clone(&self.transport))
            .reconcile(session)
            .await
    }

    /// Loads a stored session, treating an expired one as absent.
    async fn load_active(&self, id: &str) -> Result<Option<Session>, AuthRequestError> {
        match self.store.get(id).await? {
            Some(session) if session.is_active() => Ok(Some(session)),
            Some(_) => {
                tracing::debug!(session_id = id, "stored session expired; re-exchanging");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Shared install/update pipeline.
    async fn run_callback(
        &self,
        request: &InboundRequest,
        kind: CallbackKind,
    ) -> Result<Session, CallbackError> {
        let shop_param = request
            .query_param("shop")
            .ok_or(CallbackError::MissingParam { name: "shop" })?;

        if !verify_query_signature(request.query(), self.config.client_secret().as_ref()) {
            return Err(CallbackError::SignatureMismatch {
                shop: shop_param.to_string(),
            });
        }

        let shop: ShopDomain = self.config.parse_shop(shop_param)?;
        let code = request
            .query_param("code")
            .ok_or(CallbackError::MissingParam { name: "code" })?;

        let session = exchange_code(&self.config, self.transport.as_ref(), &shop, code)
            .await
            .map_err(|error| match kind {
                CallbackKind::Install => CallbackError::Install(error),
                CallbackKind::Update => CallbackError::Update(error),
            })?;

        self.store.put(session.clone()).await?;

        let state = request.query_param("state");
        match kind {
            CallbackKind::Install => self.hooks.after_install(&session, state).await,
            CallbackKind::Update => self.hooks.after_update(&session, state).await,
        }

        Ok(session)
    }

    /// Builds the bounce redirect for a request with an unusable token.
    fn bounce(&self, request: &InboundRequest) -> BounceRedirect {
        let kept: Vec<(String, String)> = request
            .query()
            .iter()
            .filter(|(name, _)| name != TOKEN_PARAM)
            .cloned()
            .collect();

        let reload_query = encode_query(&kept);
        let reload = if reload_query.is_empty() {
            request.path().to_string()
        } else {
            format!("{}?{}", request.path(), reload_query)
        };

        let mut params = kept;
        params.push((RELOAD_PARAM.to_string(), reload));

        BounceRedirect {
            location: format!("{}?{}", self.config.bounce_path(), encode_query(&params)),
        }
    }
}

/// Percent-encodes pairs into a query string.
fn encode_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

// Verify Authenticator is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Authenticator>();
    assert_send_sync::<AuthOutcome>();
};
