//! Integration tests for the authentication state machine.
//!
//! These tests drive the complete flows (bounce, exchange-and-persist,
//! session reuse, install/update callbacks) against a scripted in-memory
//! transport, so every outbound request and response is deterministic.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use shopauth::auth::signature::compute_query_signature;
use shopauth::{
    AppConfig, AppHooks, AuthOutcome, AuthRequestError, Authenticator, CallbackError, ClientId,
    ClientSecret, InboundRequest, MemorySessionStore, Session, SessionStore, Transport,
    TransportError, TransportResponse,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

const CLIENT_ID: &str = "test-client-id";
const SECRET: &str = "test-secret";
const SHOP: &str = "test.example.com";

/// Scripted transport: replays queued responses and records every request.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
}

impl ScriptedTransport {
    fn push_ok(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(TransportResponse {
                status,
                body: body.to_string(),
            }));
    }

    fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
        _headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted response left")))
    }
}

/// Hook set that counts invocations and remembers the last state value.
#[derive(Default)]
struct RecordingHooks {
    auth_calls: AtomicUsize,
    install_calls: AtomicUsize,
    update_calls: AtomicUsize,
    last_state: Mutex<Option<String>>,
    last_session: Mutex<Option<Session>>,
}

#[async_trait]
impl AppHooks for RecordingHooks {
    async fn after_auth(&self, session: &Session) {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_session.lock().unwrap() = Some(session.clone());
    }

    async fn after_install(&self, session: &Session, state: Option<&str>) {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_state.lock().unwrap() = state.map(ToString::to_string);
        *self.last_session.lock().unwrap() = Some(session.clone());
    }

    async fn after_update(&self, session: &Session, state: Option<&str>) {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_state.lock().unwrap() = state.map(ToString::to_string);
        *self.last_session.lock().unwrap() = Some(session.clone());
    }
}

#[derive(Debug, Serialize)]
struct TestClaims {
    aud: String,
    dest: String,
    sub: Option<String>,
    exp: i64,
    nbf: i64,
    iat: i64,
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn session_token_for(shop: &str) -> String {
    let now = now();
    let claims = TestClaims {
        aud: CLIENT_ID.to_string(),
        dest: format!("https://{shop}"),
        sub: Some("77".to_string()),
        exp: now + 300,
        nbf: now - 5,
        iat: now,
    };
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(SECRET.as_bytes());
    encode(&header, &claims, &key).unwrap()
}

fn config() -> AppConfig {
    AppConfig::builder()
        .client_id(ClientId::new(CLIENT_ID).unwrap())
        .client_secret(ClientSecret::new(SECRET).unwrap())
        .allowed_shop_domains(["example.com"])
        .build()
        .unwrap()
}

fn online_config() -> AppConfig {
    AppConfig::builder()
        .client_id(ClientId::new(CLIENT_ID).unwrap())
        .client_secret(ClientSecret::new(SECRET).unwrap())
        .allowed_shop_domains(["example.com"])
        .use_online_tokens(true)
        .build()
        .unwrap()
}

struct Harness {
    authenticator: Authenticator,
    transport: Arc<ScriptedTransport>,
    store: Arc<MemorySessionStore>,
    hooks: Arc<RecordingHooks>,
}

fn harness(config: AppConfig) -> Harness {
    let transport = Arc::new(ScriptedTransport::default());
    let store = Arc::new(MemorySessionStore::new());
    let hooks = Arc::new(RecordingHooks::default());
    let authenticator = Authenticator::new(
        Arc::new(config),
        Arc::clone(&transport) as Arc<dyn Transport>,
        Arc::clone(&store) as Arc<dyn SessionStore>,
    )
    .with_hooks(Arc::clone(&hooks) as Arc<dyn AppHooks>);

    Harness {
        authenticator,
        transport,
        store,
        hooks,
    }
}

fn embedded_request(token: &str) -> InboundRequest {
    InboundRequest::new("/app")
        .with_query_param("shop", SHOP)
        .with_query_param("id_token", token)
}

// === Embedded flow ===

#[tokio::test]
async fn test_first_request_exchanges_persists_and_fires_hook() {
    let h = harness(config());
    h.transport
        .push_ok(200, r#"{"access_token": "tok", "scope": "read_products"}"#);

    let token = session_token_for(SHOP);
    let outcome = h
        .authenticator
        .authenticate(&embedded_request(&token))
        .await
        .unwrap();

    let AuthOutcome::Authenticated(session) = outcome else {
        panic!("expected an established session");
    };
    assert_eq!(session.id, format!("offline_{SHOP}"));
    assert_eq!(session.access_token, "tok");

    // Persisted under the deterministic id.
    let stored = h.store.get(&session.id).await.unwrap().unwrap();
    assert_eq!(stored, session);

    // Exactly one exchange, RFC 8693 shaped.
    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].0,
        format!("https://{SHOP}/admin/oauth/access_token")
    );
    assert_eq!(
        requests[0].1["grant_type"],
        "urn:ietf:params:oauth:grant-type:token-exchange"
    );
    assert_eq!(requests[0].1["subject_token"], token);

    assert_eq!(h.hooks.auth_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stored_session_is_reused_without_exchange() {
    let h = harness(config());
    h.transport
        .push_ok(200, r#"{"access_token": "tok", "scope": "read_products"}"#);

    let token = session_token_for(SHOP);
    h.authenticator
        .authenticate(&embedded_request(&token))
        .await
        .unwrap();

    // Second request: no scripted response left, so any exchange would fail.
    let outcome = h
        .authenticator
        .authenticate(&embedded_request(&token))
        .await
        .unwrap();

    let AuthOutcome::Authenticated(session) = outcome else {
        panic!("expected an established session");
    };
    assert_eq!(session.access_token, "tok");
    assert_eq!(h.transport.requests().len(), 1);
    assert_eq!(h.hooks.auth_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expired_stored_session_is_re_exchanged() {
    let h = harness(config());

    // Seed the store with an expired session under the deterministic id.
    let shop = h.authenticator.config().parse_shop(SHOP).unwrap();
    let stale = Session::new(
        Session::offline_id(&shop),
        shop,
        "stale-token".to_string(),
        "read_products".parse().unwrap(),
        false,
        Some(chrono::Utc::now() - chrono::Duration::hours(2)),
    );
    h.store.put(stale).await.unwrap();

    h.transport
        .push_ok(200, r#"{"access_token": "fresh", "scope": "read_products"}"#);

    let token = session_token_for(SHOP);
    let outcome = h
        .authenticator
        .authenticate(&embedded_request(&token))
        .await
        .unwrap();

    let AuthOutcome::Authenticated(session) = outcome else {
        panic!("expected an established session");
    };
    assert_eq!(session.access_token, "fresh");
    assert_eq!(h.transport.requests().len(), 1);
}

#[tokio::test]
async fn test_invalid_token_bounces_instead_of_failing() {
    let h = harness(config());

    let request = InboundRequest::new("/app")
        .with_query_param("shop", SHOP)
        .with_query_param("id_token", "garbage.token.value");

    let outcome = h.authenticator.authenticate(&request).await.unwrap();
    let AuthOutcome::Bounce(redirect) = outcome else {
        panic!("expected bounce");
    };

    assert!(redirect.location.starts_with("/session-token-bounce?"));
    assert!(!redirect.location.contains("id_token"));
    // No exchange was attempted for an unverified token.
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn test_token_for_disallowed_shop_bounces() {
    let h = harness(config());
    let token = session_token_for("evil.attacker.com");

    let outcome = h
        .authenticator
        .authenticate(&embedded_request(&token))
        .await
        .unwrap();

    assert!(matches!(outcome, AuthOutcome::Bounce(_)));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn test_bearer_header_works_like_the_query_parameter() {
    let h = harness(config());
    h.transport
        .push_ok(200, r#"{"access_token": "tok", "scope": "read_products"}"#);

    let token = session_token_for(SHOP);
    let request = InboundRequest::new("/api/data")
        .with_header("Authorization", format!("Bearer {token}"));

    let outcome = h.authenticator.authenticate(&request).await.unwrap();
    assert!(outcome.session().is_some());
}

#[tokio::test]
async fn test_exchange_failure_is_fatal_to_the_request_only() {
    let h = harness(config());
    h.transport.push_ok(401, r#"{"error": "invalid client"}"#);

    let token = session_token_for(SHOP);
    let result = h.authenticator.authenticate(&embedded_request(&token)).await;

    assert!(matches!(result, Err(AuthRequestError::Exchange(_))));
    assert_eq!(h.hooks.auth_calls.load(Ordering::SeqCst), 0);
    assert!(h.store.is_empty().await);

    // The same authenticator still serves the next request.
    h.transport
        .push_ok(200, r#"{"access_token": "tok", "scope": "read_products"}"#);
    let outcome = h
        .authenticator
        .authenticate(&embedded_request(&token))
        .await
        .unwrap();
    assert!(outcome.session().is_some());
}

#[tokio::test]
async fn test_concurrent_first_requests_perform_one_exchange() {
    let h = harness(config());
    // Only one scripted response: a second exchange would fail the test.
    h.transport
        .push_ok(200, r#"{"access_token": "tok", "scope": "read_products"}"#);

    let authenticator = Arc::new(h.authenticator);
    let token = session_token_for(SHOP);

    let a = {
        let auth = Arc::clone(&authenticator);
        let token = token.clone();
        tokio::spawn(async move { auth.authenticate(&embedded_request(&token)).await })
    };
    let b = {
        let auth = Arc::clone(&authenticator);
        let token = token.clone();
        tokio::spawn(async move { auth.authenticate(&embedded_request(&token)).await })
    };

    let first = a.await.unwrap().unwrap();
    let second = b.await.unwrap().unwrap();

    assert!(first.session().is_some());
    assert!(second.session().is_some());
    assert_eq!(
        first.session().unwrap().access_token,
        second.session().unwrap().access_token
    );
    assert_eq!(h.transport.requests().len(), 1);
    assert_eq!(h.hooks.auth_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_online_mode_derives_user_scoped_session() {
    let h = harness(online_config());
    h.transport.push_ok(
        200,
        r#"{
            "access_token": "online-tok",
            "scope": "read_products",
            "expires_in": 86400,
            "associated_user": {
                "id": 77,
                "first_name": "Jane",
                "last_name": "Doe",
                "email": "jane@example.com",
                "email_verified": true,
                "account_owner": true,
                "locale": "en",
                "collaborator": false
            }
        }"#,
    );

    let token = session_token_for(SHOP);
    let outcome = h
        .authenticator
        .authenticate(&embedded_request(&token))
        .await
        .unwrap();

    let AuthOutcome::Authenticated(session) = outcome else {
        panic!("expected an established session");
    };
    assert_eq!(session.id, format!("{SHOP}_77"));
    assert!(session.is_online);
    assert!(session.expires.is_some());

    // Requested the online token type on the wire.
    assert_eq!(
        h.transport.requests()[0].1["requested_token_type"],
        "online-access-token"
    );

    // Reused on the next request for the same user.
    let outcome = h
        .authenticator
        .authenticate(&embedded_request(&token))
        .await
        .unwrap();
    assert!(outcome.session().is_some());
    assert_eq!(h.transport.requests().len(), 1);
}

// === Install/update callbacks ===

fn signed_callback(path: &str, code: &str, state: Option<&str>) -> InboundRequest {
    // Canonical form is the sorted remaining params joined with '&'.
    let mut canonical_pairs = vec![format!("code={code}"), format!("shop={SHOP}")];
    if let Some(state) = state {
        canonical_pairs.push(format!("state={state}"));
    }
    canonical_pairs.sort();
    let hmac = compute_query_signature(&canonical_pairs.join("&"), SECRET);

    let mut request = InboundRequest::new(path)
        .with_query_param("code", code)
        .with_query_param("shop", SHOP)
        .with_query_param("hmac", hmac);
    if let Some(state) = state {
        request = request.with_query_param("state", state);
    }
    request
}

#[tokio::test]
async fn test_install_callback_end_to_end() {
    let h = harness(config());
    h.transport
        .push_ok(200, r#"{"access_token": "tok", "scope": "read_products"}"#);

    let request = signed_callback("/auth/install", "abc", Some("nonce-1"));
    let session = h.authenticator.handle_install_callback(&request).await.unwrap();

    assert_eq!(session.shop.as_ref(), SHOP);
    assert_eq!(session.access_token, "tok");
    assert_eq!(session.scopes.to_string(), "read_products");
    assert!(!session.is_online);

    // Code exchange body, not token exchange.
    let requests = h.transport.requests();
    assert_eq!(requests[0].1["code"], "abc");
    assert!(requests[0].1.get("grant_type").is_none());

    // Hook observed the same session and the callback state.
    assert_eq!(h.hooks.install_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.hooks.update_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        h.hooks.last_state.lock().unwrap().as_deref(),
        Some("nonce-1")
    );
    let hooked = h.hooks.last_session.lock().unwrap().clone().unwrap();
    assert_eq!(hooked, session);

    // And the session was persisted for later requests.
    assert_eq!(
        h.store.get(&session.id).await.unwrap().unwrap().access_token,
        "tok"
    );
}

#[tokio::test]
async fn test_callback_with_bad_signature_is_rejected_as_401() {
    let h = harness(config());

    let request = InboundRequest::new("/auth/install")
        .with_query_param("code", "abc")
        .with_query_param("shop", SHOP)
        .with_query_param("hmac", "deadbeef");

    let error = h
        .authenticator
        .handle_install_callback(&request)
        .await
        .unwrap_err();

    assert!(matches!(error, CallbackError::SignatureMismatch { .. }));
    assert_eq!(error.http_status(), 401);
    assert!(h.transport.requests().is_empty());
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_install_and_update_failures_are_distinct() {
    let h = harness(config());
    h.transport.push_ok(500, "upstream broke");
    let request = signed_callback("/auth/install", "abc", None);
    let install_error = h
        .authenticator
        .handle_install_callback(&request)
        .await
        .unwrap_err();
    assert!(matches!(install_error, CallbackError::Install(_)));

    h.transport.push_ok(500, "upstream broke");
    let request = signed_callback("/auth/update", "abc", None);
    let update_error = h
        .authenticator
        .handle_update_callback(&request)
        .await
        .unwrap_err();
    assert!(matches!(update_error, CallbackError::Update(_)));
}

#[tokio::test]
async fn test_update_callback_fires_update_hook() {
    let h = harness(config());
    h.transport
        .push_ok(200, r#"{"access_token": "tok2", "scope": "write_orders"}"#);

    let request = signed_callback("/auth/update", "def", Some("nonce-2"));
    let session = h.authenticator.handle_update_callback(&request).await.unwrap();

    assert_eq!(session.access_token, "tok2");
    assert_eq!(h.hooks.update_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.hooks.install_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_callback_missing_code_is_a_400() {
    let h = harness(config());

    // Signed, but without a code parameter.
    let hmac = compute_query_signature(&format!("shop={SHOP}"), SECRET);
    let request = InboundRequest::new("/auth/install")
        .with_query_param("shop", SHOP)
        .with_query_param("hmac", hmac);

    let error = h
        .authenticator
        .handle_install_callback(&request)
        .await
        .unwrap_err();

    assert!(matches!(error, CallbackError::MissingParam { name: "code" }));
    assert_eq!(error.http_status(), 400);
}
