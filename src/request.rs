//! Framework-agnostic view of an inbound HTTP request.
//!
//! Routing frameworks are out of scope for this crate, so the orchestrator
//! consumes a plain [`InboundRequest`]: path, decoded query pairs, headers,
//! and raw body bytes. Adapters for concrete frameworks are a few lines in
//! the embedding application.
//!
//! # Example
//!
//! ```rust
//! use shopauth::InboundRequest;
//!
//! let request = InboundRequest::new("/app")
//!     .with_query_param("shop", "my-store.myplatform.com")
//!     .with_header("Authorization", "Bearer eyJ...")
//!     .with_body(br#"{"id": 1}"#.to_vec());
//!
//! assert_eq!(request.query_param("shop"), Some("my-store.myplatform.com"));
//! assert_eq!(request.bearer_token(), Some("eyJ..."));
//! ```

/// An inbound request as the orchestrator sees it.
///
/// Query parameters are stored decoded and in request order; order matters
/// for signature canonicalization of repeated keys. Header lookup is
/// case-insensitive, body bytes are kept raw so signature verification sees
/// the exact payload.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl InboundRequest {
    /// Creates a request for the given path (without query string).
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Appends a decoded query parameter. Repeated names are kept.
    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the raw request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns all query parameters in request order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the first value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a header value, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the token of an `Authorization: Bearer <token>` header.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.header("Authorization")?;
        let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    }
}

// Verify InboundRequest is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InboundRequest>();
};
