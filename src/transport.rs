//! Outbound HTTP transport seam.
//!
//! Every outbound call this crate makes (token exchanges and webhook API
//! calls) goes through the minimal [`Transport`] trait: a single JSON POST
//! returning status and body. The concrete [`HttpTransport`] wraps
//! [`reqwest`]; tests inject scripted fakes instead of a live network.
//!
//! The trait deliberately has no retry or circuit-breaking: the embedding
//! application owns transport policy. [`HttpTransport`] applies one
//! request-level timeout so a stalled platform call cannot hang a request
//! forever; exhaustion surfaces as a [`TransportError`], which callers see
//! as a recoverable exchange or webhook failure.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Default request-level timeout for [`HttpTransport`].
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A raw HTTP response: status code and body text.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The response body.
    pub body: String,
}

impl TransportResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A request that never produced an HTTP response.
///
/// Connection failures, DNS trouble, and timeouts all land here; callers
/// treat them the same as platform-side error statuses.
#[derive(Debug, Error, Clone)]
#[error("transport failure: {message}")]
pub struct TransportError {
    /// Human-readable failure detail.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error with the given detail.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Minimal outbound HTTP contract.
///
/// Implementations must be safe to share across tasks; the orchestrator and
/// reconciler hold one behind an `Arc`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs a JSON body to `url` with the given extra headers.
    ///
    /// Returns the response for every HTTP status; deciding whether a
    /// non-2xx status is an error is the caller's job, not the transport's.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when no HTTP response was produced
    /// at all.
    async fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] implementation over a shared [`reqwest::Client`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use shopauth::HttpTransport;
///
/// let transport = HttpTransport::new();
/// let slow_tolerant = HttpTransport::with_timeout(Duration::from_secs(30));
/// # let _ = (transport, slow_tolerant);
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the default 10-second request timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a custom request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

// Verify transport types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpTransport>();
    assert_send_sync::<TransportResponse>();
    assert_send_sync::<TransportError>();
};
