//! Webhook error types.

use crate::transport::TransportError;
use thiserror::Error;

/// Errors raised while verifying inbound webhooks or synchronizing
/// subscriptions.
///
/// During reconciliation, per-topic creation failures of any of these kinds
/// are logged and excluded from the result rather than aborting the batch;
/// only the initial subscription query fails the whole run.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// An inbound delivery carried no signature header.
    #[error("webhook delivery has no signature header")]
    MissingSignature,

    /// An inbound delivery's body signature did not verify. Answer with 401.
    #[error("webhook signature is invalid")]
    InvalidSignature,

    /// An outbound API call never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The platform answered an API call with a non-2xx status.
    #[error("platform returned status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnostics.
        body: String,
    },

    /// The platform's API answered with query-level errors.
    #[error("webhook API query failed: {message}")]
    QueryFailed {
        /// The error payload, flattened.
        message: String,
    },

    /// The platform rejected a subscription with user errors.
    #[error("subscription for topic '{topic}' was rejected: {messages:?}")]
    Rejected {
        /// The topic that was being created.
        topic: String,
        /// The rejection messages.
        messages: Vec<String>,
    },

    /// A 2xx API response violated the expected shape.
    #[error("malformed webhook API response: {reason}")]
    MalformedResponse {
        /// What was wrong with the body.
        reason: String,
    },

    /// Callback URLs cannot be built without an endpoint URL.
    #[error("endpoint URL must be configured to build webhook callback URLs")]
    MissingEndpointUrl,
}

// Verify WebhookError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookError>();
};
