//! Webhook verification and subscription synchronization.
//!
//! Two concerns live here:
//!
//! - **Inbound**: [`verify_webhook`] authenticates webhook deliveries by
//!   their raw-body HMAC before any payload parsing happens.
//! - **Outbound**: [`WebhookReconciler`] keeps each shop's subscriptions in
//!   step with the desired set declared in [`AppConfig`](crate::AppConfig),
//!   creating whatever is missing and leaving everything else alone.
//!
//! # Reconciliation Semantics
//!
//! Reconciliation is additive and idempotent: it only creates subscriptions
//! absent from the platform, per-topic failures are logged and skipped, and
//! a fully subscribed shop results in zero API mutations. Stale
//! subscriptions (present on the platform, absent from configuration) are
//! never deleted.

mod errors;
mod reconciler;
mod types;
mod verification;

pub use errors::WebhookError;
pub use reconciler::WebhookReconciler;
pub use types::{
    topic_api_format, WebhookDefaults, WebhookFormat, WebhookRegistration, WebhookSubscription,
};
pub use verification::{
    verify_webhook, WebhookContext, HEADER_API_VERSION, HEADER_SHOP_DOMAIN, HEADER_TOPIC,
    HEADER_WEBHOOK_ID, HEADER_WEBHOOK_SIGNATURE,
};
