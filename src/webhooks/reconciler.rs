//! Webhook subscription reconciliation.
//!
//! The reconciler drives a shop's webhook subscriptions toward the desired
//! set declared in configuration. It is additive only: subscriptions that
//! exist on the platform but are not desired are left untouched. There is
//! deliberately no update or delete path here, and embedders that need one
//! must prune by hand.
//!
//! # Algorithm
//!
//! 1. Query the shop's current subscriptions (one read call).
//! 2. `to_create = desired - current`, compared over normalized topic
//!    identifiers.
//! 3. Create each missing topic with its configured callback path and
//!    format, falling back field-wise to the configured defaults.
//!
//! Per-topic creation failures are logged with `tracing::warn!` and
//! excluded from the result; one topic's failure never aborts the others.
//! The returned list contains only the subscriptions created in this run,
//! not the full current set. Reconciling an already-satisfied shop creates
//! nothing.

use crate::auth::Session;
use crate::config::AppConfig;
use crate::transport::Transport;
use crate::webhooks::errors::WebhookError;
use crate::webhooks::types::{topic_api_format, WebhookRegistration, WebhookSubscription};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// Header carrying the access token on platform API calls.
const HEADER_ACCESS_TOKEN: &str = "X-Platform-Access-Token";

/// GraphQL query for a shop's current webhook subscriptions.
const LIST_SUBSCRIPTIONS_QUERY: &str = "\
query {
  webhookSubscriptions(first: 250) {
    edges {
      node {
        id
        topic
        callbackUrl
        format
      }
    }
  }
}";

/// GraphQL mutation creating one webhook subscription.
const CREATE_SUBSCRIPTION_MUTATION: &str = "\
mutation webhookSubscriptionCreate($topic: WebhookSubscriptionTopic!, $webhookSubscription: WebhookSubscriptionInput!) {
  webhookSubscriptionCreate(topic: $topic, webhookSubscription: $webhookSubscription) {
    webhookSubscription {
      id
      topic
      callbackUrl
      format
    }
    userErrors {
      field
      message
    }
  }
}";

/// Creates missing webhook subscriptions for authenticated shops.
///
/// # Example
///
/// ```rust,ignore
/// use shopauth::webhooks::WebhookReconciler;
///
/// let reconciler = WebhookReconciler::new(config.clone(), transport.clone());
/// let created = reconciler.reconcile(&session).await?;
/// tracing::info!(count = created.len(), "webhook subscriptions created");
/// ```
#[derive(Clone)]
pub struct WebhookReconciler {
    config: Arc<AppConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for WebhookReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookReconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WebhookReconciler {
    /// Creates a reconciler over the given configuration and transport.
    #[must_use]
    pub fn new(config: Arc<AppConfig>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Brings the shop's subscriptions up to the desired set.
    ///
    /// Returns the subscriptions created in this run. An empty desired set
    /// returns immediately without any API call.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] when the subscription query fails; creation
    /// failures are per-topic and only logged.
    pub async fn reconcile(
        &self,
        session: &Session,
    ) -> Result<Vec<WebhookSubscription>, WebhookError> {
        let desired = self.config.desired_webhooks();
        if desired.is_empty() {
            return Ok(Vec::new());
        }

        let current = self.list_current_topics(session).await?;

        let mut created = Vec::new();
        for (topic, registration) in desired {
            if current.contains(&topic_api_format(topic)) {
                continue;
            }

            match self.create_subscription(session, topic, registration).await {
                Ok(subscription) => created.push(subscription),
                Err(error) => {
                    tracing::warn!(
                        shop = %session.shop,
                        topic = %topic,
                        error = %error,
                        "webhook subscription creation failed; continuing with remaining topics"
                    );
                }
            }
        }

        Ok(created)
    }

    /// Queries the platform for the shop's current subscription topics.
    async fn list_current_topics(
        &self,
        session: &Session,
    ) -> Result<HashSet<String>, WebhookError> {
        let data = self
            .post_graphql(session, LIST_SUBSCRIPTIONS_QUERY, json!({}))
            .await?;

        #[derive(Deserialize)]
        struct Node {
            topic: String,
        }
        #[derive(Deserialize)]
        struct Edge {
            node: Node,
        }
        #[derive(Deserialize)]
        struct Connection {
            edges: Vec<Edge>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ListData {
            webhook_subscriptions: Connection,
        }

        let list: ListData =
            serde_json::from_value(data).map_err(|e| WebhookError::MalformedResponse {
                reason: e.to_string(),
            })?;

        Ok(list
            .webhook_subscriptions
            .edges
            .into_iter()
            .map(|edge| topic_api_format(&edge.node.topic))
            .collect())
    }

    /// Creates one subscription, resolving the registration against the
    /// configured defaults.
    async fn create_subscription(
        &self,
        session: &Session,
        topic: &str,
        registration: &WebhookRegistration,
    ) -> Result<WebhookSubscription, WebhookError> {
        let defaults = self.config.default_webhook_options();
        let path = registration.path.as_deref().unwrap_or(&defaults.path);
        let format = registration.format.unwrap_or(defaults.format);

        let callback_url = self
            .config
            .endpoint_url()
            .ok_or(WebhookError::MissingEndpointUrl)?
            .join(path);

        let api_topic = topic_api_format(topic);
        let variables = json!({
            "topic": api_topic,
            "webhookSubscription": {
                "callbackUrl": callback_url,
                "format": format.as_wire(),
            },
        });

        let data = self
            .post_graphql(session, CREATE_SUBSCRIPTION_MUTATION, variables)
            .await?;

        #[derive(Deserialize)]
        struct UserError {
            message: String,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CreatePayload {
            webhook_subscription: Option<WebhookSubscription>,
            user_errors: Vec<UserError>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CreateData {
            webhook_subscription_create: CreatePayload,
        }

        let create: CreateData =
            serde_json::from_value(data).map_err(|e| WebhookError::MalformedResponse {
                reason: e.to_string(),
            })?;
        let payload = create.webhook_subscription_create;

        if !payload.user_errors.is_empty() {
            return Err(WebhookError::Rejected {
                topic: api_topic,
                messages: payload.user_errors.into_iter().map(|e| e.message).collect(),
            });
        }

        payload
            .webhook_subscription
            .ok_or_else(|| WebhookError::MalformedResponse {
                reason: "create mutation returned neither a subscription nor user errors"
                    .to_string(),
            })
    }

    /// POSTs a GraphQL document to the shop's admin API and unwraps `data`.
    async fn post_graphql(
        &self,
        session: &Session,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, WebhookError> {
        let url = format!(
            "https://{}/admin/api/{}/graphql.json",
            session.shop.as_ref(),
            self.config.api_version()
        );
        let headers = [(HEADER_ACCESS_TOKEN.to_string(), session.access_token.clone())];
        let body = json!({ "query": query, "variables": variables });

        let response = self.transport.post(&url, &body, &headers).await?;
        if !response.is_success() {
            return Err(WebhookError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let envelope: serde_json::Value =
            serde_json::from_str(&response.body).map_err(|e| WebhookError::MalformedResponse {
                reason: e.to_string(),
            })?;

        if let Some(errors) = envelope.get("errors").filter(|e| !e.is_null()) {
            return Err(WebhookError::QueryFailed {
                message: errors.to_string(),
            });
        }

        envelope
            .get("data")
            .filter(|d| !d.is_null())
            .cloned()
            .ok_or_else(|| WebhookError::MalformedResponse {
                reason: "response has no data object".to_string(),
            })
    }
}
