//! Webhook trigger: subscription lifecycle and inbound delivery handling.
//!
//! The host owns persistence. Whatever survives between activations (the
//! subscription id and its signing secret) goes through a [`WebhookStore`].

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::client::{path_segment, DealHubClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, Transport};
use crate::operations::truthy;
use crate::signature::verify_signature;

/// Events a subscription can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    #[serde(rename = "approval.completed")]
    ApprovalCompleted,
    #[serde(rename = "approval.requested")]
    ApprovalRequested,
    #[serde(rename = "dealroom.signed")]
    DealRoomSigned,
    #[serde(rename = "dealroom.viewed")]
    DealRoomViewed,
    #[serde(rename = "document.generated")]
    DocumentGenerated,
    #[serde(rename = "opportunity.synced")]
    OpportunitySynced,
    #[serde(rename = "quote.approved")]
    QuoteApproved,
    #[serde(rename = "quote.created")]
    QuoteCreated,
    #[serde(rename = "quote.lost")]
    QuoteLost,
    #[serde(rename = "quote.published")]
    QuotePublished,
    #[serde(rename = "quote.rejected")]
    QuoteRejected,
    #[serde(rename = "quote.submitted")]
    QuoteSubmitted,
    #[serde(rename = "quote.updated")]
    QuoteUpdated,
    #[serde(rename = "quote.won")]
    QuoteWon,
}

impl WebhookEvent {
    pub const ALL: [WebhookEvent; 14] = [
        Self::ApprovalCompleted,
        Self::ApprovalRequested,
        Self::DealRoomSigned,
        Self::DealRoomViewed,
        Self::DocumentGenerated,
        Self::OpportunitySynced,
        Self::QuoteApproved,
        Self::QuoteCreated,
        Self::QuoteLost,
        Self::QuotePublished,
        Self::QuoteRejected,
        Self::QuoteSubmitted,
        Self::QuoteUpdated,
        Self::QuoteWon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovalCompleted => "approval.completed",
            Self::ApprovalRequested => "approval.requested",
            Self::DealRoomSigned => "dealroom.signed",
            Self::DealRoomViewed => "dealroom.viewed",
            Self::DocumentGenerated => "document.generated",
            Self::OpportunitySynced => "opportunity.synced",
            Self::QuoteApproved => "quote.approved",
            Self::QuoteCreated => "quote.created",
            Self::QuoteLost => "quote.lost",
            Self::QuotePublished => "quote.published",
            Self::QuoteRejected => "quote.rejected",
            Self::QuoteSubmitted => "quote.submitted",
            Self::QuoteUpdated => "quote.updated",
            Self::QuoteWon => "quote.won",
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEvent {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| ApiError::invalid("events", format!("unknown event '{s}'")))
    }
}

/// What the trigger remembers about its registration.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSubscription {
    pub webhook_id: String,
    pub secret: Option<String>,
}

impl fmt::Debug for WebhookSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSubscription")
            .field("webhook_id", &self.webhook_id)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Host-provided storage that outlives a single activation.
pub trait WebhookStore {
    fn load(&self) -> Option<WebhookSubscription>;
    fn save(&self, subscription: WebhookSubscription);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct InMemoryWebhookStore {
    inner: Mutex<Option<WebhookSubscription>>,
}

impl WebhookStore for InMemoryWebhookStore {
    fn load(&self) -> Option<WebhookSubscription> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, subscription: WebhookSubscription) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);
    }

    fn clear(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Trigger configuration as set by the workflow author.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerOptions {
    pub events: Vec<WebhookEvent>,
    pub verify_signature: bool,
    /// Overrides the secret stored at registration time.
    pub webhook_secret: Option<String>,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            verify_signature: true,
            webhook_secret: None,
        }
    }
}

impl fmt::Debug for TriggerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerOptions")
            .field("events", &self.events)
            .field("verify_signature", &self.verify_signature)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Outcome of an inbound delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerResponse {
    /// Emit this item into the workflow.
    Accepted(Value),
    /// Answer the sender with `status` and `body`; nothing is emitted.
    Rejected { status: u16, body: Value },
}

/// True if the stored subscription still exists and points at `webhook_url`.
/// Any API failure counts as "does not exist".
pub fn check_exists<T: Transport>(
    client: &DealHubClient<T>,
    store: &impl WebhookStore,
    webhook_url: &str,
) -> bool {
    let Some(subscription) = store.load() else {
        return false;
    };
    let lookup = webhook_path(&subscription)
        .and_then(|path| client.send(HttpMethod::Get, &path, None, None));
    match lookup {
        Ok(webhook) => webhook.get("url").and_then(Value::as_str) == Some(webhook_url),
        Err(e) => {
            debug!(webhook_id = %subscription.webhook_id, error = %e, "webhook lookup failed");
            false
        }
    }
}

/// Registers `webhook_url` for the configured events.
///
/// Returns `Ok(false)` when the API answers without an id. The secret kept
/// for verification is the caller's, or the one DealHub generated.
pub fn create<T: Transport>(
    client: &DealHubClient<T>,
    store: &impl WebhookStore,
    webhook_url: &str,
    options: &TriggerOptions,
) -> Result<bool, ApiError> {
    let mut body = Map::new();
    body.insert("url".to_string(), json!(webhook_url));
    body.insert(
        "events".to_string(),
        options.events.iter().map(WebhookEvent::as_str).collect(),
    );
    body.insert("is_active".to_string(), json!(true));
    let own_secret = options.webhook_secret.as_deref().filter(|s| !s.is_empty());
    if let Some(secret) = own_secret {
        body.insert("secret".to_string(), json!(secret));
    }

    let response = client.send(HttpMethod::Post, "/webhooks", Some(&body), None)?;
    let Some(webhook_id) = id_of(&response) else {
        warn!("webhook registration returned no id");
        return Ok(false);
    };

    let secret = own_secret.map(str::to_string).or_else(|| {
        response
            .get("secret")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    });
    store.save(WebhookSubscription { webhook_id, secret });
    Ok(true)
}

/// Removes the registration. On API failure the stored record is kept and
/// `false` is returned.
pub fn delete<T: Transport>(client: &DealHubClient<T>, store: &impl WebhookStore) -> bool {
    let Some(subscription) = store.load() else {
        return true;
    };
    if let Err(e) = webhook_path(&subscription)
        .and_then(|path| client.send(HttpMethod::Delete, &path, None, None))
    {
        warn!(webhook_id = %subscription.webhook_id, error = %e, "webhook removal failed");
        return false;
    }
    store.clear();
    true
}

fn webhook_path(subscription: &WebhookSubscription) -> Result<String, ApiError> {
    Ok(format!("/webhooks/{}", path_segment(&subscription.webhook_id)?))
}

/// Verifies and normalizes one inbound delivery.
pub fn handle_delivery(
    raw_body: &[u8],
    signature: Option<&str>,
    options: &TriggerOptions,
    store: &impl WebhookStore,
) -> TriggerResponse {
    let subscription = store.load();

    if options.verify_signature {
        let secret = options
            .webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| subscription.as_ref().and_then(|s| s.secret.as_deref()))
            .filter(|s| !s.is_empty());
        if let Some(secret) = secret {
            let valid = signature.is_some_and(|sig| verify_signature(raw_body, sig, secret));
            if !valid {
                warn!("rejecting webhook delivery with bad signature");
                return TriggerResponse::Rejected {
                    status: 401,
                    body: json!({ "error": "Invalid signature" }),
                };
            }
        }
    }

    let payload: Value = match serde_json::from_slice(raw_body) {
        Ok(payload) => payload,
        Err(_) => {
            return TriggerResponse::Rejected {
                status: 400,
                body: json!({ "error": "Invalid JSON payload" }),
            }
        }
    };

    let event = first_truthy(&payload, &["event", "type"]).cloned();
    let timestamp = first_truthy(&payload, &["timestamp"])
        .cloned()
        .unwrap_or_else(|| json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)));
    let data = first_truthy(&payload, &["data"])
        .cloned()
        .unwrap_or_else(|| payload.clone());

    TriggerResponse::Accepted(json!({
        "event": event,
        "timestamp": timestamp,
        "data": data,
        "webhookId": subscription.map(|s| s.webhook_id),
    }))
}

fn first_truthy<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| payload.get(*k))
        .find(|v| truthy(v))
}

fn id_of(response: &Value) -> Option<String> {
    match response.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
