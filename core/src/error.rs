//! Error types for the DealHub client.
//!
//! # Design
//! Every remote-call failure becomes an `ApiError` whose `Display` is the
//! human-readable message a workflow user should see. `OperationError` wraps
//! it with the resource, operation and batch index so the host can decide
//! whether to continue with the remaining items.

use serde_json::Value;
use thiserror::Error;

pub(crate) const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Errors returned by the transport core and the operation table.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The API answered with a non-2xx status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    /// No HTTP response was received.
    #[error("{0}")]
    Transport(String),

    /// The response body could not be deserialized.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("no binary data found for property '{0}'")]
    MissingBinaryData(String),

    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("unknown operation '{operation}' for resource '{resource}'")]
    UnknownOperation { resource: String, operation: String },
}

impl ApiError {
    /// Builds the error for a non-2xx response, extracting the API's
    /// `{error: {message, details}}` envelope when present.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body).into_owned();
        let message = envelope_message(body).unwrap_or_else(|| {
            if text.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {text}")
            }
        });
        ApiError::Http {
            status,
            message,
            body: text,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            ApiError::Transport(UNKNOWN_ERROR.to_string())
        } else {
            ApiError::Transport(message)
        }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// `"<message> (field: msg, field: msg)"` from an error envelope, or `None`
/// when the body does not carry a non-empty `error.message`.
fn envelope_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error")?;
    let mut message = error
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())?
        .to_string();

    if let Some(details) = error.get("details").and_then(Value::as_array) {
        let joined = details
            .iter()
            .map(|d| {
                let field = d.get("field").and_then(Value::as_str).unwrap_or_default();
                let msg = d.get("message").and_then(Value::as_str).unwrap_or_default();
                format!("{field}: {msg}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        message.push_str(&format!(" ({joined})"));
    }

    Some(message)
}

/// An `ApiError` tagged with the operation and input item that produced it.
#[derive(Debug, Clone, Error)]
#[error("{source}")]
pub struct OperationError {
    pub resource: String,
    pub operation: String,
    pub item_index: usize,
    #[source]
    pub source: ApiError,
}
