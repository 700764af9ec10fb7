//! Cursor pagination over list endpoints.
//!
//! List responses look like
//! `{"data": [...], "pagination": {"has_more": bool, "next_cursor": "..."}}`.
//! The walker keeps requesting pages while `has_more` is true and a cursor
//! came back. A page that claims more results without a cursor ends the walk.

use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::client::DealHubClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, Transport};

/// Page size used when collecting every record.
pub const PAGE_SIZE: u64 = 100;

/// The `pagination` block of a list response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub total_count: Option<u64>,
}

impl Pagination {
    /// Reads the block from a response field by field. Only `has_more` and
    /// `next_cursor` decide whether the walk continues; a field of an
    /// unexpected type is ignored instead of discarding the whole block.
    pub fn from_response(response: &Value) -> Self {
        let Some(block) = response.get("pagination") else {
            return Self::default();
        };
        Self {
            has_more: block.get("has_more") == Some(&Value::Bool(true)),
            next_cursor: block.get("next_cursor").and_then(cursor_text),
            total_count: block.get("total_count").and_then(count),
        }
    }

    /// The cursor for the next request, or `None` when the walk is over.
    pub fn continuation(&self) -> Option<&str> {
        if !self.has_more {
            return None;
        }
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Cursors are opaque strings; numeric ones are sent as their decimal text.
fn cursor_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        _ => None,
    }
}

fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `response.data` when it is an array.
fn page_records(response: &mut Value) -> Option<Vec<Value>> {
    match response.get_mut("data").map(Value::take) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

impl<T: Transport> DealHubClient<T> {
    /// Collects every record of a list endpoint, one page at a time.
    ///
    /// Any caller-supplied `limit` is replaced by [`PAGE_SIZE`].
    pub fn fetch_all(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Map<String, Value>>,
        query: Option<&Map<String, Value>>,
    ) -> Result<Vec<Value>, ApiError> {
        let mut query = query.cloned().unwrap_or_default();
        query.insert("limit".to_string(), Value::from(PAGE_SIZE));

        let mut records = Vec::new();
        let mut pages = 0usize;
        loop {
            let mut response = self.send(method, path, body, Some(&query))?;
            pages += 1;

            if let Some(items) = page_records(&mut response) {
                records.extend(items);
            }

            let pagination = Pagination::from_response(&response);
            match pagination.continuation() {
                Some(cursor) => {
                    query.insert("cursor".to_string(), Value::from(cursor));
                }
                None => {
                    if pagination.has_more {
                        warn!(path, pages, "list reported has_more without a cursor, stopping");
                    }
                    break;
                }
            }
        }
        Ok(records)
    }

    /// Issues exactly one GET with the caller's `limit` and returns the
    /// page's records (empty when the response has no `data` array).
    pub fn fetch_page(
        &self,
        path: &str,
        query: Option<&Map<String, Value>>,
        limit: u64,
    ) -> Result<Vec<Value>, ApiError> {
        let mut query = query.cloned().unwrap_or_default();
        query.insert("limit".to_string(), Value::from(limit));
        let mut response = self.send(HttpMethod::Get, path, None, Some(&query))?;
        Ok(page_records(&mut response).unwrap_or_default())
    }
}
