//! HTTP transport types and the blocking `ureq` transport.
//!
//! # Design
//! Requests and responses are described as plain data. The client builds an
//! `HttpRequest`, a `Transport` executes it, and the client parses the
//! resulting `HttpResponse`. Tests substitute their own `Transport` to script
//! responses and record what was sent; production code uses `UreqTransport`.
//!
//! Bodies are raw bytes so the same types carry JSON, multipart uploads and
//! binary downloads.

use std::time::Duration;

use thiserror::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether repeating the request has the same effect as sending it once.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, HttpMethod::Post | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and already carries the encoded query string.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// The request never produced an HTTP response (DNS, connect, TLS, timeout).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Executes an `HttpRequest` against the network (or a stand-in).
///
/// Implementations must return non-2xx responses as `Ok` data; only failures
/// that prevent a response from existing are `Err`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a shared `ureq::Agent`.
///
/// Status codes are returned as data rather than errors so the client can
/// interpret error envelopes itself.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(30)))
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), &request.headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), &request.headers).call(),
            HttpMethod::Post => send_body(
                with_headers(self.agent.post(url), &request.headers),
                request.body.as_deref(),
            ),
            HttpMethod::Put => send_body(
                with_headers(self.agent.put(url), &request.headers),
                request.body.as_deref(),
            ),
            HttpMethod::Patch => send_body(
                with_headers(self.agent.patch(url), &request.headers),
                request.body.as_deref(),
            ),
        };

        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&[u8]>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(bytes),
        None => builder.send_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/pdf".to_string())],
            body: Vec::new(),
        };
        assert_eq!(response.header("content-type"), Some("application/pdf"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn success_range() {
        let mut response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(response.is_success());
        response.status = 301;
        assert!(!response.is_success());
        response.status = 422;
        assert!(!response.is_success());
    }

    #[test]
    fn method_display_matches_wire_name() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }
}
