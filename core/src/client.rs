//! Authenticated request builder, dispatcher and response parser for the
//! DealHub API.
//!
//! # Design
//! Every call is split into a `build_*` step that produces an `HttpRequest`
//! and a `parse_*` step that consumes an `HttpResponse`; `send`, `upload`
//! and `download` compose the two around the client's `Transport`. The
//! client holds only the credentials, the resolved base URL and the
//! transport, so it can be cloned and shared freely across concurrent
//! operation calls.

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::transfer::{BinaryData, Download, MultipartFile};

/// Value of the API version header sent with every request.
pub const API_VERSION: &str = "2024-01";
pub const VERSION_HEADER: &str = "X-DealHub-Version";
pub const SUBDOMAIN_HEADER: &str = "X-DealHub-Subdomain";

/// Client for one configured DealHub connection.
#[derive(Debug, Clone)]
pub struct DealHubClient<T = UreqTransport> {
    credentials: Credentials,
    base_url: String,
    transport: T,
}

impl DealHubClient<UreqTransport> {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(credentials, &ClientConfig::default())
    }

    pub fn with_config(credentials: Credentials, config: &ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(credentials, config, transport)
    }
}

impl<T: Transport> DealHubClient<T> {
    pub fn with_transport(credentials: Credentials, config: &ClientConfig, transport: T) -> Self {
        let base_url = config.base_url_for(credentials.environment);
        Self {
            credentials,
            base_url,
            transport,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Scheme and authority requests are sent to, without `/v1`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `{base_url}/v1{path}` with `query` encoded onto it. An empty query
    /// adds no `?`.
    pub fn url(&self, path: &str, query: Option<&Map<String, Value>>) -> Result<String, ApiError> {
        let mut url = Url::parse(&format!("{}/v1{}", self.base_url, path))
            .map_err(|e| ApiError::invalid("path", e.to_string()))?;

        let pairs = query.map(query_pairs).unwrap_or_default();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url.into())
    }

    /// Builds a JSON request. Empty `body` and `query` maps are left off the
    /// wire entirely.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Map<String, Value>>,
        query: Option<&Map<String, Value>>,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = self.auth_headers();
        headers.push(("Accept".to_string(), "application/json".to_string()));

        let body = match body.filter(|b| !b.is_empty()) {
            Some(map) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                Some(serde_json::to_vec(map).map_err(|e| ApiError::Serialization(e.to_string()))?)
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: self.url(path, query)?,
            headers,
            body,
        })
    }

    /// Builds a multipart upload of `file` under the form field `file`.
    pub fn build_upload(
        &self,
        path: &str,
        file_name: &str,
        file: &BinaryData,
    ) -> Result<HttpRequest, ApiError> {
        let part = MultipartFile::encode(file_name, &file.mime_type, &file.data)?;
        let mut headers = self.auth_headers();
        headers.push(("Accept".to_string(), "application/json".to_string()));
        headers.push(("Content-Type".to_string(), part.content_type));

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(path, None)?,
            headers,
            body: Some(part.body),
        })
    }

    /// Builds a GET whose response is kept as raw bytes.
    pub fn build_download(&self, path: &str) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.url(path, None)?,
            headers: self.auth_headers(),
            body: None,
        })
    }

    /// Parses a 2xx body as JSON (`null` when empty); maps anything else to
    /// `ApiError`.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_download(&self, response: HttpResponse) -> Result<Download, ApiError> {
        check_status(&response)?;
        let content_type = response.header("content-type").map(str::to_string);
        Ok(Download {
            bytes: response.body,
            content_type,
        })
    }

    /// Sends one authenticated JSON request and returns the parsed body.
    pub fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Map<String, Value>>,
        query: Option<&Map<String, Value>>,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(method, path, body, query)?;
        let response = self.dispatch(&request)?;
        self.parse_json(response)
    }

    pub fn upload(&self, path: &str, file_name: &str, file: &BinaryData) -> Result<Value, ApiError> {
        let request = self.build_upload(path, file_name, file)?;
        let response = self.dispatch(&request)?;
        self.parse_json(response)
    }

    pub fn download(&self, path: &str) -> Result<Download, ApiError> {
        let request = self.build_download(path)?;
        let response = self.dispatch(&request)?;
        self.parse_download(response)
    }

    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "dealhub request");
        let response = self
            .transport
            .execute(request)
            .map_err(|e| ApiError::transport(e.message))?;
        debug!(status = response.status, bytes = response.body.len(), "dealhub response");
        Ok(response)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.credentials.api_key),
            ),
            (VERSION_HEADER.to_string(), API_VERSION.to_string()),
            (
                SUBDOMAIN_HEADER.to_string(),
                self.credentials.subdomain.clone(),
            ),
        ]
    }
}

/// Percent-encodes a caller-supplied id for use as one path segment, so it
/// cannot add segments, a query or a fragment. `.` and `..` are refused
/// because URL parsing resolves them even when encoded.
pub fn path_segment(raw: &str) -> Result<String, ApiError> {
    if matches!(raw, "" | "." | "..") {
        return Err(ApiError::invalid("path", format!("{raw:?} is not a usable path segment")));
    }
    Ok(urlencoding::encode(raw).into_owned())
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, &response.body))
}

/// Flattens a query map into string pairs. Arrays repeat their key, objects
/// are sent as compact JSON and nulls are skipped.
fn query_pairs(query: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in query {
        match value {
            Value::Array(items) => {
                pairs.extend(items.iter().filter_map(query_text).map(|v| (key.clone(), v)));
            }
            other => pairs.extend(query_text(other).map(|v| (key.clone(), v))),
        }
    }
    pairs
}

fn query_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
