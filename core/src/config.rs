//! Client configuration.
//!
//! Defaults target the public DealHub API. `from_env` lets deployments point
//! at a proxy or a local mock without code changes.

use std::time::Duration;

use crate::credentials::Environment;

pub const DEFAULT_API_HOST: &str = "dealhub.io";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables that are not part of the credential record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host suffix combined with the environment prefix (`api.` or
    /// `sandbox-api.`).
    pub api_host: String,
    /// Full base URL (scheme + authority, no `/v1`) used instead of the
    /// environment-derived one.
    pub base_url: Option<String>,
    /// Whole-request timeout; `None` disables it.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            base_url: None,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Reads `DEALHUB_API_HOST`, `DEALHUB_BASE_URL` and
    /// `DEALHUB_TIMEOUT_SECS` (`0` disables the timeout). Unset or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup("DEALHUB_API_HOST").filter(|h| !h.is_empty()) {
            config.api_host = host;
        }
        config.base_url = lookup("DEALHUB_BASE_URL").filter(|u| !u.is_empty());
        if let Some(secs) = lookup("DEALHUB_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL for `environment`, honoring the override. Never ends in `/`.
    pub fn base_url_for(&self, environment: Environment) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => environment.base_url(&self.api_host),
        }
    }
}
