//! Optional retrying wrapper around any `Transport`.
//!
//! The client itself never retries. Callers that want resilience against
//! flaky networks or rate limiting wrap their transport:
//!
//! ```no_run
//! use dealhub_core::{ClientConfig, Credentials, DealHubClient, Environment, RetryPolicy, RetryTransport, UreqTransport};
//!
//! let config = ClientConfig::default();
//! let transport = RetryTransport::new(UreqTransport::new(config.timeout), RetryPolicy::default());
//! let client = DealHubClient::with_transport(
//!     Credentials::new("key", Environment::Production, "acme"),
//!     &config,
//!     transport,
//! );
//! ```

use std::time::Duration;

use tracing::warn;

use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};

/// Exponential backoff settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): doubles each time,
    /// capped at `max_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Retries `429` and `5xx` responses for every method. Transport failures
/// (timeouts, resets) are retried only for idempotent methods: a POST or
/// PATCH that timed out may already have been applied, so it is returned to
/// the caller instead of being sent again.
#[derive(Debug, Clone)]
pub struct RetryTransport<T> {
    inner: T,
    policy: RetryPolicy,
    sleep: fn(Duration),
}

impl<T: Transport> RetryTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            sleep: std::thread::sleep,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    #[cfg(test)]
    fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }
}

fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

impl<T: Transport> Transport for RetryTransport<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut attempt = 0;
        loop {
            let outcome = self.inner.execute(request);
            let retry = match &outcome {
                Ok(response) => is_retryable(response.status),
                Err(_) => request.method.is_idempotent(),
            };
            if !retry || attempt >= self.policy.max_retries {
                return outcome;
            }

            let delay = self.policy.delay(attempt);
            match &outcome {
                Ok(response) => warn!(status = response.status, attempt, ?delay, "retrying request"),
                Err(e) => warn!(error = %e, attempt, ?delay, "retrying request"),
            }
            (self.sleep)(delay);
            attempt += 1;
        }
    }
}
