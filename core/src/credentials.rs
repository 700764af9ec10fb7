//! Connection credentials and environment-to-URL selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which DealHub deployment a connection talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    /// `https://api.<host>` or `https://sandbox-api.<host>`.
    pub fn base_url(self, api_host: &str) -> String {
        match self {
            Environment::Production => format!("https://api.{api_host}"),
            Environment::Sandbox => format!("https://sandbox-api.{api_host}"),
        }
    }
}

/// An API connection as configured by the host. Immutable once built.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub api_key: String,
    #[serde(default)]
    pub environment: Environment,
    pub subdomain: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        environment: Environment,
        subdomain: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            environment,
            subdomain: subdomain.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("environment", &self.environment)
            .field("subdomain", &self.subdomain)
            .finish()
    }
}
