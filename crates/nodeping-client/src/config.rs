//! Client configuration
//!
//! Values are read with the following precedence:
//! 1. Environment variables (`from_env`)
//! 2. Whatever the embedding application deserialized
//! 3. Defaults

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{NodePingError, Result};

/// Default NodePing API endpoint
pub const DEFAULT_HOST_URL: &str = "https://api.nodeping.com/api/1";

/// NodePing client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API token, sent as the basic-auth user name
    pub api_token: String,

    /// Base URL of the API, without a trailing slash
    #[serde(default = "default_host_url")]
    pub host_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host_url() -> String {
    DEFAULT_HOST_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    /// Create a config for the public NodePing API
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            host_url: default_host_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Point the client at a different host (self-hosted proxy, test server)
    pub fn with_host_url(mut self, host_url: impl Into<String>) -> Self {
        self.host_url = host_url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Load configuration from the environment
    ///
    /// `NODEPING_API_TOKEN` is required; `NODEPING_HOST_URL` and
    /// `NODEPING_TIMEOUT_SECS` override the defaults when set and non-empty.
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("NODEPING_API_TOKEN").unwrap_or_default();
        let mut config = Self::new(api_token);

        if let Ok(host_url) = std::env::var("NODEPING_HOST_URL") {
            if !host_url.is_empty() {
                config.host_url = host_url;
            }
        }

        if let Ok(timeout) = std::env::var("NODEPING_TIMEOUT_SECS") {
            if !timeout.is_empty() {
                config.timeout_secs = timeout.parse().map_err(|e| {
                    NodePingError::Configuration(format!(
                        "NODEPING_TIMEOUT_SECS must be a whole number of seconds: {}",
                        e
                    ))
                })?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the config can be used to build a client
    pub fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            return Err(NodePingError::Configuration(
                "NodePing API token is not set".to_string(),
            ));
        }
        if self.host_url.is_empty() {
            return Err(NodePingError::Configuration(
                "NodePing host URL is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Host URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.host_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
