//! NodePing API client

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{NodePingError, Result};
use crate::transport::{HttpTransport, Transport};

/// Client for the NodePing HTTP API
///
/// Holds nothing but the host URL and a shared transport, so clones are
/// cheap and may be used from many tasks at once.
#[derive(Clone)]
pub struct NodePingClient {
    transport: Arc<dyn Transport>,
    host_url: String,
}

impl NodePingClient {
    /// Create a client that talks HTTP to the configured host
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        let client = Self::with_transport(config.base_url(), Arc::new(transport));

        info!("NodePing client initialized for: {}", client.host_url);
        Ok(client)
    }

    /// Create a client on top of an existing transport
    pub fn with_transport(host_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let host_url = host_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            host_url,
        }
    }

    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    /// `{host}/{path}` with the given query parameters appended in order
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let base = format!("{}/{}", self.host_url, path);
        let url = if query.is_empty() {
            Url::parse(&base)?
        } else {
            Url::parse_with_params(&base, query)?
        };
        Ok(url.into())
    }

    /// Issue one request and hand back the raw body
    pub(crate) async fn request(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        debug!("{} {}", method, url);
        let response = self.transport.do_request(cancel, method, url, body).await?;
        Ok(response)
    }
}

/// Decode a response body, treating the `{}` sentinel as absence.
///
/// The body is parsed as a generic JSON value first so that `{}` is never
/// fed to the typed decoder.
pub(crate) fn decode_or_absent<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(NodePingError::Decode)?;

    if value.as_object().is_some_and(|m| m.is_empty()) {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(NodePingError::Decode)
}

/// Decode a response body with no sentinel handling
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(NodePingError::Decode)
}

/// Reject empty identifiers before anything goes on the wire
pub(crate) fn require(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(NodePingError::MissingField(field));
    }
    Ok(())
}
