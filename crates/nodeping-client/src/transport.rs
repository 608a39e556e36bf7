//! HTTP transport
//!
//! [`Transport`] is the only thing the contact operations talk to. The
//! default [`HttpTransport`] speaks to the NodePing API with reqwest; tests
//! and embedding applications can supply their own.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{NodePingError, Result, TransportError};

/// Performs a single HTTP round trip.
///
/// Implementations must honor `cancel` and return the raw body of a 2xx
/// response. Any other outcome is an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn do_request(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> std::result::Result<Vec<u8>, TransportError>;
}

/// Error body NodePing sends with non-2xx responses
#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// reqwest-backed transport authenticating with an API token
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    api_token: String,
}

impl HttpTransport {
    /// Create a new transport from the client config
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| NodePingError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_token: config.api_token.clone(),
        })
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .basic_auth(&self.api_token, None::<&str>)
            .header("Accept", "application/json");

        if let Some(body) = body {
            request = request.header("Content-Type", "application/json").body(body);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|b| b.error)
                .unwrap_or(error_text);
            error!("{} {} failed: {} - {}", method, url, status, message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        debug!("{} {} -> {} ({} bytes)", method, url, status, bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn do_request(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("{} {} cancelled", method, url);
                Err(TransportError::Cancelled)
            }
            result = self.send(method.clone(), url, body) => result,
        }
    }
}
