//! Error types for nodeping-client

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::transport::Transport).
///
/// The contact operations never inspect these; they are handed back to the
/// caller unchanged inside [`NodePingError::Transport`].
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NodePing API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// nodeping-client error type
#[derive(Error, Debug)]
pub enum NodePingError {
    /// The API answered a customer-wide listing with `{}`.
    #[error("Contacts for customer '{customer_id}' do not exist.")]
    ContactsDoNotExist { customer_id: String },

    /// The API answered a single-contact lookup with `{}`.
    #[error("Contact '{contact_id}' does not exist.")]
    ContactDoesNotExist { contact_id: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid contact: {0}")]
    InvalidContact(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl NodePingError {
    /// True for the two `{}` sentinel errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ContactsDoNotExist { .. } | Self::ContactDoesNotExist { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, NodePingError>;
