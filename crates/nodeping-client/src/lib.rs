//! nodeping-client: NodePing contacts API client
//!
//! Typed CRUD over NodePing contacts (alert notification targets and their
//! delivery addresses).
//!
//! ## Features
//!
//! - List, get, create, update and delete contacts
//! - `{}` responses surfaced as typed "not found" errors
//! - Separate request encodings for create and update
//! - Pluggable [`Transport`]; [`HttpTransport`] is the reqwest default
//! - Cancellation through [`CancellationToken`](tokio_util::sync::CancellationToken)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nodeping_client::{Address, ClientConfig, Contact, NodePingClient};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = NodePingClient::new(ClientConfig::from_env()?)?;
//! let cancel = CancellationToken::new();
//!
//! // Create a contact
//! let contact = Contact::new("201205050153W2Q4C", "On-call")
//!     .with_address(Address::email("oncall@example.com"));
//! let created = client.create_contact(&cancel, &contact).await?;
//!
//! // List every contact of the account
//! for contact in client.list_contacts(&cancel, "201205050153W2Q4C").await? {
//!     println!("{} {}", contact.id, contact.name);
//! }
//!
//! client.delete_contact(&cancel, &created.customer_id, &created.id).await?;
//! ```

pub mod client;
pub mod config;
mod contacts;
pub mod error;
pub mod models;
pub mod transport;

pub use client::NodePingClient;
pub use config::ClientConfig;
pub use error::{NodePingError, Result, TransportError};
pub use models::{Address, AddressType, Contact, CustomerRole, Mute};
pub use transport::{HttpTransport, Transport};

/// Re-export models for easy use
pub mod prelude {
    pub use super::{Address, ClientConfig, Contact, NodePingClient};
}
