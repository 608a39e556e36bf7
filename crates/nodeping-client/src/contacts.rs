//! Contact operations
//!
//! Every call is one round trip. The only response the client interprets
//! itself is `{}`, which NodePing sends instead of a 404 when a lookup
//! matches nothing.

use reqwest::Method;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::{NodePingClient, decode, decode_or_absent, require};
use crate::error::{NodePingError, Result};
use crate::models::{Contact, unkeyable_address};

const CONTACTS_COLLECTION: &str = "contacts";
const CONTACTS_QUERY: &str = "contacts/";

impl NodePingClient {
    /// List all contacts of a customer
    ///
    /// The API keys contacts by id without repeating the id in the body, so
    /// each key is copied into [`Contact::id`]. Order is not significant.
    pub async fn list_contacts(
        &self,
        cancel: &CancellationToken,
        customer_id: &str,
    ) -> Result<Vec<Contact>> {
        require("customer_id", customer_id)?;

        let url = self.endpoint(CONTACTS_QUERY, &[("customerid", customer_id)])?;
        let body = self.request(cancel, Method::GET, &url, None).await?;

        let by_id: BTreeMap<String, Contact> =
            decode_or_absent(&body)?.ok_or_else(|| NodePingError::ContactsDoNotExist {
                customer_id: customer_id.to_string(),
            })?;

        let contacts: Vec<Contact> = by_id
            .into_iter()
            .map(|(id, mut contact)| {
                contact.id = id;
                contact
            })
            .collect();

        info!("Fetched {} contacts for customer {}", contacts.len(), customer_id);
        Ok(contacts)
    }

    /// Get a single contact
    pub async fn get_contact(
        &self,
        cancel: &CancellationToken,
        customer_id: &str,
        id: &str,
    ) -> Result<Contact> {
        require("customer_id", customer_id)?;
        require("id", id)?;

        let url = self.endpoint(CONTACTS_QUERY, &[("id", id), ("customerid", customer_id)])?;
        let body = self.request(cancel, Method::GET, &url, None).await?;

        decode_or_absent(&body)?.ok_or_else(|| NodePingError::ContactDoesNotExist {
            contact_id: id.to_string(),
        })
    }

    /// Create a contact together with all of its addresses
    ///
    /// Any id already set on `contact` or its addresses is ignored. The
    /// returned contact carries the ids the server assigned.
    pub async fn create_contact(
        &self,
        cancel: &CancellationToken,
        contact: &Contact,
    ) -> Result<Contact> {
        require("customer_id", &contact.customer_id)?;

        let payload = contact.to_create_json().map_err(NodePingError::Encode)?;
        let url = self.endpoint(CONTACTS_COLLECTION, &[])?;
        let body = self.request(cancel, Method::POST, &url, Some(payload)).await?;

        let created: Contact = decode(&body)?;
        info!("Created contact: {}", created.id);
        Ok(created)
    }

    /// Replace an existing contact
    ///
    /// `contact.addresses` is sent in full and the server treats it as the
    /// complete list: addresses missing from it are deleted, and ids the
    /// server does not know make the request fail. Put addresses to add in
    /// `contact.new_addresses`.
    pub async fn update_contact(
        &self,
        cancel: &CancellationToken,
        contact: &Contact,
    ) -> Result<Contact> {
        require("id", &contact.id)?;
        require("customer_id", &contact.customer_id)?;

        if let Some(problem) = unkeyable_address(&contact.addresses) {
            return Err(NodePingError::InvalidContact(problem));
        }

        let payload = contact.to_json().map_err(NodePingError::Encode)?;

        // The body names the identity `_id`, but the API looks for `id` in
        // the query string.
        let url = self.endpoint(
            CONTACTS_QUERY,
            &[
                ("id", contact.id.as_str()),
                ("customerid", contact.customer_id.as_str()),
            ],
        )?;
        let body = self.request(cancel, Method::PUT, &url, Some(payload)).await?;

        let updated: Contact = decode(&body)?;
        info!("Updated contact: {}", contact.id);
        Ok(updated)
    }

    /// Delete a contact
    ///
    /// Deleting a contact that is already gone is reported however the
    /// transport reports the server's answer; it is not mapped to
    /// [`NodePingError::ContactDoesNotExist`].
    pub async fn delete_contact(
        &self,
        cancel: &CancellationToken,
        customer_id: &str,
        id: &str,
    ) -> Result<()> {
        require("customer_id", customer_id)?;
        require("id", id)?;

        let url = self.endpoint(CONTACTS_QUERY, &[("id", id), ("customerid", customer_id)])?;
        self.request(cancel, Method::DELETE, &url, None).await?;

        info!("Deleted contact: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::models::{Address, CustomerRole};
    use crate::transport::Transport;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct RecordedRequest {
        method: Method,
        url: String,
        body: Option<Vec<u8>>,
    }

    impl RecordedRequest {
        fn json_body(&self) -> Value {
            serde_json::from_slice(self.body.as_deref().unwrap()).unwrap()
        }
    }

    /// Replies with a canned response and remembers what it was asked.
    struct StubTransport {
        reply: Mutex<Option<std::result::Result<Vec<u8>, TransportError>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl StubTransport {
        fn replying(body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(Ok(body.as_bytes().to_vec()))),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: TransportError) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(Err(err))),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for StubTransport {
        async fn do_request(
            &self,
            _cancel: &CancellationToken,
            method: Method,
            url: &str,
            body: Option<Vec<u8>>,
        ) -> std::result::Result<Vec<u8>, TransportError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                method,
                url: url.to_string(),
                body,
            });
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(TransportError::Other("no reply left".to_string())))
        }
    }

    const HOST: &str = "https://api.nodeping.com/api/1";

    fn client(transport: &Arc<StubTransport>) -> NodePingClient {
        NodePingClient::with_transport(HOST, transport.clone())
    }

    fn existing_contact() -> Contact {
        Contact {
            id: "ACCT-C1".to_string(),
            customer_id: "ACCT".to_string(),
            name: "Alice".to_string(),
            custrole: Some(CustomerRole::Notify),
            addresses: vec![Address::email("alice@example.com").with_id("A1")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_contacts_reinjects_keys() {
        let transport =
            StubTransport::replying(r#"{"c1": {"name":"Alice"}, "c2": {"name":"Bob"}}"#);
        let contacts = client(&transport)
            .list_contacts(&CancellationToken::new(), "acct1")
            .await
            .unwrap();

        let mut pairs: Vec<(String, String)> = contacts
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("c1".to_string(), "Alice".to_string()),
                ("c2".to_string(), "Bob".to_string()),
            ]
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].url, format!("{HOST}/contacts/?customerid=acct1"));
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn test_list_contacts_key_overrides_embedded_id() {
        let transport = StubTransport::replying(r#"{"c1": {"_id":"stale","name":"Alice"}}"#);
        let contacts = client(&transport)
            .list_contacts(&CancellationToken::new(), "acct1")
            .await
            .unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].id, "c1");
    }

    #[tokio::test]
    async fn test_list_contacts_sentinel() {
        let transport = StubTransport::replying("{}");
        let err = client(&transport)
            .list_contacts(&CancellationToken::new(), "acct1")
            .await
            .unwrap_err();
        match err {
            NodePingError::ContactsDoNotExist { customer_id } => assert_eq!(customer_id, "acct1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_contacts_requires_customer_id() {
        let transport = StubTransport::replying("{}");
        let err = client(&transport)
            .list_contacts(&CancellationToken::new(), "")
            .await
            .unwrap_err();
        assert!(matches!(err, NodePingError::MissingField("customer_id")));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_contacts_bad_shape_is_decode_error() {
        let transport = StubTransport::replying(r#"["c1", "c2"]"#);
        let err = client(&transport)
            .list_contacts(&CancellationToken::new(), "acct1")
            .await
            .unwrap_err();
        assert!(matches!(err, NodePingError::Decode(_)));
    }

    #[tokio::test]
    async fn test_get_contact() {
        let transport = StubTransport::replying(
            r#"{"_id":"ACCT-C1","customer_id":"ACCT","name":"Alice",
                "addresses":{"A1":{"address":"alice@example.com","type":"email"}}}"#,
        );
        let contact = client(&transport)
            .get_contact(&CancellationToken::new(), "ACCT", "ACCT-C1")
            .await
            .unwrap();

        assert_eq!(contact.id, "ACCT-C1");
        assert_eq!(contact.address("A1").unwrap().address, "alice@example.com");

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(
            requests[0].url,
            format!("{HOST}/contacts/?id=ACCT-C1&customerid=ACCT")
        );
    }

    #[tokio::test]
    async fn test_get_contact_sentinel() {
        let transport = StubTransport::replying("{}");
        let err = client(&transport)
            .get_contact(&CancellationToken::new(), "ACCT", "missing")
            .await
            .unwrap_err();
        match err {
            NodePingError::ContactDoesNotExist { contact_id } => assert_eq!(contact_id, "missing"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_contact_uses_create_encoding() {
        let transport = StubTransport::replying(
            r#"{"_id":"ACCT-NEW","customer_id":"ACCT","name":"Alice",
                "addresses":{"NEWA1":{"address":"alice@example.com","type":"email"}}}"#,
        );

        let mut contact = existing_contact();
        contact.id = "should-not-be-sent".to_string();

        let created = client(&transport)
            .create_contact(&CancellationToken::new(), &contact)
            .await
            .unwrap();
        assert_eq!(created.id, "ACCT-NEW");
        assert_eq!(created.addresses[0].id, "NEWA1");

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url, format!("{HOST}/contacts"));

        let body = requests[0].json_body();
        assert!(body.get("_id").is_none());
        assert_eq!(body["customerid"], "ACCT");
        assert_eq!(body["newaddresses"][0]["address"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_update_contact_sends_full_entity() {
        let transport = StubTransport::replying(r#"{"_id":"ACCT-C1","name":"Alice B."}"#);

        let mut contact = existing_contact();
        contact.name = "Alice B.".to_string();

        let updated = client(&transport)
            .update_contact(&CancellationToken::new(), &contact)
            .await
            .unwrap();
        assert_eq!(updated.name, "Alice B.");

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(
            requests[0].url,
            format!("{HOST}/contacts/?id=ACCT-C1&customerid=ACCT")
        );

        let body = requests[0].json_body();
        assert_eq!(body["_id"], "ACCT-C1");
        assert_eq!(body["name"], "Alice B.");
        assert_eq!(body["addresses"]["A1"]["address"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_update_contact_with_no_addresses_sends_empty_map() {
        let transport = StubTransport::replying(r#"{"_id":"ACCT-C1"}"#);

        let mut contact = existing_contact();
        contact.addresses.clear();

        client(&transport)
            .update_contact(&CancellationToken::new(), &contact)
            .await
            .unwrap();

        let body = transport.requests()[0].json_body();
        assert_eq!(body["addresses"], json!({}));
    }

    #[tokio::test]
    async fn test_update_contact_rejects_unkeyed_address() {
        let transport = StubTransport::replying(r#"{"_id":"ACCT-C1"}"#);

        let mut contact = existing_contact();
        contact.addresses.push(Address::email("new@example.com"));

        let err = client(&transport)
            .update_contact(&CancellationToken::new(), &contact)
            .await
            .unwrap_err();
        assert!(matches!(err, NodePingError::InvalidContact(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_contact_rejects_duplicate_address_ids() {
        let transport = StubTransport::replying(r#"{"_id":"ACCT-C1"}"#);

        let mut contact = existing_contact();
        contact.addresses = vec![
            Address::email("first@example.com").with_id("A1"),
            Address::email("second@example.com").with_id("A1"),
        ];

        let err = client(&transport)
            .update_contact(&CancellationToken::new(), &contact)
            .await
            .unwrap_err();
        match err {
            NodePingError::InvalidContact(message) => assert!(message.contains("'A1'")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_contact_requires_identity() {
        let transport = StubTransport::replying(r#"{"_id":"ACCT-C1"}"#);

        let mut contact = existing_contact();
        contact.id.clear();

        let err = client(&transport)
            .update_contact(&CancellationToken::new(), &contact)
            .await
            .unwrap_err();
        assert!(matches!(err, NodePingError::MissingField("id")));
    }

    #[tokio::test]
    async fn test_delete_contact_sends_no_body() {
        let transport = StubTransport::replying(r#"{"ok":true,"id":"ACCT-C1"}"#);
        client(&transport)
            .delete_contact(&CancellationToken::new(), "ACCT", "ACCT-C1")
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::DELETE);
        assert_eq!(
            requests[0].url,
            format!("{HOST}/contacts/?id=ACCT-C1&customerid=ACCT")
        );
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn test_delete_contact_ignores_body_content() {
        let transport = StubTransport::replying("not json at all");
        let result = client(&transport)
            .delete_contact(&CancellationToken::new(), "ACCT", "ACCT-C1")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_contact_passes_transport_failure_through() {
        let transport = StubTransport::failing(TransportError::Status {
            status: 404,
            message: "Contact not found".to_string(),
        });
        let err = client(&transport)
            .delete_contact(&CancellationToken::new(), "ACCT", "gone")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NodePingError::Transport(TransportError::Status { status: 404, .. })
        ));
    }
}
