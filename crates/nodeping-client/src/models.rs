//! Data models for NodePing contacts
//!
//! A contact has two wire encodings. [`Contact::to_json`] is the general one
//! (plain serde, used for updates and understood by decoding), and
//! [`Contact::to_create_json`] produces the body the create endpoint expects.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Access level of a contact within its account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CustomerRole {
    Owner,
    Edit,
    View,
    Notify,
}

/// Delivery method of an address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    #[default]
    Email,
    Sms,
    Voice,
    Webhook,
    Pushover,
    Slack,
    Hipchat,
    Pushbullet,
    Discord,
    Teams,
    /// Any type this crate does not know about, kept verbatim
    #[serde(untagged)]
    Other(String),
}

impl AddressType {
    /// Map a wire name to its type. Known names always give the named
    /// variant, so `Other` never holds one of them.
    pub fn from_name(name: &str) -> Self {
        match name {
            "email" => Self::Email,
            "sms" => Self::Sms,
            "voice" => Self::Voice,
            "webhook" => Self::Webhook,
            "pushover" => Self::Pushover,
            "slack" => Self::Slack,
            "hipchat" => Self::Hipchat,
            "pushbullet" => Self::Pushbullet,
            "discord" => Self::Discord,
            "teams" => Self::Teams,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<&str> for AddressType {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

/// Mute state of an address: a plain switch or a millisecond timestamp
/// until which notifications are held back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Mute {
    Flag(bool),
    Until(u64),
}

/// A delivery address belonging to a contact
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Address {
    /// Server-assigned id; on the wire this is the key of the `addresses`
    /// object, never a field of the address itself.
    #[serde(skip)]
    pub id: String,
    /// Email, phone number, URL, user key... depending on `address_type`
    #[serde(default)]
    pub address: String,
    #[serde(rename = "type", default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub suppressup: bool,
    #[serde(default)]
    pub suppressdown: bool,
    #[serde(default)]
    pub suppressfirst: bool,
    #[serde(default)]
    pub suppressall: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute: Option<Mute>,
    /// Webhook HTTP method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Webhook body fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub querystrings: Option<BTreeMap<String, String>>,
    /// Pushover priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl Address {
    /// Create a new address
    pub fn new(address_type: AddressType, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            address_type,
            ..Default::default()
        }
    }

    /// Create an email address
    pub fn email(address: impl Into<String>) -> Self {
        Self::new(AddressType::Email, address)
    }

    /// Create a webhook address
    pub fn webhook(url: impl Into<String>, action: impl Into<String>) -> Self {
        let mut address = Self::new(AddressType::Webhook, url);
        address.action = Some(action.into());
        address
    }

    /// Attach the server-assigned id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the mute state
    pub fn with_mute(mut self, mute: Mute) -> Self {
        self.mute = Some(mute);
        self
    }
}

/// A NodePing contact: a notification target with its delivery addresses
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Contact {
    /// Server-assigned id
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Owning account
    #[serde(default)]
    pub customer_id: String,
    /// Record kind as reported by the server
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custrole: Option<CustomerRole>,
    /// Existing addresses. On update this list is authoritative: anything
    /// left out is deleted by the server.
    #[serde(default, with = "address_map")]
    pub addresses: Vec<Address>,
    /// Addresses to add in an update
    #[serde(
        rename = "newaddresses",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub new_addresses: Vec<Address>,
}

impl Contact {
    /// Create a new contact for an account
    pub fn new(customer_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the customer role
    pub fn with_role(mut self, role: CustomerRole) -> Self {
        self.custrole = Some(role);
        self
    }

    /// Add an address. Addresses with an id go to `addresses`, the rest to
    /// `new_addresses`.
    pub fn with_address(mut self, address: Address) -> Self {
        if address.id.is_empty() {
            self.new_addresses.push(address);
        } else {
            self.addresses.push(address);
        }
        self
    }

    /// Look up an existing address by id
    pub fn address(&self, id: &str) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == id)
    }

    /// General encoding: the full entity, `_id` included when set.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Create encoding: no identity, every address sent as a new one.
    pub fn to_create_json(&self) -> serde_json::Result<Vec<u8>> {
        let newaddresses = self
            .addresses
            .iter()
            .chain(self.new_addresses.iter())
            .map(NewAddress::from)
            .collect();

        serde_json::to_vec(&CreateContact {
            customerid: &self.customer_id,
            name: &self.name,
            custrole: self.custrole,
            newaddresses,
        })
    }
}

/// Request body of `POST /contacts`
#[derive(Serialize)]
struct CreateContact<'a> {
    customerid: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    custrole: Option<CustomerRole>,
    newaddresses: Vec<NewAddress<'a>>,
}

/// An address as the create endpoint takes it: no id, mute always present.
#[derive(Serialize)]
struct NewAddress<'a> {
    address: &'a str,
    #[serde(rename = "type")]
    address_type: &'a AddressType,
    suppressup: bool,
    suppressdown: bool,
    suppressfirst: bool,
    suppressall: bool,
    mute: Mute,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    querystrings: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
}

impl<'a> From<&'a Address> for NewAddress<'a> {
    fn from(a: &'a Address) -> Self {
        Self {
            address: &a.address,
            address_type: &a.address_type,
            suppressup: a.suppressup,
            suppressdown: a.suppressdown,
            suppressfirst: a.suppressfirst,
            suppressall: a.suppressall,
            mute: a.mute.unwrap_or(Mute::Flag(false)),
            action: a.action.as_deref(),
            data: a.data.as_ref(),
            headers: a.headers.as_ref(),
            querystrings: a.querystrings.as_ref(),
            priority: a.priority,
        }
    }
}

/// First address in `addresses` that cannot be written as a map key:
/// either it has no id or its id was already used.
pub(crate) fn unkeyable_address(addresses: &[Address]) -> Option<String> {
    let mut seen = HashSet::new();
    for address in addresses {
        if address.id.is_empty() {
            return Some(format!(
                "address '{}' has no id; new addresses belong in new_addresses",
                address.address
            ));
        }
        if !seen.insert(address.id.as_str()) {
            return Some(format!("address id '{}' appears more than once", address.id));
        }
    }
    None
}

/// `addresses` travels as `{ "<id>": { ... } }`; the key becomes `Address::id`.
/// Entries keep the order they have on the wire.
mod address_map {
    use super::{Address, unkeyable_address};
    use serde::de::{MapAccess, Visitor};
    use serde::ser::{Error as _, SerializeMap};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(addresses: &[Address], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Some(problem) = unkeyable_address(addresses) {
            return Err(S::Error::custom(problem));
        }

        let mut map = serializer.serialize_map(Some(addresses.len()))?;
        for address in addresses {
            map.serialize_entry(&address.id, address)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Address>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(AddressMapVisitor)
    }

    struct AddressMapVisitor;

    impl<'de> Visitor<'de> for AddressMapVisitor {
        type Value = Vec<Address>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object mapping address ids to addresses")
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(self)
        }

        fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut addresses = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((id, mut address)) = access.next_entry::<String, Address>()? {
                address.id = id;
                addresses.push(address);
            }
            Ok(addresses)
        }
    }
}
