//! Tagged document schema for the shared bucket.
//!
//! Users, addresses and cards live side by side in one bucket. Every stored
//! document carries a `kind` discriminator and its own `_id`; customer
//! documents also carry the `addresses` and `cards` identifier lists.

use serde::{Deserialize, Serialize};

use domain::{Address, Card, RecordId, User, KIND_ADDRESS, KIND_CARD, KIND_CUSTOMER};

/// Record kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Customer,
    Address,
    Card,
}

impl Kind {
    /// Discriminator value as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Customer => KIND_CUSTOMER,
            Kind::Address => KIND_ADDRESS,
            Kind::Card => KIND_CARD,
        }
    }

    /// Plural noun used in error context.
    pub fn plural(&self) -> &'static str {
        match self {
            Kind::Customer => "customers",
            Kind::Address => "addresses",
            Kind::Card => "cards",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            KIND_CUSTOMER => Ok(Kind::Customer),
            KIND_ADDRESS => Ok(Kind::Address),
            KIND_CARD => Ok(Kind::Card),
            other => Err(format!("unknown record kind '{}'", other)),
        }
    }
}

/// Customer document. The reference lists travel with the flattened user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub user: User,
}

/// Address document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub address: Address,
}

/// Card document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub card: Card,
}

/// Any stored document, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Document {
    Customer(CustomerRecord),
    Address(AddressRecord),
    Card(CardRecord),
}

impl Document {
    pub fn kind(&self) -> Kind {
        match self {
            Document::Customer(_) => Kind::Customer,
            Document::Address(_) => Kind::Address,
            Document::Card(_) => Kind::Card,
        }
    }
}

/// Domain record that can be stored as a [`Document`].
pub trait Entity: Sized + Send + 'static {
    /// Discriminator written on create and filtered on read
    const KIND: Kind;

    /// Wrap the record for storage under `id`.
    fn into_document(self, id: RecordId) -> Document;

    /// Unwrap a stored document found under `id`.
    ///
    /// Returns the document's actual kind if it is not a `Self::KIND` record.
    fn from_document(id: RecordId, document: Document) -> Result<Self, Kind>;
}

impl Entity for User {
    const KIND: Kind = Kind::Customer;

    /// New customers start with no address or card references.
    fn into_document(mut self, id: RecordId) -> Document {
        self.id = None;
        self.addresses.clear();
        self.cards.clear();
        Document::Customer(CustomerRecord { id, user: self })
    }

    fn from_document(id: RecordId, document: Document) -> Result<Self, Kind> {
        match document {
            Document::Customer(record) => {
                let mut user = record.user;
                user.id = Some(id);
                Ok(user)
            }
            other => Err(other.kind()),
        }
    }
}

impl Entity for Address {
    const KIND: Kind = Kind::Address;

    fn into_document(mut self, id: RecordId) -> Document {
        self.id = None;
        Document::Address(AddressRecord { id, address: self })
    }

    fn from_document(id: RecordId, document: Document) -> Result<Self, Kind> {
        match document {
            Document::Address(record) => {
                let mut address = record.address;
                address.id = Some(id);
                Ok(address)
            }
            other => Err(other.kind()),
        }
    }
}

impl Entity for Card {
    const KIND: Kind = Kind::Card;

    fn into_document(mut self, id: RecordId) -> Document {
        self.id = None;
        Document::Card(CardRecord { id, card: self })
    }

    fn from_document(id: RecordId, document: Document) -> Result<Self, Kind> {
        match document {
            Document::Card(record) => {
                let mut card = record.card;
                card.id = Some(id);
                Ok(card)
            }
            other => Err(other.kind()),
        }
    }
}
