//! User (customer) record.

use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Customer account record.
///
/// Addresses and cards are separate records, referenced by identifier and
/// never embedded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Assigned by the store on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub username: String,
    /// Password hash (see [`crate::Password`])
    #[serde(default)]
    pub password: String,
    /// Identifiers of this user's address records
    #[serde(default)]
    pub addresses: Vec<RecordId>,
    /// Identifiers of this user's card records
    #[serde(default)]
    pub cards: Vec<RecordId>,
}

impl User {
    /// Create a user with the given username and no other attributes.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter for first and last name.
    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Builder-style setter for email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Builder-style setter for the stored password hash.
    pub fn with_password(mut self, password_hash: impl Into<String>) -> Self {
        self.password = password_hash.into();
        self
    }
}
