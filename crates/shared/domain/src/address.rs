//! Postal address record.

use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Postal address referenced by one or more users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    pub postcode: String,
}
