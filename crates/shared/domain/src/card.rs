//! Payment card record.

use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Payment card referenced by one or more users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Full card number
    #[serde(rename = "longNum")]
    pub long_num: String,
    #[serde(default)]
    pub expires: String,
    #[serde(default)]
    pub ccv: String,
}
