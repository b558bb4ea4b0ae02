//! Query translation.
//!
//! Logical reads ("all customers", "customer named X") become N1QL
//! statements over the shared bucket, always filtered on the `kind`
//! discriminator. Result rows come back as `{ "id": <key>, "doc": <document> }`
//! and are decoded into entities; rows that do not decode are skipped.

use serde::Deserialize;
use serde_json::{Map, Value};

use domain::RecordId;

use crate::infra::Rows;
use crate::repository::entities::{Document, Entity, Kind};

/// Alias bound to the keyspace in every statement
const ALIAS: &str = "d";

/// N1QL `SELECT` over one keyspace with equality conditions.
///
/// Condition values travel as named parameters (`$<field>`), never inlined
/// into the statement text.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    keyspace: String,
    conditions: Vec<(String, Value)>,
}

impl Statement {
    /// Select every document in `keyspace`.
    pub fn select(keyspace: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            conditions: Vec::new(),
        }
    }

    /// Add an equality condition on a top-level document field.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Keyspace (bucket) the statement reads from.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// Statement text.
    pub fn n1ql(&self) -> String {
        let mut text = format!(
            "SELECT META({a}).id AS id, {a} AS doc FROM `{ks}` AS {a}",
            a = ALIAS,
            ks = self.keyspace
        );

        for (i, (field, _)) in self.conditions.iter().enumerate() {
            text.push_str(if i == 0 { " WHERE " } else { " AND " });
            text.push_str(&format!("{}.`{}` = ${}", ALIAS, field, field));
        }

        text
    }

    /// Named parameters, keyed `$<field>`.
    pub fn params(&self) -> Map<String, Value> {
        self.conditions
            .iter()
            .map(|(field, value)| (format!("${}", field), value.clone()))
            .collect()
    }

    /// Evaluate the conditions against a document.
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }
}

/// Every record of one kind.
pub fn all_of_kind(keyspace: &str, kind: Kind) -> Statement {
    Statement::select(keyspace).where_eq("kind", kind.as_str())
}

/// Customer records with the given username.
pub fn customer_by_username(keyspace: &str, username: &str) -> Statement {
    all_of_kind(keyspace, Kind::Customer).where_eq("username", username)
}

#[derive(Deserialize)]
struct Row {
    id: RecordId,
    doc: Document,
}

/// Drain a row cursor into entities of type `E`.
///
/// Rows that fail to decode, or that hold a different kind of record, are
/// logged and dropped; the scan always runs to the end of the cursor.
pub async fn decode_rows<E: Entity>(mut rows: Rows) -> Vec<E> {
    let mut entities = Vec::new();
    let mut skipped = 0usize;

    while let Some(raw) = rows.next().await {
        let row = match serde_json::from_value::<Row>(raw) {
            Ok(row) => row,
            Err(e) => {
                skipped += 1;
                tracing::warn!(kind = %E::KIND, error = %e, "Skipping malformed row");
                continue;
            }
        };

        match E::from_document(row.id, row.doc) {
            Ok(entity) => entities.push(entity),
            Err(actual) => {
                skipped += 1;
                tracing::warn!(expected = %E::KIND, actual = %actual, "Skipping row of another kind");
            }
        }
    }

    tracing::debug!(kind = %E::KIND, decoded = entities.len(), skipped, "Rows decoded");
    entities
}
