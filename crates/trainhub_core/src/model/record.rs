//! Stored record envelope shared by every entity type.
//!
//! # Responsibility
//! - Define the generated fields (`id`, `created_date`, `updated_date`).
//! - Bind one typed domain payload to those fields.
//!
//! # Invariants
//! - `id` and `created_date` are assigned by the store, never by callers.
//! - `updated_date` stays `None` until the first successful update.
//! - Serialized form is flat: generated and domain fields share one object.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Wall-clock instant used for `created_date`/`updated_date`.
pub type Timestamp = DateTime<Utc>;

/// Untyped field bag as sent by form payloads and update patches.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Field names owned by the store. Callers cannot set them.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created_date", "updated_date"];

/// Identifier of one stored record.
///
/// Seed data carries mnemonic ids (`"s1"`, `"en1"`); generated ids are
/// decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Numeric value of the id, when it is a plain decimal string.
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for RecordId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RecordId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Domain payload that can live in an entity store.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name used in errors and log lines.
    const NAME: &'static str;

    /// Cross-field checks run on every write. Type shape is already enforced
    /// by deserialization.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// One stored item: generated fields plus the typed domain payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: RecordId,
    pub created_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<Timestamp>,
    #[serde(flatten)]
    pub fields: T,
}

impl<T: Entity> Record<T> {
    /// Wraps `fields` with store-generated identity.
    pub fn new(id: RecordId, created_date: Timestamp, fields: T) -> Self {
        Self {
            id,
            created_date,
            updated_date: None,
            fields,
        }
    }

    /// Flat JSON view used for loose field matching.
    pub fn to_field_map(&self) -> FieldMap {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => FieldMap::new(),
        }
    }
}

/// Removes store-owned keys from a caller payload.
pub fn strip_reserved(mut fields: FieldMap) -> FieldMap {
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }
    fields
}
