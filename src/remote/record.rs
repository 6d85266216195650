//! Remote record types.
//!
//! Redmine returns loosely-typed JSON objects. [`RemoteRecord`] keeps the object as a
//! field map with its numeric id lifted out, so the graph can ask for arbitrary
//! attributes without a schema per resource kind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A remote object: a numeric id plus its fields.
///
/// A record is *partial* when it comes from a list response or is nested inside
/// another record (`{"id": 3, "name": "Alice"}`), and *full* when fetched on its own,
/// which is where custom fields appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Remote identity
    pub id: u64,

    /// Every other field of the object
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RemoteRecord {
    /// Create a record with only an id.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Builder-style field setter, mostly useful for fixtures.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Parse a record from a JSON object that carries a numeric `id`.
    ///
    /// Returns `None` for anything else, including objects whose id is missing.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let id = object.get("id")?.as_u64()?;
        let mut fields = object.clone();
        fields.remove("id");
        Some(Self {
            id,
            fields,
        })
    }

    /// Display name, when the record has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// A field value, treating JSON `null` as absent.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// A nested object reference such as `"project": {"id": 1, "name": "Alpha"}`.
    #[must_use]
    pub fn nested(&self, name: &str) -> Option<RemoteRecord> {
        self.field(name).and_then(Self::from_value)
    }

    /// First custom field called `name` with a non-null value.
    ///
    /// Custom fields are read from the `custom_fields: [{name, value}]` array of a
    /// full record. An empty string counts as a value.
    #[must_use]
    pub fn custom_field(&self, name: &str) -> Option<&Value> {
        self.fields.get("custom_fields")?.as_array()?.iter().find_map(|entry| {
            if entry.get("name").and_then(Value::as_str) != Some(name) {
                return None;
            }
            entry.get("value").filter(|v| !v.is_null())
        })
    }

    /// Lightweight reference to this record.
    #[must_use]
    pub fn to_ref(&self) -> RemoteRef {
        RemoteRef {
            id: self.id,
            name: self.name().map(str::to_string),
        }
    }
}

/// Identity and display name of a remote object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRef {
    /// Remote identity
    pub id: u64,
    /// Display name, when known
    #[serde(default)]
    pub name: Option<String>,
}

impl From<RemoteRef> for RemoteRecord {
    fn from(reference: RemoteRef) -> Self {
        let record = RemoteRecord::new(reference.id);
        match reference.name {
            Some(name) => record.with_field("name", name),
            None => record,
        }
    }
}

/// One page of a paginated time-entry query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records on this page, in remote order
    pub records: Vec<RemoteRecord>,
    /// Number of records matching the query across all pages
    pub total_count: usize,
}
