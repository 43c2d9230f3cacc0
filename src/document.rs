// Document primitives shared by the store, the schemas, and the models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Identifier assigned by the store on insert.
pub type DocumentId = i64;

/// The two collections this crate persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Pages,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Pages => "pages",
            Collection::Users => "users",
        }
    }

    pub fn parse(s: &str) -> Option<Collection> {
        match s {
            "pages" => Some(Collection::Pages),
            "users" => Some(Collection::Users),
            _ => None,
        }
    }
}

/// A schemaless JSON document. Field values are arbitrary JSON until the
/// validation pass pins them against an entity schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw field access, including explicit nulls.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn unset(&mut self, field: &str) {
        self.0.remove(field);
    }

    /// Present and not null. Absent fields and explicit nulls are both
    /// "unset" for defaulting and requiredness purposes.
    pub fn is_set(&self, field: &str) -> bool {
        matches!(self.0.get(field), Some(v) if !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    pub fn get_array(&self, field: &str) -> Option<&Vec<Value>> {
        self.0.get(field).and_then(Value::as_array)
    }

    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(&self.0).map_err(|e| AppError::Serialization(e.to_string()))
    }

    pub fn from_json(data: &str) -> AppResult<Self> {
        serde_json::from_str(data).map_err(|e| AppError::Deserialization(e.to_string()))
    }
}

/// A document as returned by the store, with its id and row timestamps.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub collection: Collection,
    pub data: Document,
    pub created: i64,
    pub updated: i64,
}

/// Query filters the store contract supports: everything, id lookup,
/// exact field equality, and array-field membership.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Id(DocumentId),
    Eq(String, Value),
    Contains(String, Value),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Contains(field.into(), value.into())
    }
}
