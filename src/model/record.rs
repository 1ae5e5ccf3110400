//! A single cached CRM record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A record: a mandatory `id` plus named, optional string fields.
///
/// Serializes flat, e.g. `{"id":"1","name":"Alice","email":null}`.
/// A field holding `None` is present-but-empty; a missing key is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Option<String>>,
}

impl Record {
    /// Create a record with no fields besides `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter. Setting `id` replaces the record id.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    /// Set or clear a field.
    pub fn set(&mut self, name: &str, value: Option<String>) {
        if name == "id" {
            if let Some(id) = value {
                self.id = id;
            }
            return;
        }
        self.fields.insert(name.to_string(), value);
    }

    /// Get a field value, treating `id` as a regular field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == "id" {
            return Some(&self.id);
        }
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    /// Replace this record's field values with `incoming`'s.
    ///
    /// The id stays; fields missing from `incoming` are dropped.
    pub fn replace_fields(&mut self, incoming: Record) {
        self.fields = incoming.fields;
    }

    /// Build a record from a raw extracted JSON object.
    ///
    /// `id` must be a non-empty string or a number. Other values are
    /// normalized to strings: `null` becomes an empty field, numbers and
    /// booleans their JSON text, arrays and objects compact JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Extraction` if the value is not an object or has no
    /// usable `id`.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::Extraction(format!(
                "expected a JSON object record, got {}",
                json_type_name(&value)
            )));
        };

        let mut id = None;
        let mut fields = BTreeMap::new();
        for (name, value) in map {
            if name == "id" {
                id = match value {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    other => {
                        return Err(Error::Extraction(format!(
                            "record id must be a non-empty string or number, got {}",
                            json_type_name(&other)
                        )));
                    }
                };
                continue;
            }
            fields.insert(name, normalize_value(value));
        }

        let id = id.ok_or_else(|| Error::Extraction("record is missing an `id`".to_string()))?;
        Ok(Self { id, fields })
    }
}

fn normalize_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other @ (Value::Array(_) | Value::Object(_)) => Some(other.to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
