//! Record types flowing through the transform pipeline.
//!
//! A [`RawRecord`] is a row as exported by the source system. Sanitizing it
//! yields a [`CleanRecord`], and projecting a clean record for one locale
//! yields a [`LocaleView`], which is what gets sent to the CMS.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecordError;

/// Field map shared by every record type.
pub type Fields = serde_json::Map<String, Value>;

/// Default name of the row identifier column in source exports.
pub const DEFAULT_SOURCE_ID_FIELD: &str = "_id";

/// Identifier assigned by the destination system on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(pub u64);

impl std::fmt::Display for DestinationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DestinationId> for Value {
    fn from(id: DestinationId) -> Self {
        Value::from(id.0)
    }
}

/// What the sink hands back after a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRecord {
    /// Numeric id used for relations.
    pub id: DestinationId,
    /// Stable document id used to address the record's locale variants.
    /// Older CMS versions don't return one.
    pub document_id: Option<String>,
}

impl CreatedRecord {
    /// Key used for translation updates: the document id when present,
    /// otherwise the numeric id.
    pub fn update_key(&self) -> String {
        match &self.document_id {
            Some(doc) => doc.clone(),
            None => self.id.to_string(),
        }
    }
}

/// A row as produced by the source export.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Row identifier in the source system, distinct from any destination id.
    pub source_id: String,
    pub fields: Fields,
}

impl RawRecord {
    pub fn new(source_id: impl Into<String>, fields: Fields) -> Self {
        Self {
            source_id: source_id.into(),
            fields,
        }
    }

    /// Build a record from an exported row, reading the source id from
    /// `id_field`. The id field stays in `fields`; the sanitizer removes it
    /// when it carries the private marker.
    pub fn from_row(fields: Fields, id_field: &str) -> Result<Self, RecordError> {
        let source_id = match fields.get(id_field) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(RecordError::MissingSourceId {
                    field: id_field.to_string(),
                });
            }
        };
        Ok(Self { source_id, fields })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String value of a field, if it is a non-empty string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// A sanitized record. Never holds nulls, empty strings or private fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleanRecord {
    pub source_id: String,
    pub fields: Fields,
}

impl CleanRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }
}

/// A clean record projected for a single locale.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleView {
    pub locale: String,
    pub fields: Fields,
}

impl LocaleView {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The JSON body sent to the CMS.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
