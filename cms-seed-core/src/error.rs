use thiserror::Error;

/// Errors raised while building or validating a single record.
///
/// None of these are fatal to a run: the loader skips the record and logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The row carries no usable source identifier
    #[error("row has no source id in field '{field}'")]
    MissingSourceId { field: String },

    /// A field the destination requires is missing or empty
    #[error("required field '{field}' is empty for record {source_id}")]
    MissingField { source_id: String, field: String },

    /// A mandatory relation could not be resolved
    #[error("record {source_id} has no resolvable '{field}' relation")]
    UnresolvedRelation { source_id: String, field: String },
}

impl RecordError {
    pub fn missing_field(source_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            source_id: source_id.into(),
            field: field.into(),
        }
    }

    pub fn unresolved_relation(source_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnresolvedRelation {
            source_id: source_id.into(),
            field: field.into(),
        }
    }
}
