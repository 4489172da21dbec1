//! Relation remapping.
//!
//! Link columns in the export hold arrays of source row ids. Before a record
//! can be created, each of those ids must be swapped for the id the CMS
//! assigned to the linked record in an earlier stage.
//!
//! An id with no destination counterpart is an explicit [`RelationGap`]: it
//! is dropped from the written field and reported, never silently lost.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityKind;
use crate::id_map::{IdMap, IdMaps};
use crate::record::{CleanRecord, DestinationId, RawRecord};
use crate::sanitize::decode_html_entities;

/// How a resolved relation is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// First resolved id, written as a scalar.
    One,
    /// All resolved ids, written as an array in input order.
    Many,
}

/// A link column and the entity kind whose id map resolves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    pub field: String,
    pub target: EntityKind,
    pub cardinality: Cardinality,
    /// Records with nothing resolvable in this field are skipped.
    pub required: bool,
}

impl RelationSpec {
    pub fn one(field: impl Into<String>, target: EntityKind) -> Self {
        Self {
            field: field.into(),
            target,
            cardinality: Cardinality::One,
            required: false,
        }
    }

    pub fn many(field: impl Into<String>, target: EntityKind) -> Self {
        Self {
            field: field.into(),
            target,
            cardinality: Cardinality::Many,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A source id that had no destination id in the relevant map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationGap {
    pub field: String,
    pub source_id: String,
}

impl std::fmt::Display for RelationGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' references unknown record {}; relation dropped",
            self.field, self.source_id
        )
    }
}

/// Output of [`remap_relations`].
#[derive(Debug, Clone)]
pub struct Remapped {
    pub record: CleanRecord,
    pub gaps: Vec<RelationGap>,
    /// Required relation fields that ended up with nothing resolved.
    pub unresolved_required: Vec<String>,
}

/// Read the source ids held by a link column. Arrays are read element by
/// element; a bare scalar counts as a one-element list.
pub fn source_ids(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_id).collect(),
        other => scalar_id(other).into_iter().collect(),
    }
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Map each source id through `map`, keeping one slot per input element.
/// Unmapped ids (or a missing map) yield `None` in their slot.
pub fn remap_ids(ids: &[String], map: Option<&IdMap>) -> Vec<Option<DestinationId>> {
    ids.iter()
        .map(|id| map.and_then(|m| m.get(id)))
        .collect()
}

/// Rewrite every relation field present on `record` to destination ids.
///
/// Gaps are filtered out of the written value and reported. A `One` field
/// with nothing resolved is removed; a `Many` field becomes the (possibly
/// empty) list of resolved ids.
pub fn remap_relations(
    record: &CleanRecord,
    relations: &[RelationSpec],
    id_maps: &IdMaps,
) -> Remapped {
    let mut out = record.clone();
    let mut gaps = Vec::new();
    let mut unresolved_required = Vec::new();

    for spec in relations {
        let Some(value) = record.get(&spec.field) else {
            if spec.required {
                unresolved_required.push(spec.field.clone());
            }
            continue;
        };

        let ids = source_ids(value);
        let slots = remap_ids(&ids, id_maps.get(spec.target));

        let mut resolved = Vec::with_capacity(slots.len());
        for (source_id, slot) in ids.into_iter().zip(slots) {
            match slot {
                Some(id) => resolved.push(id),
                None => gaps.push(RelationGap {
                    field: spec.field.clone(),
                    source_id,
                }),
            }
        }

        if spec.required && resolved.is_empty() {
            unresolved_required.push(spec.field.clone());
        }

        match spec.cardinality {
            Cardinality::One => match resolved.first() {
                Some(&id) => out.insert(spec.field.clone(), id),
                None => {
                    out.remove(&spec.field);
                }
            },
            Cardinality::Many => {
                let ids: Vec<Value> = resolved.into_iter().map(Value::from).collect();
                out.insert(spec.field.clone(), Value::Array(ids));
            }
        }
    }

    Remapped {
        record: out,
        gaps,
        unresolved_required,
    }
}

/// A relation resolved to a display label from another dataset rather than
/// to a destination id, for links that point at a stage loaded later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLookup {
    pub field: String,
    pub source: EntityKind,
    /// Field of the linked record whose value is written.
    pub label_field: String,
    pub required: bool,
}

/// `source_id -> label` built from a dataset before it is loaded.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    labels: HashMap<String, String>,
}

impl LabelIndex {
    /// Index `records` by source id, using `label_field` as the label.
    /// Labels are decoded and trimmed the same way [`crate::sanitize`]
    /// cleans the field on the linked record itself. Records without a
    /// usable label are left out.
    pub fn build(records: &[RawRecord], label_field: &str) -> Self {
        let labels = records
            .iter()
            .filter_map(|r| {
                let label = decode_html_entities(r.get_str(label_field)?);
                let label = label.trim();
                (!label.is_empty()).then(|| (r.source_id.clone(), label.to_string()))
            })
            .collect();
        Self { labels }
    }

    pub fn get(&self, source_id: &str) -> Option<&str> {
        self.labels.get(source_id).map(String::as_str)
    }

    /// Label of the first linked record in `value`.
    pub fn resolve(&self, value: &Value) -> Option<&str> {
        source_ids(value)
            .first()
            .and_then(|id| self.get(id))
    }
}

#[cfg(test)]
#[path = "tests/relations_tests.rs"]
mod tests;
