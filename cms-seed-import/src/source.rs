//! Dataset readers.
//!
//! Exports come as JSON (`{"rows": [...]}`, the SeaTable row envelope) or
//! as header-row CSV. Both produce [`RawRecord`]s keyed by the configured
//! source id column. Any structural problem is a [`SourceError`] raised
//! before a single record is submitted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cms_seed_core::{EntityKind, Fields, RawRecord};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset {}: {message}", path.display())]
    Format { path: PathBuf, message: String },
}

impl SourceError {
    pub fn format(path: &Path, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read a dataset, choosing the parser by file extension (`.csv` or JSON
/// otherwise).
pub fn read_rows(path: &Path, id_field: &str) -> Result<Vec<RawRecord>, SourceError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        read_csv_rows(path, id_field)
    } else {
        read_json_rows(path, id_field)
    }
}

/// Read a JSON export. The top level must be an object with a `rows` array
/// of objects.
pub fn read_json_rows(path: &Path, id_field: &str) -> Result<Vec<RawRecord>, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
    parse_json_rows(&text, id_field).map_err(|message| SourceError::format(path, message))
}

fn parse_json_rows(text: &str, id_field: &str) -> Result<Vec<RawRecord>, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("not valid JSON: {}", e))?;
    let rows = value
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| "expected a top-level object with a 'rows' array".to_string())?;

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let fields = row
                .as_object()
                .cloned()
                .ok_or_else(|| format!("row {} is not an object", idx))?;
            RawRecord::from_row(fields, id_field).map_err(|e| format!("row {}: {}", idx, e))
        })
        .collect()
}

/// Read a CSV export with a header row. Every value is kept as a string;
/// empty cells are left for the sanitizer to drop.
pub fn read_csv_rows(path: &Path, id_field: &str) -> Result<Vec<RawRecord>, SourceError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|e| csv_error(path, e))?;
        let fields: Fields = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();
        let record = RawRecord::from_row(fields, id_field)
            .map_err(|e| SourceError::format(path, format!("row {}: {}", idx, e)))?;
        records.push(record);
    }
    Ok(records)
}

fn csv_error(path: &Path, err: csv::Error) -> SourceError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => SourceError::io(path, io),
            other => SourceError::format(path, format!("{:?}", other)),
        }
    } else {
        SourceError::format(path, err.to_string())
    }
}

/// Parsed datasets for one run, keyed by entity kind.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    records: BTreeMap<EntityKind, Vec<RawRecord>>,
}

impl Datasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: EntityKind, records: Vec<RawRecord>) {
        self.records.insert(kind, records);
    }

    pub fn get(&self, kind: EntityKind) -> Option<&[RawRecord]> {
        self.records.get(&kind).map(Vec::as_slice)
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.records.contains_key(&kind)
    }

    /// Kinds present, in load order.
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        EntityKind::load_order()
            .iter()
            .copied()
            .filter(|k| self.records.contains_key(k))
    }

    /// Total number of rows across all datasets.
    pub fn total_records(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Read the datasets for `kinds` with `path_for` naming each file.
    pub fn read(
        kinds: &[EntityKind],
        id_field: &str,
        path_for: impl Fn(EntityKind) -> PathBuf,
    ) -> Result<Self, SourceError> {
        let mut datasets = Self::new();
        for &kind in kinds {
            let path = path_for(kind);
            log::debug!("Reading {} from {}", kind, path.display());
            datasets.insert(kind, read_rows(&path, id_field)?);
        }
        Ok(datasets)
    }
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
