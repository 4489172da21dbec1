use std::collections::HashMap;
use std::path::Path;

use cms_seed_remote::Coordinate;
use serde_json::{Value, json};

use crate::source::SourceError;

/// Geocoded positions of sedes, keyed by the export's human `id` column.
#[derive(Debug, Clone, Default)]
pub struct CoordinateIndex {
    by_id: HashMap<String, Coordinate>,
}

impl CoordinateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a `coordinates.json` file (`[{id, longitude, latitude}]`).
    pub fn read(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let coordinates: Vec<Coordinate> = serde_json::from_str(&text)
            .map_err(|e| SourceError::format(path, format!("bad coordinates list: {}", e)))?;
        Ok(coordinates.into_iter().collect())
    }

    pub fn get(&self, id: &str) -> Option<&Coordinate> {
        self.by_id.get(id)
    }

    /// The `geodata` value the CMS stores for a sede.
    pub fn geodata(&self, id: &str) -> Option<Value> {
        self.get(id)
            .map(|c| json!({ "lat": c.latitude, "lng": c.longitude }))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<Coordinate> for CoordinateIndex {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self {
            by_id: iter.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}
