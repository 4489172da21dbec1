//! Run-scoped mapping from source ids to destination ids.

use std::collections::HashMap;

use crate::entity::EntityKind;
use crate::record::DestinationId;

/// `source_id -> destination id` for one entity kind.
///
/// Only successful creations are ever inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    entries: HashMap<String, DestinationId>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_id: impl Into<String>, id: DestinationId) {
        self.entries.insert(source_id.into(), id);
    }

    pub fn get(&self, source_id: &str) -> Option<DestinationId> {
        self.entries.get(source_id).copied()
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.entries.contains_key(source_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, DestinationId)> for IdMap {
    fn from_iter<I: IntoIterator<Item = (String, DestinationId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// One [`IdMap`] per entity kind loaded so far.
#[derive(Debug, Clone, Default)]
pub struct IdMaps {
    maps: HashMap<EntityKind, IdMap>,
}

impl IdMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map for `kind`, if that stage has run.
    pub fn get(&self, kind: EntityKind) -> Option<&IdMap> {
        self.maps.get(&kind)
    }

    /// Look up a single source id in the map of `kind`.
    pub fn resolve(&self, kind: EntityKind, source_id: &str) -> Option<DestinationId> {
        self.maps.get(&kind).and_then(|m| m.get(source_id))
    }

    /// Map for `kind`, created empty on first use.
    pub fn entry(&mut self, kind: EntityKind) -> &mut IdMap {
        self.maps.entry(kind).or_default()
    }

    pub fn insert_map(&mut self, kind: EntityKind, map: IdMap) {
        self.maps.insert(kind, map);
    }
}
