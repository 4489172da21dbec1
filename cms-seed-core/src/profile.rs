//! Per-entity transform profiles.
//!
//! A profile lists everything the loader needs to know about one dataset:
//! which fields are translated, which link columns must be remapped, which
//! back-references to drop and which fields must be present.

use crate::entity::EntityKind;
use crate::relations::{LabelLookup, RelationSpec};

/// Field that receives the export's human-readable `id` column.
pub const SOURCE_REF_FIELD: &str = "idfromjson";

/// How one entity kind is transformed before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProfile {
    pub kind: EntityKind,
    /// Logical names of per-locale fields (`<name>_<locale>` in the export).
    pub localized_fields: Vec<String>,
    pub relations: Vec<RelationSpec>,
    pub label_lookups: Vec<LabelLookup>,
    /// Back-reference columns the CMS maintains from the other side.
    pub dropped_fields: Vec<String>,
    /// Fields that must be present after sanitizing.
    pub required_fields: Vec<String>,
    /// Move the export's `id` column to this field.
    pub carry_id_as: Option<String>,
    /// Attach `geodata` from the coordinates index.
    pub attach_coordinates: bool,
}

impl EntityProfile {
    /// Profile with no transforms beyond sanitizing.
    pub fn plain(kind: EntityKind) -> Self {
        Self {
            kind,
            localized_fields: Vec::new(),
            relations: Vec::new(),
            label_lookups: Vec::new(),
            dropped_fields: Vec::new(),
            required_fields: Vec::new(),
            carry_id_as: None,
            attach_coordinates: false,
        }
    }

    /// The profile matching the standard export layout for `kind`.
    pub fn for_kind(kind: EntityKind) -> Self {
        let mut profile = Self::plain(kind);
        match kind {
            EntityKind::MacroArea => {
                profile.dropped_fields = strings(&["areas"]);
            }
            EntityKind::Area => {
                profile.dropped_fields = strings(&["sedes"]);
                profile.relations = vec![RelationSpec::one("macroarea", EntityKind::MacroArea)];
            }
            EntityKind::Colectivo => {
                profile.dropped_fields = strings(&["sedes_prioritarias", "sedes_exclusivas"]);
            }
            EntityKind::Sede => {
                profile.localized_fields = strings(&["listado_de_servicios"]);
                profile.relations = vec![
                    RelationSpec::many("areas", EntityKind::Area),
                    RelationSpec::many("colectivos_prioritarios", EntityKind::Colectivo),
                    RelationSpec::many("colectivos_exclusivos", EntityKind::Colectivo),
                ];
                profile.label_lookups = vec![LabelLookup {
                    field: "organizacion".to_string(),
                    source: EntityKind::Organizacion,
                    label_field: "nombre".to_string(),
                    required: true,
                }];
                profile.carry_id_as = Some(SOURCE_REF_FIELD.to_string());
                profile.attach_coordinates = true;
            }
            EntityKind::Organizacion => {
                profile.localized_fields = strings(&[
                    "descripcion_general",
                    "nombre_largo",
                    "listado_servicios_organizacion",
                ]);
                profile.relations = vec![RelationSpec::many("sedes", EntityKind::Sede)];
                profile.dropped_fields = strings(&["logo"]);
                profile.required_fields = strings(&["id", "nombre", "descripcion_general"]);
                profile.carry_id_as = Some(SOURCE_REF_FIELD.to_string());
            }
        }
        profile
    }

    /// Whether records of this kind get per-locale translation updates.
    pub fn is_translated(&self) -> bool {
        !self.localized_fields.is_empty()
    }
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_sedes_and_organizaciones_are_translated() {
        let translated: Vec<EntityKind> = EntityKind::load_order()
            .iter()
            .copied()
            .filter(|&k| EntityProfile::for_kind(k).is_translated())
            .collect();
        assert_eq!(translated, vec![EntityKind::Sede, EntityKind::Organizacion]);
    }

    #[test]
    fn test_relations_only_point_at_earlier_stages() {
        let order = EntityKind::load_order();
        for (pos, &kind) in order.iter().enumerate() {
            for rel in EntityProfile::for_kind(kind).relations {
                let target = order.iter().position(|&k| k == rel.target).unwrap();
                assert!(target < pos, "{kind:?}.{} points forward", rel.field);
            }
        }
    }

    #[test]
    fn test_sede_requires_an_organization() {
        let profile = EntityProfile::for_kind(EntityKind::Sede);
        assert!(profile.label_lookups.iter().any(|l| l.field == "organizacion" && l.required));
    }
}
