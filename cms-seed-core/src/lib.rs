//! Core transform pipeline for seeding a CMS from exported datasets.
//!
//! Records flow through [`sanitize`](sanitize::sanitize), then
//! [`remap_relations`](relations::remap_relations), then
//! [`project`](locale::project) once per locale, before a [`RecordSink`]
//! submits them. Nothing in this crate performs I/O.

pub mod entity;
pub mod error;
pub mod id_map;
pub mod locale;
pub mod profile;
pub mod record;
pub mod relations;
pub mod sanitize;
pub mod sink;

pub use entity::{EntityKind, EntityKindParseError};
pub use error::RecordError;
pub use id_map::{IdMap, IdMaps};
pub use locale::{LocaleSet, project, suffixed};
pub use profile::{EntityProfile, SOURCE_REF_FIELD};
pub use record::{
    CleanRecord, CreatedRecord, DEFAULT_SOURCE_ID_FIELD, DestinationId, Fields, LocaleView,
    RawRecord,
};
pub use relations::{
    Cardinality, LabelIndex, LabelLookup, RelationGap, RelationSpec, Remapped, remap_ids,
    remap_relations,
};
pub use sanitize::{
    SanitizeOptions, SanitizeWarning, Sanitized, decode_html_entities, is_valid_email, sanitize,
};
pub use sink::{ErrorPolicy, RecordSink};
