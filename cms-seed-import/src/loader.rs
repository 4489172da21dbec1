//! Load orchestration.
//!
//! Stages run in [`EntityKind::load_order`]. Each record is sanitized,
//! remapped against the id maps of earlier stages, created in the default
//! locale and then translated into every extra locale. The create for a
//! record always completes before its translations start, and a record's
//! translations all finish before the next record is touched.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use cms_seed_core::{
    CleanRecord, CreatedRecord, EntityKind, EntityProfile, ErrorPolicy, IdMaps, LabelIndex,
    LocaleSet, RawRecord, RecordError, RecordSink, RelationGap, Remapped, SanitizeOptions,
    SanitizeWarning, Sanitized, project, remap_relations, sanitize,
};
use cms_seed_remote::Config;
use futures::future::join_all;
use serde_json::Value;
use thiserror::Error;

use crate::coordinates::CoordinateIndex;
use crate::progress::{LoadProgress, SilentProgress};
use crate::report::{LoadReport, ReportEntry};
use crate::source::Datasets;

/// Column holding the export's human-readable record number.
const HUMAN_ID_FIELD: &str = "id";
/// Field receiving a sede's position.
const GEODATA_FIELD: &str = "geodata";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Load aborted at {kind} record {source_id}: {message}")]
    Aborted {
        kind: EntityKind,
        source_id: String,
        message: String,
        /// Everything recorded up to and including the failed record.
        report: LoadReport,
    },
}

impl LoadError {
    /// Per-record report of the run that failed.
    pub fn report(&self) -> &LoadReport {
        match self {
            Self::Aborted { report, .. } => report,
        }
    }

    fn with_report(self, report: LoadReport) -> Self {
        match self {
            Self::Aborted {
                kind,
                source_id,
                message,
                ..
            } => Self::Aborted {
                kind,
                source_id,
                message,
                report,
            },
        }
    }
}

/// Counters for one stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub total: usize,
    pub created: usize,
    /// Records rejected before any network call.
    pub skipped: usize,
    /// Records the sink refused.
    pub failed: usize,
    pub relation_gaps: usize,
    pub translations_created: usize,
    pub translations_failed: usize,
}

impl LoadStats {
    fn absorb(&mut self, other: &LoadStats) {
        self.total += other.total;
        self.created += other.created;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.relation_gaps += other.relation_gaps;
        self.translations_created += other.translations_created;
        self.translations_failed += other.translations_failed;
    }
}

/// Result of a completed (or cancelled) run.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub id_maps: IdMaps,
    pub stats: BTreeMap<EntityKind, LoadStats>,
    pub report: LoadReport,
    /// The cancel flag stopped the run early.
    pub cancelled: bool,
}

impl LoadOutcome {
    /// Stats summed over every stage.
    pub fn totals(&self) -> LoadStats {
        let mut totals = LoadStats::default();
        for stats in self.stats.values() {
            totals.absorb(stats);
        }
        totals
    }
}

/// Everything about a run that isn't the data or the sink.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub locales: LocaleSet,
    pub sanitize: SanitizeOptions,
    pub on_record_error: ErrorPolicy,
    profiles: BTreeMap<EntityKind, EntityProfile>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            locales: LocaleSet::default(),
            sanitize: SanitizeOptions::default(),
            on_record_error: ErrorPolicy::default(),
            profiles: EntityKind::load_order()
                .iter()
                .map(|&k| (k, EntityProfile::for_kind(k)))
                .collect(),
        }
    }
}

impl LoadOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            locales: config.locales.clone(),
            sanitize: config.sanitize_options(),
            on_record_error: config.load.on_record_error,
            profiles: EntityKind::load_order()
                .iter()
                .map(|&k| (k, config.profile(k)))
                .collect(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_record_error = policy;
        self
    }

    pub fn with_locales(mut self, locales: LocaleSet) -> Self {
        self.locales = locales;
        self
    }

    pub fn with_profile(mut self, profile: EntityProfile) -> Self {
        self.profiles.insert(profile.kind, profile);
        self
    }

    pub fn profile(&self, kind: EntityKind) -> EntityProfile {
        self.profiles
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| EntityProfile::for_kind(kind))
    }
}

/// A record ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedRecord {
    pub record: CleanRecord,
    pub warnings: Vec<SanitizeWarning>,
    pub gaps: Vec<RelationGap>,
}

/// Run every pre-submission step for one record.
///
/// `labels` holds one [`LabelIndex`] per label-lookup field of `profile`.
/// Errors mean the record must be skipped; nothing has been sent for it.
pub fn prepare_record(
    profile: &EntityProfile,
    raw: &RawRecord,
    options: &SanitizeOptions,
    id_maps: &IdMaps,
    labels: &HashMap<String, LabelIndex>,
    coordinates: Option<&CoordinateIndex>,
) -> Result<PreparedRecord, RecordError> {
    let Sanitized {
        record: mut clean,
        warnings,
    } = sanitize(raw, options);

    for field in &profile.required_fields {
        if !clean.contains(field) {
            return Err(RecordError::missing_field(&raw.source_id, field));
        }
    }

    for field in &profile.dropped_fields {
        clean.remove(field);
    }

    let human_id = clean.get(HUMAN_ID_FIELD).and_then(scalar_text);
    if let Some(target) = &profile.carry_id_as {
        if let Some(id) = clean.remove(HUMAN_ID_FIELD) {
            clean.insert(target.clone(), id);
        }
    }

    for lookup in &profile.label_lookups {
        let label = clean
            .get(&lookup.field)
            .and_then(|value| labels.get(&lookup.field)?.resolve(value))
            .map(str::to_string);
        match label {
            Some(label) => clean.insert(lookup.field.clone(), label),
            None => {
                clean.remove(&lookup.field);
                if lookup.required {
                    return Err(RecordError::unresolved_relation(
                        &raw.source_id,
                        &lookup.field,
                    ));
                }
            }
        }
    }

    let Remapped {
        record: mut clean,
        gaps,
        unresolved_required,
    } = remap_relations(&clean, &profile.relations, id_maps);
    if let Some(field) = unresolved_required.first() {
        return Err(RecordError::unresolved_relation(&raw.source_id, field));
    }

    if profile.attach_coordinates {
        let geodata = human_id
            .as_deref()
            .and_then(|id| coordinates?.geodata(id));
        match geodata {
            Some(geo) => clean.insert(GEODATA_FIELD, geo),
            None => log::debug!(
                "No coordinates for {} {}",
                profile.kind,
                human_id.as_deref().unwrap_or(&raw.source_id)
            ),
        }
    }

    Ok(PreparedRecord {
        record: clean,
        warnings,
        gaps,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Drives a run against a [`RecordSink`].
pub struct Loader<'a, S> {
    sink: &'a S,
    options: &'a LoadOptions,
    coordinates: Option<&'a CoordinateIndex>,
    progress: &'a dyn LoadProgress,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, S: RecordSink> Loader<'a, S> {
    pub fn new(sink: &'a S, options: &'a LoadOptions) -> Self {
        Self {
            sink,
            options,
            coordinates: None,
            progress: &SilentProgress,
            cancel: None,
        }
    }

    pub fn with_coordinates(mut self, coordinates: &'a CoordinateIndex) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn LoadProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Stop dispatching records once `flag` is set. Records already created
    /// stay created.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|f| f.load(Ordering::Relaxed))
    }

    /// Load every dataset present in `datasets`, in load order.
    pub async fn load_all(&self, datasets: &Datasets) -> Result<LoadOutcome, LoadError> {
        self.load(datasets, EntityKind::load_order()).await
    }

    /// Load only the `kinds` datasets, in load order. Other datasets are
    /// still consulted for label lookups.
    pub async fn load(
        &self,
        datasets: &Datasets,
        kinds: &[EntityKind],
    ) -> Result<LoadOutcome, LoadError> {
        let mut outcome = LoadOutcome::default();

        for kind in datasets.kinds().filter(|k| kinds.contains(k)) {
            let Some(records) = datasets.get(kind) else {
                continue;
            };
            if self.is_cancelled() {
                outcome.cancelled = true;
                break;
            }
            let stats = match self.load_stage(kind, records, datasets, &mut outcome).await {
                Ok(stats) => stats,
                Err(e) => return Err(e.with_report(outcome.report)),
            };
            outcome.stats.insert(kind, stats);
            if outcome.cancelled {
                break;
            }
        }

        if outcome.cancelled {
            log::warn!("Load cancelled; records created so far were kept");
        }
        Ok(outcome)
    }

    async fn load_stage(
        &self,
        kind: EntityKind,
        records: &[RawRecord],
        datasets: &Datasets,
        outcome: &mut LoadOutcome,
    ) -> Result<LoadStats, LoadError> {
        let profile = self.options.profile(kind);
        let labels = label_indexes(&profile, datasets);
        let total = records.len();
        let mut stats = LoadStats {
            total,
            ..Default::default()
        };

        self.progress.on_stage(kind, total);

        for (i, raw) in records.iter().enumerate() {
            if self.is_cancelled() {
                log::warn!("{} stopped after {} of {} records", kind, i, total);
                outcome.cancelled = true;
                break;
            }
            self.load_record(kind, &profile, raw, &labels, &mut stats, outcome)
                .await?;
            self.progress.on_record(i + 1, total, &raw.source_id);
        }

        self.progress.on_stage_done(
            kind,
            &format!(
                "{} created, {} skipped, {} failed",
                stats.created, stats.skipped, stats.failed
            ),
        );
        Ok(stats)
    }

    async fn load_record(
        &self,
        kind: EntityKind,
        profile: &EntityProfile,
        raw: &RawRecord,
        labels: &HashMap<String, LabelIndex>,
        stats: &mut LoadStats,
        outcome: &mut LoadOutcome,
    ) -> Result<(), LoadError> {
        let prepared = match prepare_record(
            profile,
            raw,
            &self.options.sanitize,
            &outcome.id_maps,
            labels,
            self.coordinates,
        ) {
            Ok(prepared) => prepared,
            Err(e) => {
                log::warn!("Skipping {} record: {}", kind, e);
                stats.skipped += 1;
                outcome.report.add(ReportEntry::Skipped {
                    kind,
                    source_id: raw.source_id.clone(),
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        for warning in &prepared.warnings {
            log::warn!("{} {}: {}", kind, raw.source_id, warning);
        }
        for gap in &prepared.gaps {
            log::warn!("{} {}: {}", kind, raw.source_id, gap);
            stats.relation_gaps += 1;
            outcome.report.add(ReportEntry::RelationGap {
                kind,
                source_id: raw.source_id.clone(),
                field: gap.field.clone(),
                missing: gap.source_id.clone(),
            });
        }

        let locales = &self.options.locales;
        let view = project(
            &prepared.record,
            &locales.default,
            &profile.localized_fields,
            locales,
        );

        let created = match self.sink.create(kind, &view).await {
            Ok(created) => created,
            Err(e) => {
                stats.failed += 1;
                outcome.report.add(ReportEntry::Failed {
                    kind,
                    source_id: raw.source_id.clone(),
                    message: e.to_string(),
                });
                log::error!("Failed to create {} {}: {}", kind, raw.source_id, e);
                return match self.options.on_record_error {
                    ErrorPolicy::Skip => Ok(()),
                    ErrorPolicy::Abort => Err(LoadError::Aborted {
                        kind,
                        source_id: raw.source_id.clone(),
                        message: e.to_string(),
                        report: LoadReport::default(),
                    }),
                };
            }
        };

        outcome
            .id_maps
            .entry(kind)
            .insert(raw.source_id.clone(), created.id);
        stats.created += 1;
        log::debug!("{} {} created as {}", kind, raw.source_id, created.id);

        let failed_locales = if profile.is_translated() {
            self.translate(kind, profile, &prepared.record, &created, stats)
                .await
        } else {
            Vec::new()
        };

        outcome.report.add(ReportEntry::Created {
            kind,
            source_id: raw.source_id.clone(),
            id: created.id,
            failed_locales,
        });
        Ok(())
    }

    /// Submit every extra-locale variant of a created record concurrently.
    /// Returns the locales that failed.
    async fn translate(
        &self,
        kind: EntityKind,
        profile: &EntityProfile,
        record: &CleanRecord,
        created: &CreatedRecord,
        stats: &mut LoadStats,
    ) -> Vec<String> {
        let locales = &self.options.locales;
        let key = created.update_key();

        let updates = locales.extra.iter().map(|locale| {
            let view = project(record, locale, &profile.localized_fields, locales);
            let key = key.as_str();
            async move {
                let result = self.sink.update(kind, key, locale, &view).await;
                (locale, result)
            }
        });

        let mut failed = Vec::new();
        for (locale, result) in join_all(updates).await {
            match result {
                Ok(()) => {
                    stats.translations_created += 1;
                    log::debug!("{} {} translated to '{}'", kind, record.source_id, locale);
                }
                Err(e) => {
                    stats.translations_failed += 1;
                    log::warn!(
                        "Translation '{}' of {} {} failed: {}",
                        locale,
                        kind,
                        record.source_id,
                        e
                    );
                    failed.push(locale.clone());
                }
            }
        }
        failed
    }
}

/// Build the label indexes a profile's lookups need from the run's datasets.
fn label_indexes(profile: &EntityProfile, datasets: &Datasets) -> HashMap<String, LabelIndex> {
    profile
        .label_lookups
        .iter()
        .map(|lookup| {
            let index = match datasets.get(lookup.source) {
                Some(records) => LabelIndex::build(records, &lookup.label_field),
                None => {
                    log::warn!(
                        "No {} dataset; '{}' of {} cannot be resolved",
                        lookup.source,
                        lookup.field,
                        profile.kind
                    );
                    LabelIndex::default()
                }
            };
            (lookup.field.clone(), index)
        })
        .collect()
}
