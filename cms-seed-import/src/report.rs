use std::path::Path;

use cms_seed_core::{DestinationId, EntityKind};

/// A single entry in the load report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEntry {
    Created {
        kind: EntityKind,
        source_id: String,
        id: DestinationId,
        /// Locales whose translation update failed.
        failed_locales: Vec<String>,
    },
    Skipped {
        kind: EntityKind,
        source_id: String,
        reason: String,
    },
    Failed {
        kind: EntityKind,
        source_id: String,
        message: String,
    },
    RelationGap {
        kind: EntityKind,
        source_id: String,
        field: String,
        missing: String,
    },
}

/// Collects per-record load results and writes a report file.
#[derive(Debug, Default, Clone)]
pub struct LoadReport {
    entries: Vec<ReportEntry>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for entry in &self.entries {
            match entry {
                ReportEntry::Created { failed_locales, .. } => {
                    summary.created += 1;
                    summary.failed_translations += failed_locales.len();
                }
                ReportEntry::Skipped { .. } => summary.skipped += 1,
                ReportEntry::Failed { .. } => summary.failed += 1,
                ReportEntry::RelationGap { .. } => summary.relation_gaps += 1,
            }
        }
        summary
    }

    /// Write the report to a file.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        use std::io::Write;

        let mut file = std::fs::File::create(path)?;
        let summary = self.summary();

        writeln!(file, "=== Load Report ===")?;
        writeln!(
            file,
            "Date: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(file)?;
        writeln!(file, "--- Summary ---")?;
        writeln!(file, "Created: {}", summary.created)?;
        writeln!(file, "Skipped: {}", summary.skipped)?;
        writeln!(file, "Failed: {}", summary.failed)?;
        writeln!(file, "Failed translations: {}", summary.failed_translations)?;
        writeln!(file, "Dropped relations: {}", summary.relation_gaps)?;
        writeln!(file)?;
        writeln!(file, "--- Details ---")?;
        writeln!(file)?;

        for entry in &self.entries {
            match entry {
                ReportEntry::Created {
                    kind,
                    source_id,
                    id,
                    failed_locales,
                } => {
                    writeln!(file, "[OK] {} {} -> {}", kind, source_id, id)?;
                    if !failed_locales.is_empty() {
                        writeln!(
                            file,
                            "     Missing translations: {}",
                            failed_locales.join(", ")
                        )?;
                    }
                }
                ReportEntry::Skipped {
                    kind,
                    source_id,
                    reason,
                } => {
                    writeln!(file, "[SKIPPED] {} {}: {}", kind, source_id, reason)?;
                }
                ReportEntry::Failed {
                    kind,
                    source_id,
                    message,
                } => {
                    writeln!(file, "[ERROR] {} {}: {}", kind, source_id, message)?;
                }
                ReportEntry::RelationGap {
                    kind,
                    source_id,
                    field,
                    missing,
                } => {
                    writeln!(
                        file,
                        "[GAP] {} {}: '{}' references unknown {}",
                        kind, source_id, field, missing
                    )?;
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_translations: usize,
    pub relation_gaps: usize,
}
