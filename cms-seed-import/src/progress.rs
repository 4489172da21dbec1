//! Load progress reporting.

use cms_seed_core::EntityKind;

/// Receives progress updates from the loader.
pub trait LoadProgress {
    /// Called when a stage starts, with its record count.
    fn on_stage(&self, kind: EntityKind, total: usize);

    /// Called after each record of the current stage is handled.
    fn on_record(&self, current: usize, total: usize, source_id: &str);

    /// Called when the current stage is done.
    fn on_stage_done(&self, kind: EntityKind, message: &str);
}

/// A no-op progress reporter that discards all updates.
pub struct SilentProgress;

impl LoadProgress for SilentProgress {
    fn on_stage(&self, _kind: EntityKind, _total: usize) {}
    fn on_record(&self, _current: usize, _total: usize, _source_id: &str) {}
    fn on_stage_done(&self, _kind: EntityKind, _message: &str) {}
}

/// A progress reporter that logs to the `log` crate.
pub struct LogProgress;

impl LoadProgress for LogProgress {
    fn on_stage(&self, kind: EntityKind, total: usize) {
        log::info!("Loading {} ({} records)", kind, total);
    }

    fn on_record(&self, current: usize, total: usize, source_id: &str) {
        if current.is_multiple_of(50) || current == total {
            log::info!("  [{}/{}] {}", current, total, source_id);
        }
    }

    fn on_stage_done(&self, kind: EntityKind, message: &str) {
        log::info!("{}: {}", kind, message);
    }
}
