//! PipelineEventHandler trait, all methods with no-op defaults.

use super::types::*;

/// Trait for observing pipeline progress.
///
/// All methods have no-op default implementations, so handlers only need
/// to override the events they care about. `Send + Sync` because the
/// resampler runs on worker threads inside a stage.
pub trait PipelineEventHandler: Send + Sync {
    // ---- Stage lifecycle ----
    fn on_stage_started(&self, _event: &StageStartedEvent) {}
    fn on_stage_complete(&self, _event: &StageCompleteEvent) {}

    // ---- Cycles ----
    fn on_cycle_produced(&self, _event: &CycleProducedEvent) {}
    fn on_cycle_up_to_date(&self, _event: &CycleUpToDateEvent) {}
    fn on_cycle_failed(&self, _event: &CycleFailedEvent) {}

    // ---- Master products ----
    fn on_master_written(&self, _event: &MasterWrittenEvent) {}
    fn on_backup_created(&self, _event: &BackupCreatedEvent) {}
}
