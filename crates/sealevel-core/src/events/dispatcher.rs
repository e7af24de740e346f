//! EventDispatcher: synchronous event dispatch, free when empty.

use std::sync::Arc;

use super::handler::PipelineEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn PipelineEventHandler>>,
}

impl EventDispatcher {
    /// Create a new empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event handler.
    pub fn register(&mut self, handler: Arc<dyn PipelineEventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// A panicking handler is logged and does not stop later handlers.
    fn emit<F: Fn(&dyn PipelineEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::warn!("pipeline event handler panicked");
            }
        }
    }

    // ---- Stage lifecycle ----
    pub fn emit_stage_started(&self, event: &StageStartedEvent) {
        self.emit(|h| h.on_stage_started(event));
    }

    pub fn emit_stage_complete(&self, event: &StageCompleteEvent) {
        self.emit(|h| h.on_stage_complete(event));
    }

    // ---- Cycles ----
    pub fn emit_cycle_produced(&self, event: &CycleProducedEvent) {
        self.emit(|h| h.on_cycle_produced(event));
    }

    pub fn emit_cycle_up_to_date(&self, event: &CycleUpToDateEvent) {
        self.emit(|h| h.on_cycle_up_to_date(event));
    }

    pub fn emit_cycle_failed(&self, event: &CycleFailedEvent) {
        self.emit(|h| h.on_cycle_failed(event));
    }

    // ---- Master products ----
    pub fn emit_master_written(&self, event: &MasterWrittenEvent) {
        self.emit(|h| h.on_master_written(event));
    }

    pub fn emit_backup_created(&self, event: &BackupCreatedEvent) {
        self.emit(|h| h.on_backup_created(event));
    }
}
