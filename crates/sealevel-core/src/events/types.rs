//! Event payload types.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::types::Stage;

/// Payload for `on_stage_started`.
#[derive(Debug, Clone)]
pub struct StageStartedEvent {
    pub stage: Stage,
    pub cycles: usize,
}

/// Payload for `on_cycle_produced`.
#[derive(Debug, Clone)]
pub struct CycleProducedEvent {
    pub stage: Stage,
    pub center: NaiveDate,
    pub path: PathBuf,
}

/// Payload for `on_cycle_up_to_date`.
#[derive(Debug, Clone)]
pub struct CycleUpToDateEvent {
    pub stage: Stage,
    pub center: NaiveDate,
}

/// Payload for `on_cycle_failed`.
#[derive(Debug, Clone)]
pub struct CycleFailedEvent {
    pub stage: Stage,
    pub center: NaiveDate,
    pub error_code: &'static str,
    pub message: String,
}

/// Payload for `on_stage_complete`.
#[derive(Debug, Clone)]
pub struct StageCompleteEvent {
    pub stage: Stage,
    pub produced: usize,
    pub up_to_date: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Payload for `on_master_written`.
#[derive(Debug, Clone)]
pub struct MasterWrittenEvent {
    pub product: String,
    pub path: PathBuf,
    pub records: usize,
}

/// Payload for `on_backup_created`.
#[derive(Debug, Clone)]
pub struct BackupCreatedEvent {
    pub source: PathBuf,
    pub backup: PathBuf,
}
