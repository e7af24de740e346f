//! Shared, read-only state handed to every stage of a run.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use sealevel_core::config::SealevelConfig;
use sealevel_core::errors::{CycleError, PipelineError, SealevelErrorCode};
use sealevel_core::events::types::{CycleFailedEvent, CycleProducedEvent, CycleUpToDateEvent};
use sealevel_core::events::EventDispatcher;
use sealevel_storage::{ArrayCodec, ArtifactLayout};

use crate::fine_grid::FineGridSpec;
use crate::reference::ReferenceData;

use super::report::{CycleOutcome, StageReport};

pub struct PipelineContext {
    pub config: SealevelConfig,
    pub data_dir: PathBuf,
    pub layout: ArtifactLayout,
    pub codec: Arc<dyn ArrayCodec>,
    pub refs: ReferenceData,
    pub fine_grid: FineGridSpec,
    pub events: EventDispatcher,
}

impl PipelineContext {
    /// Compression level for data variables of every artifact.
    pub fn level(&self) -> u8 {
        self.config.storage.effective_compression_level()
    }

    /// Turn one cycle's result into a report entry, logging and emitting
    /// events. Errors never escape this point.
    pub(crate) fn settle(
        &self,
        report: &mut StageReport,
        center: NaiveDate,
        result: Result<CycleOutcome, PipelineError>,
    ) {
        let stage = report.stage;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                log_failure(stage.as_str(), center, &e);
                CycleOutcome::Failed {
                    error_code: e.error_code(),
                    message: e.to_string(),
                }
            }
        };
        match &outcome {
            CycleOutcome::Produced { path } => {
                self.events.emit_cycle_produced(&CycleProducedEvent {
                    stage,
                    center,
                    path: path.clone(),
                });
            }
            CycleOutcome::UpToDate => {
                tracing::debug!(stage = %stage, cycle = %center, "artifact up to date");
                self.events
                    .emit_cycle_up_to_date(&CycleUpToDateEvent { stage, center });
            }
            CycleOutcome::Failed {
                error_code,
                message,
            } => {
                self.events.emit_cycle_failed(&CycleFailedEvent {
                    stage,
                    center,
                    error_code: *error_code,
                    message: message.clone(),
                });
            }
        }
        report.record(center, outcome);
    }
}

fn log_failure(stage: &str, center: NaiveDate, e: &PipelineError) {
    let error_code = e.error_code();
    match e {
        PipelineError::Cycle(CycleError::EmptyCycle { .. }) => {
            tracing::info!(stage, cycle = %center, error_code, "no granules in cycle window, skipping");
        }
        PipelineError::Cycle(CycleError::NoValidData { .. }) => {
            tracing::error!(stage, cycle = %center, error_code, "no valid SSHA in merged cycle, skipping");
        }
        PipelineError::Cycle(CycleError::QualityGate { .. }) => {
            tracing::debug!(stage, cycle = %center, error_code, error = %e, "cycle below coverage gate");
        }
        PipelineError::Fit(_) => {
            tracing::warn!(stage, cycle = %center, error_code, error = %e, "pattern fit failed");
        }
        _ => {
            tracing::error!(stage, cycle = %center, error_code, error = %e, "cycle failed");
        }
    }
}
