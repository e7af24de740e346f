//! Stage runner: owns the shared context, holds the output lock for the
//! duration of a run and records every stage in the run ledger.

pub mod context;
pub mod report;
pub mod stages;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use sealevel_core::config::{PathsConfig, SealevelConfig};
use sealevel_core::errors::{PipelineError, SealevelErrorCode};
use sealevel_core::events::{EventDispatcher, PipelineEventHandler};
use sealevel_core::types::Stage;
use sealevel_storage::ledger::{RunCompletion, RunLedger};
use sealevel_storage::lock::with_exclusive_lock;
use sealevel_storage::{codec_for, ArrayCodec, ArtifactLayout};

use crate::fine_grid::FineGridSpec;
use crate::reference::ReferenceData;

pub use context::PipelineContext;
pub use report::{CycleOutcome, CycleRecord, MergeSummary, RunReport, StageAbort, StageReport};

/// Gridding, then indicators, then fine grids.
pub const ALL_STAGES: [Stage; 3] = [Stage::Gridding, Stage::Indicators, Stage::FineGrid];

pub struct Pipeline {
    ctx: PipelineContext,
}

impl Pipeline {
    /// Build the codec, load reference data and resolve every configured
    /// location against `root`.
    pub fn new(config: SealevelConfig, root: &Path) -> Result<Self, PipelineError> {
        let storage = &config.storage;
        let codec = codec_for(
            storage.effective_format(),
            storage.effective_compression_level(),
        )?;
        let refs = ReferenceData::load(
            &PathsConfig::rooted(root, &config.paths.effective_reference_dir()),
            &PathsConfig::rooted(root, &config.paths.effective_datasets_file()),
            codec.as_ref(),
        )?;
        Ok(Self::with_reference(config, root, codec, refs))
    }

    /// Like [`Pipeline::new`] with reference data already in hand.
    pub fn with_reference(
        config: SealevelConfig,
        root: &Path,
        codec: Arc<dyn ArrayCodec>,
        refs: ReferenceData,
    ) -> Self {
        let threads = config.gridding.effective_threads();
        if threads > 0
            && rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .is_err()
        {
            tracing::debug!(threads, "global thread pool already initialised");
        }

        let output = PathsConfig::rooted(root, &config.paths.effective_output_dir());
        let backup_dir = config
            .backup
            .backup_dir
            .as_deref()
            .map(|d| PathsConfig::rooted(root, d));
        let layout = ArtifactLayout::new(output, codec.extension()).with_backup_dir(backup_dir);
        let data_dir = PathsConfig::rooted(root, &config.paths.effective_data_dir());

        Self {
            ctx: PipelineContext {
                config,
                data_dir,
                layout,
                codec,
                refs,
                fine_grid: FineGridSpec::standard(),
                events: EventDispatcher::new(),
            },
        }
    }

    pub fn with_fine_grid_spec(mut self, spec: FineGridSpec) -> Self {
        self.ctx.fine_grid = spec;
        self
    }

    pub fn register_handler(&mut self, handler: Arc<dyn PipelineEventHandler>) {
        self.ctx.events.register(handler);
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    pub fn run_all(&self) -> Result<RunReport, PipelineError> {
        self.run(&ALL_STAGES)
    }

    /// Run `stages` in the order given. Per-cycle failures are reported,
    /// not raised. A stage that fails as a whole is reported as aborted and
    /// the remaining stages still run. An error here means the lock or the
    /// ledger was unusable.
    pub fn run(&self, stages: &[Stage]) -> Result<RunReport, PipelineError> {
        let layout = &self.ctx.layout;
        with_exclusive_lock(&layout.lock_path(), || {
            let ledger = if self.ctx.config.storage.effective_ledger() {
                Some(RunLedger::open(&layout.ledger_path())?)
            } else {
                None
            };

            let mut run = RunReport::default();
            for &stage in stages {
                let run_id = match &ledger {
                    Some(l) => Some(l.start_run(stage.as_str(), Utc::now().timestamp())?),
                    None => None,
                };
                let result = self.run_stage(stage);
                if let (Some(l), Some(id)) = (&ledger, run_id) {
                    record_run(l, id, &result)?;
                }
                let report = match result {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::error!(
                            stage = %stage,
                            error_code = e.error_code(),
                            error = %e,
                            "stage aborted, continuing with the next stage"
                        );
                        StageReport::aborted(stage, &e)
                    }
                };
                run.stages.push(report);
            }
            Ok(run)
        })
    }

    fn run_stage(&self, stage: Stage) -> Result<StageReport, PipelineError> {
        let span = tracing::info_span!("stage", stage = %stage);
        let _entered = span.enter();
        match stage {
            Stage::Gridding => stages::run_gridding(&self.ctx),
            Stage::Indicators => stages::run_indicators(&self.ctx),
            Stage::FineGrid => stages::run_fine_grid(&self.ctx),
        }
    }
}

fn record_run(
    ledger: &RunLedger,
    run_id: i64,
    result: &Result<StageReport, PipelineError>,
) -> Result<(), PipelineError> {
    let completion = match result {
        Ok(report) => {
            for cycle in &report.cycles {
                if let CycleOutcome::Failed {
                    error_code,
                    message,
                } = &cycle.outcome
                {
                    ledger.record_failure(run_id, cycle.center, error_code, message)?;
                }
            }
            let merge_failure = report.merge.as_ref().and_then(|m| m.failure.clone());
            RunCompletion {
                completed_at: Utc::now().timestamp(),
                cycles: report.cycles.len() as i64,
                produced: report.produced() as i64,
                up_to_date: report.up_to_date() as i64,
                failed: report.failed() as i64,
                duration_ms: report.duration.as_millis() as i64,
                status: if merge_failure.is_some() {
                    "merge_failed".to_string()
                } else {
                    "completed".to_string()
                },
                error: merge_failure,
            }
        }
        Err(e) => RunCompletion {
            completed_at: Utc::now().timestamp(),
            status: "failed".to_string(),
            error: Some(format!("{}: {e}", e.error_code())),
            ..Default::default()
        },
    };
    ledger.complete_run(run_id, &completion)?;
    Ok(())
}
