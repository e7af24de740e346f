//! Per-cycle outcomes collected into stage and run reports.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use sealevel_core::errors::{PipelineError, SealevelErrorCode};
use sealevel_core::types::Stage;
use sealevel_storage::master::MasterReport;

/// What happened to one cycle in one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A new artifact was written.
    Produced { path: PathBuf },
    /// The artifact was newer than every input; nothing was written.
    UpToDate,
    /// The cycle was skipped. Other cycles are unaffected.
    Failed {
        error_code: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    pub center: NaiveDate,
    pub outcome: CycleOutcome,
}

/// Result of the master concatenation phase.
#[derive(Debug, Clone, Default)]
pub struct MergeSummary {
    pub success: bool,
    pub masters: Vec<MasterReport>,
    pub failure: Option<String>,
}

/// An error that stopped a stage before it finished.
#[derive(Debug, Clone, PartialEq)]
pub struct StageAbort {
    pub error_code: &'static str,
    pub message: String,
}

/// One stage run: an outcome per cycle, in processing order.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    pub cycles: Vec<CycleRecord>,
    /// Pattern fits that were degenerate in otherwise produced cycles.
    pub degenerate_fits: usize,
    /// Only set by the indicators stage.
    pub merge: Option<MergeSummary>,
    /// Set when the stage itself failed; `cycles` is then empty.
    pub aborted: Option<StageAbort>,
    pub duration: Duration,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            cycles: Vec::new(),
            degenerate_fits: 0,
            merge: None,
            aborted: None,
            duration: Duration::ZERO,
        }
    }

    /// Report for a stage that stopped on `error`.
    pub fn aborted(stage: Stage, error: &PipelineError) -> Self {
        Self {
            aborted: Some(StageAbort {
                error_code: error.error_code(),
                message: error.to_string(),
            }),
            ..Self::new(stage)
        }
    }

    pub fn record(&mut self, center: NaiveDate, outcome: CycleOutcome) {
        self.cycles.push(CycleRecord { center, outcome });
    }

    pub fn produced(&self) -> usize {
        self.count(|o| matches!(o, CycleOutcome::Produced { .. }))
    }

    pub fn up_to_date(&self) -> usize {
        self.count(|o| matches!(o, CycleOutcome::UpToDate))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CycleOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&CycleOutcome) -> bool) -> usize {
        self.cycles.iter().filter(|c| pred(&c.outcome)).count()
    }

    /// Failures as `(center, error_code)`.
    pub fn failures(&self) -> Vec<(NaiveDate, &'static str)> {
        self.cycles
            .iter()
            .filter_map(|c| match &c.outcome {
                CycleOutcome::Failed { error_code, .. } => Some((c.center, *error_code)),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn produced(&self) -> usize {
        self.stages.iter().map(StageReport::produced).sum()
    }

    pub fn failed(&self) -> usize {
        self.stages.iter().map(StageReport::failed).sum()
    }

    /// Stages that stopped on a stage-level error.
    pub fn aborted_stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .filter(|s| s.aborted.is_some())
            .map(|s| s.stage)
            .collect()
    }

    /// False only when a master concatenation phase ran and failed.
    pub fn merge_succeeded(&self) -> bool {
        self.stages
            .iter()
            .filter_map(|s| s.merge.as_ref())
            .all(|m| m.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2000, 1, d).unwrap()
    }

    #[test]
    fn counts_by_outcome() {
        let mut report = StageReport::new(Stage::Gridding);
        report.record(day(1), CycleOutcome::Produced { path: "a".into() });
        report.record(day(8), CycleOutcome::UpToDate);
        report.record(
            day(15),
            CycleOutcome::Failed {
                error_code: "EMPTY_CYCLE",
                message: "none".to_string(),
            },
        );
        assert_eq!((report.produced(), report.up_to_date(), report.failed()), (1, 1, 1));
        assert_eq!(report.failures(), vec![(day(15), "EMPTY_CYCLE")]);
    }

    #[test]
    fn merge_status_defaults_to_success() {
        let mut run = RunReport::default();
        run.stages.push(StageReport::new(Stage::FineGrid));
        assert!(run.merge_succeeded());

        let mut indicators = StageReport::new(Stage::Indicators);
        indicators.merge = Some(MergeSummary::default());
        run.stages.push(indicators);
        assert!(!run.merge_succeeded());
        assert!(run.stage(Stage::Indicators).is_some());
    }

    #[test]
    fn aborted_stage_keeps_error_code() {
        use sealevel_core::errors::StorageError;

        let error = PipelineError::from(StorageError::Locked {
            path: "out/.sealevel.lock".into(),
        });
        let mut run = RunReport::default();
        run.stages.push(StageReport::aborted(Stage::Gridding, &error));
        run.stages.push(StageReport::new(Stage::FineGrid));

        assert_eq!(run.aborted_stages(), vec![Stage::Gridding]);
        let abort = run.stages[0].aborted.as_ref().unwrap();
        assert_eq!(abort.error_code, "OUTPUT_LOCKED");
        assert_eq!(run.stages[0].failed(), 0);
    }
}
