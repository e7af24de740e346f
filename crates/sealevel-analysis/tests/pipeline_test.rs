//! End-to-end runs over a synthetic archive: artifacts, masters, freshness
//! short-circuits, backups, events and the run ledger.

mod common;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use sealevel_analysis::pipeline::{CycleOutcome, Pipeline, ALL_STAGES};
use sealevel_analysis::resampler::GriddedCycle;
use sealevel_core::errors::SealevelErrorCode;
use sealevel_core::events::{CycleProducedEvent, MasterWrittenEvent, PipelineEventHandler};
use sealevel_core::types::Stage;
use sealevel_storage::ledger::RunLedger;
use sealevel_storage::ArrayCodec;

use common::{codec, config, d, fine_spec, write_archive, write_reference};

fn pipeline(root: &Path) -> Pipeline {
    Pipeline::new(config(), root).unwrap().with_fine_grid_spec(fine_spec())
}

fn setup() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_reference(dir.path());
    write_archive(dir.path());
    dir
}

/// Every artifact under `dir` with its modification time.
fn artifacts(dir: &Path) -> BTreeMap<PathBuf, SystemTime> {
    let mut out = BTreeMap::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else if path.to_string_lossy().ends_with(".json.zst") {
                let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();
                out.insert(path, mtime);
            }
        }
    }
    out
}

fn touch_future(path: &Path) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(30))
        .unwrap();
}

#[test]
fn full_run_produces_every_artifact() {
    let dir = setup();
    let pipeline = pipeline(dir.path());
    let report = pipeline.run_all().unwrap();

    for stage in ALL_STAGES {
        let stage_report = report.stage(stage).unwrap();
        assert_eq!(stage_report.produced(), 1, "{stage}");
        assert_eq!(stage_report.failed(), 0, "{stage}");
    }
    assert!(report.merge_succeeded());

    let layout = &pipeline.context().layout;
    let gridded_path = layout.gridded_cycle(d(1992, 10, 5));
    let gridded = GriddedCycle::from_dataset(&codec().read(&gridded_path).unwrap()).unwrap();
    assert_eq!(gridded.center, d(1992, 10, 5));
    for (&v, &c) in gridded.ssha.iter().zip(gridded.counts.iter()) {
        assert!((v - 0.10).abs() < 1e-6, "{v}");
        assert_eq!(c, 500.0);
    }

    let master = codec().read(&layout.indicators_master()).unwrap();
    assert_eq!(master.dim_len("time"), Some(1));
    let mean = master.require("spatial_mean").unwrap().values[0];
    assert!((mean - 0.10).abs() < 1e-6);
    // Uniform field against a uniform 20 mm template: 0.1 m / 0.02 m.
    let enso = master.require("enso_index").unwrap().values[0];
    assert!((enso - 5.0).abs() < 1e-4, "{enso}");
    assert!(master.require("pdo_index").unwrap().values[0].is_nan());
    assert_eq!(report.stage(Stage::Indicators).unwrap().degenerate_fits, 1);

    for p in ["enso", "pdo", "iod"] {
        assert!(layout.pattern_master(p).exists(), "{p}");
    }
    assert!(layout.globals_master().exists());

    let fine = codec().read(&layout.fine_grid(d(1992, 10, 5))).unwrap();
    let values = &fine.require("SSHA").unwrap().values;
    assert_eq!(values.len(), 3 * 7);
    assert!(values.iter().all(|v| (v - 100.0).abs() < 1e-3), "{values:?}");
}

#[test]
fn second_run_writes_nothing() {
    let dir = setup();
    let pipeline = pipeline(dir.path());
    pipeline.run_all().unwrap();
    let output = pipeline.context().layout.root().to_path_buf();
    let before = artifacts(&output);

    let report = pipeline.run_all().unwrap();
    for stage in ALL_STAGES {
        let stage_report = report.stage(stage).unwrap();
        assert_eq!(stage_report.up_to_date(), 1, "{stage}");
        assert_eq!(stage_report.produced(), 0, "{stage}");
    }
    let merge = report.stage(Stage::Indicators).unwrap().merge.as_ref().unwrap();
    assert!(merge.success);
    assert!(merge.masters.iter().all(|m| !m.written));
    assert_eq!(artifacts(&output), before);
}

#[test]
fn forced_recompute_is_byte_identical() {
    let dir = setup();
    let pipeline = pipeline(dir.path());
    pipeline.run(&[Stage::Gridding]).unwrap();
    let path = pipeline.context().layout.gridded_cycle(d(1992, 10, 5));
    let first = std::fs::read(&path).unwrap();

    std::fs::remove_file(&path).unwrap();
    let report = pipeline.run(&[Stage::Gridding]).unwrap();
    assert_eq!(report.produced(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), first);
}

#[test]
fn newer_gridded_cycle_refreshes_indicators_and_backs_up_master() {
    let dir = setup();
    let pipeline = pipeline(dir.path());
    pipeline.run(&[Stage::Gridding, Stage::Indicators]).unwrap();
    let layout = &pipeline.context().layout;
    assert!(!layout.backup_dir().exists());

    touch_future(&layout.gridded_cycle(d(1992, 10, 5)));
    let report = pipeline.run(&[Stage::Indicators]).unwrap();
    let stage = report.stage(Stage::Indicators).unwrap();
    assert_eq!(stage.produced(), 1);

    let merge = stage.merge.as_ref().unwrap();
    let indicators = merge.masters.iter().find(|m| m.product == "indicators").unwrap();
    let backup = indicators.backup.as_ref().unwrap();
    assert!(backup.starts_with(layout.backup_dir()));
    assert!(backup.exists());
    // Only the indicator master is backed up.
    assert_eq!(merge.masters.iter().filter(|m| m.backup.is_some()).count(), 1);
}

#[test]
fn empty_schedule_cycles_are_reported_not_raised() {
    let dir = setup();
    // A late anchor granule opens a second cycle with no eligible data.
    common::write_granule(dir.path(), "SNTNL-6A", d(1992, 10, 25), 0.10);
    std::fs::remove_file(
        dir.path()
            .join("alongtrack-delivery/SNTNL-6A/ssha_19921014.json.zst"),
    )
    .unwrap();

    let report = pipeline(dir.path()).run(&[Stage::Gridding]).unwrap();
    let gridding = report.stage(Stage::Gridding).unwrap();
    assert_eq!(gridding.cycles.len(), 3);
    assert_eq!(gridding.produced(), 1);
    assert_eq!(
        gridding.failures(),
        vec![
            (d(1992, 10, 12), "EMPTY_CYCLE"),
            (d(1992, 10, 19), "EMPTY_CYCLE"),
        ]
    );
    assert!(matches!(
        gridding.cycles[0].outcome,
        CycleOutcome::Produced { .. }
    ));
}

#[derive(Default)]
struct Counter {
    produced: AtomicUsize,
    masters: AtomicUsize,
}

impl PipelineEventHandler for Counter {
    fn on_cycle_produced(&self, _event: &CycleProducedEvent) {
        self.produced.fetch_add(1, Ordering::SeqCst);
    }

    fn on_master_written(&self, _event: &MasterWrittenEvent) {
        self.masters.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn events_and_ledger_follow_the_run() {
    let dir = setup();
    let mut pipeline = pipeline(dir.path());
    let counter = Arc::new(Counter::default());
    pipeline.register_handler(counter.clone());
    pipeline.run_all().unwrap();

    assert_eq!(counter.produced.load(Ordering::SeqCst), 3);
    // indicators, globals and three pattern series
    assert_eq!(counter.masters.load(Ordering::SeqCst), 5);

    let ledger = RunLedger::open(&pipeline.context().layout.ledger_path()).unwrap();
    let runs = ledger.recent_runs(10).unwrap();
    assert_eq!(runs.len(), 3);
    assert!(runs.iter().all(|r| r.status == "completed"));
    assert!(runs.iter().any(|r| r.stage == "fine_grid"));
}

#[test]
fn concurrent_run_is_rejected_while_locked() {
    let dir = setup();
    let pipeline = pipeline(dir.path());
    let lock_path = pipeline.context().layout.lock_path();
    std::fs::create_dir_all(lock_path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(&lock_path).unwrap();
    let mut lock = fd_lock::RwLock::new(file);
    let _held = lock.try_write().unwrap();

    let err = pipeline.run(&[Stage::Gridding]).unwrap_err();
    assert_eq!(err.error_code(), "OUTPUT_LOCKED");
}

#[test]
fn failed_stage_does_not_stop_later_stages() {
    let dir = setup();
    let pipeline = pipeline(dir.path());
    pipeline.run(&[Stage::Gridding]).unwrap();

    // A plain file where the per-cycle indicator directory should be.
    let blocked = pipeline.context().layout.cycle_indicators_dir();
    std::fs::create_dir_all(blocked.parent().unwrap()).unwrap();
    std::fs::write(&blocked, b"not a directory").unwrap();

    let report = pipeline.run_all().unwrap();
    assert_eq!(report.aborted_stages(), vec![Stage::Indicators]);
    let abort = report.stage(Stage::Indicators).unwrap().aborted.clone().unwrap();
    assert_eq!(abort.error_code, "STORAGE_ERROR");

    let fine = report.stage(Stage::FineGrid).unwrap();
    assert!(fine.aborted.is_none());
    assert_eq!(fine.produced(), 1);
    assert!(pipeline.context().layout.fine_grid(d(1992, 10, 5)).exists());

    let ledger = RunLedger::open(&pipeline.context().layout.ledger_path()).unwrap();
    let runs = ledger.recent_runs(10).unwrap();
    assert!(runs.iter().any(|r| r.stage == "indicators" && r.status == "failed"));
    assert!(runs.iter().any(|r| r.stage == "fine_grid" && r.status == "completed"));
}
