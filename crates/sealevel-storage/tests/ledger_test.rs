//! Tests for the SQLite run ledger.

use chrono::NaiveDate;
use sealevel_storage::ledger::{RunCompletion, RunLedger};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn test_migrations_set_schema_version() {
    let ledger = RunLedger::open_in_memory().unwrap();
    assert_eq!(ledger.schema_version().unwrap(), 1);
}

#[test]
fn test_run_lifecycle_and_failures() {
    let ledger = RunLedger::open_in_memory().unwrap();
    let run = ledger.start_run("gridding", 1_700_000_000).unwrap();

    ledger
        .record_failure(run, d(1999, 10, 5), "EMPTY_CYCLE", "no granules")
        .unwrap();
    ledger
        .record_failure(run, d(1999, 9, 28), "NO_VALID_DATA", "all NaN")
        .unwrap();

    ledger
        .complete_run(
            run,
            &RunCompletion {
                completed_at: 1_700_000_060,
                cycles: 10,
                produced: 6,
                up_to_date: 2,
                failed: 2,
                duration_ms: 60_000,
                status: "completed".to_string(),
                error: None,
            },
        )
        .unwrap();

    let runs = ledger.recent_runs(5).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].stage, "gridding");
    assert_eq!(runs[0].status, "completed");
    assert_eq!(runs[0].failed, Some(2));

    let failures = ledger.failures_for_run(run).unwrap();
    assert_eq!(failures.len(), 2);
    // ordered by center date
    assert_eq!(failures[0].center, "1999-09-28");
    assert_eq!(failures[1].error_code, "EMPTY_CYCLE");
    assert_eq!(ledger.failure_count_for_cycle(d(1999, 10, 5)).unwrap(), 1);
}

#[test]
fn test_file_ledger_reopens_without_remigrating() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.db");
    {
        let ledger = RunLedger::open(&path).unwrap();
        ledger.start_run("indicators", 1).unwrap();
    }
    let ledger = RunLedger::open(&path).unwrap();
    assert_eq!(ledger.schema_version().unwrap(), 1);
    assert_eq!(ledger.recent_runs(10).unwrap().len(), 1);
}
