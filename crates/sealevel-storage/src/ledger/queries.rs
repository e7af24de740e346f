//! Queries for `pipeline_runs` and `cycle_failures`.

use rusqlite::{params, Connection};

use sealevel_core::errors::StorageError;

fn sql_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

/// A stage run record.
#[derive(Debug, Clone)]
pub struct RunRow {
    pub id: i64,
    pub stage: String,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub cycles: Option<i64>,
    pub produced: Option<i64>,
    pub up_to_date: Option<i64>,
    pub failed: Option<i64>,
    pub duration_ms: Option<i64>,
    pub status: String,
    pub error: Option<String>,
}

/// Counters written when a run completes.
#[derive(Debug, Clone, Default)]
pub struct RunCompletion {
    pub completed_at: i64,
    pub cycles: i64,
    pub produced: i64,
    pub up_to_date: i64,
    pub failed: i64,
    pub duration_ms: i64,
    pub status: String,
    pub error: Option<String>,
}

/// A recorded per-cycle failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRow {
    pub run_id: i64,
    pub center: String,
    pub error_code: String,
    pub message: String,
}

/// Insert a run (status = 'running'). Returns the row id.
pub fn insert_run_start(conn: &Connection, stage: &str, started_at: i64) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO pipeline_runs (stage, started_at, status) VALUES (?1, ?2, 'running')",
        params![stage, started_at],
    )
    .map_err(sql_err)?;
    Ok(conn.last_insert_rowid())
}

/// Fill in the completion columns of a run.
pub fn update_run_complete(
    conn: &Connection,
    id: i64,
    done: &RunCompletion,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE pipeline_runs SET
            completed_at = ?1, cycles = ?2, produced = ?3, up_to_date = ?4,
            failed = ?5, duration_ms = ?6, status = ?7, error = ?8
         WHERE id = ?9",
        params![
            done.completed_at,
            done.cycles,
            done.produced,
            done.up_to_date,
            done.failed,
            done.duration_ms,
            done.status,
            done.error,
            id
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn insert_failure(conn: &Connection, failure: &FailureRow) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO cycle_failures (run_id, center, error_code, message) VALUES (?1, ?2, ?3, ?4)",
        params![failure.run_id, failure.center, failure.error_code, failure.message],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// Most recent runs first.
pub fn query_recent_runs(conn: &Connection, limit: usize) -> Result<Vec<RunRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, stage, started_at, completed_at, cycles, produced, up_to_date,
                    failed, duration_ms, status, error
             FROM pipeline_runs ORDER BY started_at DESC, id DESC LIMIT ?1",
        )
        .map_err(sql_err)?;

    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(RunRow {
                id: row.get(0)?,
                stage: row.get(1)?,
                started_at: row.get(2)?,
                completed_at: row.get(3)?,
                cycles: row.get(4)?,
                produced: row.get(5)?,
                up_to_date: row.get(6)?,
                failed: row.get(7)?,
                duration_ms: row.get(8)?,
                status: row.get(9)?,
                error: row.get(10)?,
            })
        })
        .map_err(sql_err)?;

    rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
}

pub fn query_failures_for_run(conn: &Connection, run_id: i64) -> Result<Vec<FailureRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT run_id, center, error_code, message FROM cycle_failures
             WHERE run_id = ?1 ORDER BY center",
        )
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(params![run_id], |row| {
            Ok(FailureRow {
                run_id: row.get(0)?,
                center: row.get(1)?,
                error_code: row.get(2)?,
                message: row.get(3)?,
            })
        })
        .map_err(sql_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
}

/// Count failures recorded for one cycle across all runs.
pub fn count_failures_for_cycle(conn: &Connection, center: &str) -> Result<i64, StorageError> {
    conn.query_row(
        "SELECT COUNT(*) FROM cycle_failures WHERE center = ?1",
        params![center],
        |row| row.get(0),
    )
    .map_err(sql_err)
}
