//! SQLite run ledger: one row per stage run plus every per-cycle failure.

pub mod migrations;
pub mod queries;

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;

use sealevel_core::errors::StorageError;

pub use queries::{FailureRow, RunCompletion, RunRow};

/// Connection to the run ledger.
pub struct RunLedger {
    conn: Connection,
}

impl RunLedger {
    /// Open (or create) the ledger at `path` and migrate it.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| StorageError::SqliteError {
            message: format!("failed to open ledger {}: {e}", path.display()),
        })?;
        apply_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory ledger, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn start_run(&self, stage: &str, started_at: i64) -> Result<i64, StorageError> {
        queries::insert_run_start(&self.conn, stage, started_at)
    }

    pub fn complete_run(&self, run_id: i64, done: &RunCompletion) -> Result<(), StorageError> {
        queries::update_run_complete(&self.conn, run_id, done)
    }

    pub fn record_failure(
        &self,
        run_id: i64,
        center: NaiveDate,
        error_code: &str,
        message: &str,
    ) -> Result<(), StorageError> {
        queries::insert_failure(
            &self.conn,
            &FailureRow {
                run_id,
                center: center.format("%Y-%m-%d").to_string(),
                error_code: error_code.to_string(),
                message: message.to_string(),
            },
        )
    }

    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunRow>, StorageError> {
        queries::query_recent_runs(&self.conn, limit)
    }

    pub fn failures_for_run(&self, run_id: i64) -> Result<Vec<FailureRow>, StorageError> {
        queries::query_failures_for_run(&self.conn, run_id)
    }

    pub fn failure_count_for_cycle(&self, center: NaiveDate) -> Result<i64, StorageError> {
        queries::count_failures_for_cycle(&self.conn, &center.format("%Y-%m-%d").to_string())
    }

    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migrations::current_version(&self.conn)
    }
}

/// WAL journal, NORMAL sync, foreign keys, 5s busy timeout.
fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .map_err(|e| StorageError::SqliteError {
        message: format!("failed to apply pragmas: {e}"),
    })
}
