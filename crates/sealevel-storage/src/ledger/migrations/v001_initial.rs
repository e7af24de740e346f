//! V001: run ledger tables.

pub const MIGRATION_SQL: &str = r#"
-- One row per stage execution.
CREATE TABLE IF NOT EXISTS pipeline_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stage TEXT NOT NULL,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    cycles INTEGER,
    produced INTEGER,
    up_to_date INTEGER,
    failed INTEGER,
    duration_ms INTEGER,
    status TEXT NOT NULL,
    error TEXT
) STRICT;

CREATE INDEX IF NOT EXISTS idx_pipeline_runs_stage
    ON pipeline_runs(stage, started_at);

-- Every per-cycle failure, with its stable error code.
CREATE TABLE IF NOT EXISTS cycle_failures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES pipeline_runs(id) ON DELETE CASCADE,
    center TEXT NOT NULL,
    error_code TEXT NOT NULL,
    message TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_cycle_failures_run ON cycle_failures(run_id);
CREATE INDEX IF NOT EXISTS idx_cycle_failures_center ON cycle_failures(center);
"#;
