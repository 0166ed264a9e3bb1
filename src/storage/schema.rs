//! Database schema and migrations.

use rusqlite::Connection;

/// Current schema version recorded in `schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Run all pending migrations. Safe to call on every startup.
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS bee_script_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            note TEXT,
            execution_time_seconds TEXT,
            status INTEGER,
            output_id INTEGER,
            execution_args TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS bee_script_output (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            output TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_runs_created ON bee_script_runs(created_at);
        CREATE INDEX IF NOT EXISTS idx_runs_name ON bee_script_runs(name);
        CREATE INDEX IF NOT EXISTS idx_output_created ON bee_script_output(created_at);
        CREATE INDEX IF NOT EXISTS idx_output_name ON bee_script_output(name);",
    )?;

    let applied = conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;
    if applied > 0 {
        tracing::info!(version = SCHEMA_VERSION, "bee tables created");
    }

    Ok(())
}
