//! The `bee_script_runs` table: one row per recorded script run.

use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::Serialize;

use super::{Filter, Store};
use crate::error::Result;

/// A persisted run. `status`, `execution_time_seconds` and `output_id` are
/// `None` while the run is pending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub id: i64,
    pub name: String,
    pub note: Option<String>,
    pub execution_args: String,
    pub status: Option<i64>,
    pub execution_time_seconds: Option<String>,
    pub output_id: Option<i64>,
    pub created_at: String,
}

impl RunRecord {
    pub fn is_pending(&self) -> bool {
        self.status.is_none()
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            note: row.get(2)?,
            execution_args: row.get(3)?,
            status: row.get(4)?,
            execution_time_seconds: row.get(5)?,
            output_id: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

const RUN_COLUMNS: &str =
    "id, name, note, execution_args, status, execution_time_seconds, output_id, created_at";

/// Fields known when a run starts.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub name: String,
    pub note: Option<String>,
    pub execution_args: String,
}

impl NewRun {
    pub fn new(name: impl Into<String>, note: Option<String>, execution_args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            note: note.filter(|n| !n.is_empty()),
            execution_args: execution_args.into(),
        }
    }
}

/// Everything written when a run completes.
#[derive(Debug, Clone)]
pub struct Finalization {
    pub status: i64,
    pub execution_time_seconds: String,
    /// Captured stdout; `None` means the child never wrote to stdout and no
    /// output row is created.
    pub output: Option<String>,
}

impl Store {
    /// Insert a pending run and return its id.
    pub fn insert_run(&self, run: &NewRun) -> Result<i64> {
        let conn = self.pool().get()?;
        conn.execute(
            "INSERT INTO bee_script_runs (name, note, execution_args) VALUES (?1, ?2, ?3)",
            params![run.name, run.note, run.execution_args],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Finalize a pending run.
    ///
    /// The output row (if any) and the run update share one transaction, the
    /// insert first, so `output_id` never points at a row that does not
    /// exist and no half-finalized run is ever visible. Returns the new
    /// output id.
    pub fn finalize_run(&self, run_id: i64, name: &str, fin: &Finalization) -> Result<Option<i64>> {
        let mut conn = self.pool().get()?;
        let tx = conn.transaction()?;

        let output_id = match &fin.output {
            Some(text) => {
                tx.execute(
                    "INSERT INTO bee_script_output (name, output) VALUES (?1, ?2)",
                    params![name, text],
                )?;
                Some(tx.last_insert_rowid())
            }
            None => None,
        };

        tx.execute(
            "UPDATE bee_script_runs
             SET status = ?1, execution_time_seconds = ?2, output_id = ?3
             WHERE id = ?4",
            params![fin.status, fin.execution_time_seconds, output_id, run_id],
        )?;

        tx.commit()?;
        Ok(output_id)
    }

    pub fn get_run(&self, id: i64) -> Result<Option<RunRecord>> {
        let conn = self.pool().get()?;
        let run = conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM bee_script_runs WHERE id = ?1"),
                [id],
                RunRecord::from_row,
            )
            .optional()?;
        Ok(run)
    }

    /// Runs matching `filter`, newest first.
    pub fn list_runs(&self, filter: &Filter) -> Result<Vec<RunRecord>> {
        let conn = self.pool().get()?;
        let (tail, values) = filter.to_sql();
        let mut stmt = conn.prepare(&format!("SELECT {RUN_COLUMNS} FROM bee_script_runs{tail}"))?;
        let rows = stmt
            .query_map(params_from_iter(values), RunRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Runs that never finalized (spawn failures, crashes), newest first.
    pub fn pending_runs(&self, limit: u32) -> Result<Vec<RunRecord>> {
        let conn = self.pool().get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM bee_script_runs
             WHERE status IS NULL
             ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map([limit], RunRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Distinct script names that have run history, sorted.
    pub fn distinct_names(&self) -> Result<Vec<String>> {
        let conn = self.pool().get()?;
        let mut stmt = conn.prepare("SELECT DISTINCT name FROM bee_script_runs ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}
