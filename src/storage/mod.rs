//! SQLite storage layer -- pool, schema, and the run/output tables.

pub mod outputs;
pub mod runs;
pub mod schema;

use std::path::Path;

use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;

use crate::error::{BeeError, Result};

pub use outputs::OutputRecord;
pub use runs::{Finalization, NewRun, RunRecord};

/// Connection Pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

/// Open (or create) the SQLite database and return a connection pool.
pub fn open_pool(path: &Path, max_size: u32) -> Result<Pool> {
    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = R2D2Pool::builder().max_size(max_size.max(1)).build(manager)?;

    // Run migrations on a single connection
    let conn = pool.get()?;
    schema::migrate(&conn)?;

    Ok(pool)
}

/// The two tables `bee` owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Runs,
    Outputs,
}

impl Table {
    pub fn table_name(self) -> &'static str {
        match self {
            Table::Runs => "bee_script_runs",
            Table::Outputs => "bee_script_output",
        }
    }

    /// Word used for this table in operator-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Table::Runs => "history",
            Table::Outputs => "output",
        }
    }
}

/// Filter shared by the history and output listings.
#[derive(Debug, Clone)]
pub struct Filter {
    pub pattern: Option<String>,
    pub limit: u32,
}

impl Filter {
    pub fn new(limit: u32) -> Self {
        Self {
            pattern: None,
            limit,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Build the `WHERE ... ORDER BY ... LIMIT` tail and its parameters.
    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();

        if let Some(pattern) = &self.pattern {
            params.push(Value::Text(like_pattern(pattern)));
            sql.push_str(" WHERE name LIKE ?1 ESCAPE '\\'");
        }
        params.push(Value::Integer(i64::from(self.limit)));
        sql.push_str(&format!(
            " ORDER BY created_at DESC, id DESC LIMIT ?{}",
            params.len()
        ));
        (sql, params)
    }
}

/// Turn an operator-supplied name pattern into a SQL `LIKE` pattern.
///
/// A pattern carrying `%` is used verbatim (`%work%`, `nightly_%`).
/// Anything else is a substring match with `\` and `_` escaped, so
/// `data_fix` matches `data_fix.sh` literally. SQLite's `LIKE` is
/// case-insensitive for ASCII.
pub fn like_pattern(pattern: &str) -> String {
    if pattern.contains('%') {
        return pattern.to_string();
    }
    let mut escaped = String::with_capacity(pattern.len() + 2);
    escaped.push('%');
    for c in pattern.chars() {
        if matches!(c, '\\' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Handle to the persistent store, shared by every command in one
/// invocation. Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct Store {
    pool: Pool,
}

impl Store {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Open the store at `path`, creating parent directories as needed.
    /// Every failure is reported as [`BeeError::StoreUnavailable`].
    pub fn open(path: &Path, pool_size: u32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    BeeError::StoreUnavailable(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let pool = open_pool(path, pool_size)
            .map_err(|e| BeeError::StoreUnavailable(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "store opened");
        Ok(Self::new(pool))
    }

    /// Single-connection in-memory store. Each in-memory connection is its
    /// own database, so the pool is pinned to one connection.
    pub fn open_in_memory() -> Result<Self> {
        let pool = R2D2Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())?;
        schema::migrate(&*pool.get()?)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Return the subset of `ids` that has no row in `table`, in input order.
    pub fn missing_ids(&self, table: Table, ids: &[i64]) -> Result<Vec<i64>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT 1 FROM {} WHERE id = ?1",
            table.table_name()
        ))?;
        let mut missing = Vec::new();
        for &id in ids {
            if !stmt.exists([id])? {
                missing.push(id);
            }
        }
        Ok(missing)
    }

    /// Delete every row in `ids` from `table` in one transaction, failing
    /// the whole batch if any id is missing. Returns the number deleted.
    pub fn delete_ids(&self, table: Table, ids: &[i64]) -> Result<usize> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;
        let mut missing = Vec::new();
        {
            let mut stmt = tx.prepare(&format!(
                "DELETE FROM {} WHERE id = ?1",
                table.table_name()
            ))?;
            for &id in ids {
                match stmt.execute([id])? {
                    0 => missing.push(id),
                    n => deleted += n,
                }
            }
        }
        if !missing.is_empty() {
            // Dropping `tx` rolls back.
            return Err(BeeError::NotFoundInBatch { table, ids: missing });
        }
        tx.commit()?;
        Ok(deleted)
    }
}
