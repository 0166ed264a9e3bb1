//! The `bee_script_output` table: captured stdout, written once per run.

use rusqlite::{params_from_iter, OptionalExtension, Row};
use serde::Serialize;

use super::{Filter, Store};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub id: i64,
    pub name: String,
    pub output: String,
    pub created_at: String,
}

impl OutputRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            output: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl Store {
    pub fn get_output(&self, id: i64) -> Result<Option<OutputRecord>> {
        let conn = self.pool().get()?;
        let output = conn
            .query_row(
                "SELECT id, name, output, created_at FROM bee_script_output WHERE id = ?1",
                [id],
                OutputRecord::from_row,
            )
            .optional()?;
        Ok(output)
    }

    /// Outputs matching `filter`, newest first.
    pub fn list_outputs(&self, filter: &Filter) -> Result<Vec<OutputRecord>> {
        let conn = self.pool().get()?;
        let (tail, values) = filter.to_sql();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, output, created_at FROM bee_script_output{tail}"
        ))?;
        let rows = stmt
            .query_map(params_from_iter(values), OutputRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Finalization, NewRun, Table};

    fn record(store: &Store, name: &str, text: &str) -> i64 {
        let run = store.insert_run(&NewRun::new(name, None, "")).unwrap();
        store
            .finalize_run(
                run,
                name,
                &Finalization {
                    status: 0,
                    execution_time_seconds: "0.000000001".into(),
                    output: Some(text.into()),
                },
            )
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_get_output_by_id() {
        let store = Store::open_in_memory().unwrap();
        let first = record(&store, "a.sh", "one");
        record(&store, "a.sh", "two");

        assert_eq!(store.get_output(first).unwrap().unwrap().output, "one");
        assert!(store.get_output(first + 100).unwrap().is_none());
    }

    #[test]
    fn test_list_outputs_supports_like_wildcards() {
        let store = Store::open_in_memory().unwrap();
        record(&store, "nightly_backup.sh", "ok");
        record(&store, "report.sh", "ok");

        let rows = store.list_outputs(&Filter::new(5).with_pattern("%BACKUP%")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "nightly_backup.sh");
    }

    #[test]
    fn test_deleting_output_leaves_run_reference() {
        let store = Store::open_in_memory().unwrap();
        let output_id = record(&store, "a.sh", "text");
        store.delete_ids(Table::Outputs, &[output_id]).unwrap();

        assert!(store.get_output(output_id).unwrap().is_none());
        let runs = store.list_runs(&Filter::new(1)).unwrap();
        assert_eq!(runs[0].output_id, Some(output_id));
    }
}
