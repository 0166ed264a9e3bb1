//! Read and delete operations over recorded runs and outputs.

pub mod history;
pub mod output;

use crate::error::{BeeError, Result};
use crate::prompt::Prompt;
use crate::storage::{Store, Table};

/// Result of a confirmed batch delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(usize),
    Declined,
}

/// Parse delete arguments into ids. Every argument must be an integer and
/// at least one is required; repeated ids collapse to one.
pub fn parse_ids(raw: &[String]) -> Result<Vec<i64>> {
    if raw.is_empty() {
        return Err(BeeError::Validation(
            "Must provide valid integers for deletion".to_string(),
        ));
    }
    let mut ids = Vec::with_capacity(raw.len());
    for arg in raw {
        let id: i64 = arg.trim().parse().map_err(|_| {
            BeeError::Validation(format!(
                "Must provide valid integers for deletion ('{}' is not one)",
                arg
            ))
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

pub fn entries(n: usize) -> &'static str {
    if n == 1 {
        "entry"
    } else {
        "entries"
    }
}

/// Validate, confirm, then delete `raw_ids` from `table`.
///
/// Unknown ids reject the whole batch before the operator is asked
/// anything; nothing is deleted unless every id exists.
pub async fn delete_batch(
    store: &Store,
    prompt: &dyn Prompt,
    table: Table,
    raw_ids: &[String],
    assume_yes: bool,
) -> Result<DeleteOutcome> {
    let ids = parse_ids(raw_ids)?;

    let missing = store.missing_ids(table, &ids)?;
    if !missing.is_empty() {
        return Err(BeeError::NotFoundInBatch { table, ids: missing });
    }

    let target = match table {
        Table::Runs => "run history",
        Table::Outputs => "output",
    };
    let question = format!("Delete {} {} from {}?", ids.len(), entries(ids.len()), target);
    if !assume_yes && !prompt.confirm(&question, true).await? {
        return Ok(DeleteOutcome::Declined);
    }

    let deleted = store.delete_ids(table, &ids)?;
    tracing::info!(table = table.table_name(), deleted, "entries deleted");
    Ok(DeleteOutcome::Deleted(deleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use crate::storage::NewRun;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_ids_rejects_non_integers() {
        assert!(matches!(
            parse_ids(&strings(&["1", "two"])),
            Err(BeeError::Validation(_))
        ));
        assert!(matches!(parse_ids(&[]), Err(BeeError::Validation(_))));
    }

    #[test]
    fn test_parse_ids_dedupes_in_order() {
        assert_eq!(parse_ids(&strings(&["3", "1", "3"])).unwrap(), vec![3, 1]);
    }

    fn seed(store: &Store, n: usize) -> Vec<i64> {
        (0..n)
            .map(|_| store.insert_run(&NewRun::new("job.sh", None, "")).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_missing_id_rejects_whole_batch() {
        let store = Store::open_in_memory().unwrap();
        let ids = seed(&store, 3);
        store.delete_ids(Table::Runs, &[ids[1]]).unwrap();
        let prompt = ScriptedPrompt::new(["y"]);

        let raw: Vec<String> = ids.iter().map(i64::to_string).collect();
        let err = delete_batch(&store, &prompt, Table::Runs, &raw, false)
            .await
            .unwrap_err();

        match err {
            BeeError::NotFoundInBatch { ids: missing, .. } => assert_eq!(missing, vec![ids[1]]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.get_run(ids[0]).unwrap().is_some());
        assert!(store.get_run(ids[2]).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_declined_confirmation_deletes_nothing() {
        let store = Store::open_in_memory().unwrap();
        let ids = seed(&store, 1);
        let prompt = ScriptedPrompt::new(["n"]);

        let outcome = delete_batch(&store, &prompt, Table::Runs, &[ids[0].to_string()], false)
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Declined);
        assert!(store.get_run(ids[0]).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_rows() {
        let store = Store::open_in_memory().unwrap();
        let ids = seed(&store, 2);
        let prompt = ScriptedPrompt::new([""]);
        let raw: Vec<String> = ids.iter().map(i64::to_string).collect();

        let outcome = delete_batch(&store, &prompt, Table::Runs, &raw, false)
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted(2));
        assert!(store.get_run(ids[0]).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_assume_yes_skips_prompt() {
        let store = Store::open_in_memory().unwrap();
        let ids = seed(&store, 1);
        let prompt = ScriptedPrompt::default();

        let outcome = delete_batch(&store, &prompt, Table::Runs, &[ids[0].to_string()], true)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted(1));
    }
}
