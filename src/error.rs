//! Error taxonomy shared by every `bee` command.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::Table;

/// Errors surfaced to the command-dispatch boundary in `main`.
#[derive(Debug, Error)]
pub enum BeeError {
    /// The store could not be opened, migrated, or configured.
    #[error("could not establish a database connection: {0}")]
    StoreUnavailable(String),

    #[error("{} not found or improper permissions", path.display())]
    ScriptNotFound { path: PathBuf },

    /// The OS refused to create the child process. The run record `run_id`
    /// stays pending.
    #[error("spawn failed for run {run_id}: {source}")]
    SpawnFailed {
        run_id: i64,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Validation(String),

    /// One or more ids handed to a delete command do not exist.
    #[error("{}", not_found_message(*table, ids))]
    NotFoundInBatch { table: Table, ids: Vec<i64> },

    #[error("cancelled")]
    UserCancelled,

    #[error(transparent)]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Pool(#[from] r2d2::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BeeError>;

fn not_found_message(table: Table, ids: &[i64]) -> String {
    let joined = ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if ids.len() > 1 {
        format!("{} are not existing {} IDs!", joined, table.label())
    } else {
        format!("{} is not an existing {} ID", joined, table.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_singular() {
        let err = BeeError::NotFoundInBatch {
            table: Table::Runs,
            ids: vec![2],
        };
        assert_eq!(err.to_string(), "2 is not an existing history ID");
    }

    #[test]
    fn test_not_found_message_plural() {
        let err = BeeError::NotFoundInBatch {
            table: Table::Outputs,
            ids: vec![2, 5],
        };
        assert_eq!(err.to_string(), "2, 5 are not existing output IDs!");
    }

    #[test]
    fn test_script_not_found_mentions_path() {
        let err = BeeError::ScriptNotFound {
            path: PathBuf::from("/tmp/missing.sh"),
        };
        assert!(err.to_string().contains("/tmp/missing.sh"));
    }
}
