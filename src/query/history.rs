//! Run history queries.

use crate::error::Result;
use crate::storage::{Filter, RunRecord, Store};

pub const DEFAULT_LIMIT: u32 = 10;

/// Most recent runs, optionally restricted to names matching `pattern`.
pub fn list(store: &Store, pattern: Option<&str>, limit: u32) -> Result<Vec<RunRecord>> {
    let mut filter = Filter::new(limit);
    if let Some(pattern) = pattern.filter(|p| !p.is_empty()) {
        filter = filter.with_pattern(pattern);
    }
    store.list_runs(&filter)
}

/// Script names that have at least one run.
pub fn names(store: &Store) -> Result<Vec<String>> {
    store.distinct_names()
}

/// Runs that started but never finalized.
pub fn pending(store: &Store, limit: u32) -> Result<Vec<RunRecord>> {
    store.pending_runs(limit)
}
