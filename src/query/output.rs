//! Captured output queries.

use crate::error::Result;
use crate::storage::{Filter, OutputRecord, Store};

pub const DEFAULT_LIMIT: u32 = 5;

/// What `bee output` was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputQuery {
    /// Dump one record's full text.
    One(i64),
    /// List recent records.
    Recent { pattern: Option<String>, limit: u32 },
}

impl OutputQuery {
    /// `--id` wins; otherwise a bare integer positional (`bee output 12`) is
    /// an id and anything else is a name pattern.
    pub fn from_args(target: Option<&str>, id: Option<i64>, limit: u32) -> Self {
        if let Some(id) = id {
            return OutputQuery::One(id);
        }
        match target {
            Some(t) => match t.parse::<i64>() {
                Ok(id) => OutputQuery::One(id),
                Err(_) => OutputQuery::Recent {
                    pattern: Some(t.to_string()),
                    limit,
                },
            },
            None => OutputQuery::Recent {
                pattern: None,
                limit,
            },
        }
    }
}

pub fn get(store: &Store, id: i64) -> Result<Option<OutputRecord>> {
    store.get_output(id)
}

pub fn list(store: &Store, pattern: Option<&str>, limit: u32) -> Result<Vec<OutputRecord>> {
    let mut filter = Filter::new(limit);
    if let Some(pattern) = pattern.filter(|p| !p.is_empty()) {
        filter = filter.with_pattern(pattern);
    }
    store.list_outputs(&filter)
}
