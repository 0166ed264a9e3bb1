//! bee -- run scripts with a recorded history.
//!
//! Every `bee run` stores a run row (arguments, note, exit status, duration)
//! and, when the script wrote to stdout, an output row holding what it
//! printed. The history and output can be listed, dumped and pruned later.

pub mod config;
pub mod error;
pub mod prompt;
pub mod query;
pub mod render;
pub mod runner;
pub mod scaffold;
pub mod storage;

pub use error::{BeeError, Result};
