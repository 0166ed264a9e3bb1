//! Script execution and run recording.

pub mod process;
pub mod recorder;

pub use process::{Completion, Outcome, ProcessRunner};
pub use recorder::{NoteSource, Recorder, RunReport, RunRequest, NOTE_LIMIT};
