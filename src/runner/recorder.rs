//! Record lifecycle around one script run: pending row, execution,
//! transactional finalization.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use super::process::{Outcome, ProcessRunner};
use crate::error::{BeeError, Result};
use crate::prompt::Prompt;
use crate::storage::{Finalization, NewRun, Store};

/// Longest note accepted for a run, in characters.
pub const NOTE_LIMIT: usize = 50;

pub fn validate_note(note: &str) -> std::result::Result<(), String> {
    let len = note.chars().count();
    if len > NOTE_LIMIT {
        Err(format!(
            "Note limit is {} characters (entered {})",
            NOTE_LIMIT, len
        ))
    } else {
        Ok(())
    }
}

/// Where the run note comes from.
#[derive(Debug, Clone)]
pub enum NoteSource {
    /// Passed on the command line; validated, never prompted.
    Given(String),
    /// Asked interactively.
    Prompt,
    /// No note.
    Skip,
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub script: PathBuf,
    pub args: Vec<String>,
    pub note: NoteSource,
}

/// What the operator is told once a run is recorded.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: i64,
    pub name: String,
    pub exit_code: i32,
    pub execution_time_seconds: String,
    pub output_id: Option<i64>,
}

/// Runs scripts and keeps the store consistent with what happened.
pub struct Recorder {
    store: Store,
    runner: ProcessRunner,
    cwd: PathBuf,
}

impl Recorder {
    /// `cwd` anchors relative script paths.
    pub fn new(store: Store, runner: ProcessRunner, cwd: impl Into<PathBuf>) -> Self {
        Self {
            store,
            runner,
            cwd: cwd.into(),
        }
    }

    /// Resolve a script path; it must name an existing file.
    pub fn resolve_script(&self, script: &Path) -> Result<PathBuf> {
        let path = self.cwd.join(script);
        if path.is_file() {
            Ok(path)
        } else {
            Err(BeeError::ScriptNotFound { path })
        }
    }

    /// Run a script and record it.
    ///
    /// The pending run row is inserted before the child starts. A spawn
    /// failure leaves that row pending and returns
    /// [`BeeError::SpawnFailed`]; a completed run is finalized in one
    /// transaction whatever its exit code.
    pub async fn recorded_run(&self, request: RunRequest, prompt: &dyn Prompt) -> Result<RunReport> {
        let path = self.resolve_script(&request.script)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let note = match request.note {
            NoteSource::Given(note) => {
                validate_note(&note).map_err(BeeError::Validation)?;
                Some(note)
            }
            NoteSource::Prompt => Some(
                prompt
                    .text("Notes about this run (optional)", validate_note)
                    .await?,
            ),
            NoteSource::Skip => None,
        };

        let run_id = self
            .store
            .insert_run(&NewRun::new(name.clone(), note, request.args.join(" ")))?;
        info!(run_id, name = %name, "run started");

        let completion = match self.runner.execute(&path, &request.args).await {
            Outcome::Completed(completion) => completion,
            Outcome::SpawnFailed { error } => {
                error!(run_id, name = %name, error = %error, "spawn failed, run left pending");
                return Err(BeeError::SpawnFailed {
                    run_id,
                    source: error,
                });
            }
        };

        let execution_time_seconds = completion.execution_time_seconds();
        let output_id = self.store.finalize_run(
            run_id,
            &name,
            &Finalization {
                status: i64::from(completion.exit_code),
                execution_time_seconds: execution_time_seconds.clone(),
                output: completion.captured,
            },
        )?;
        info!(run_id, exit_code = completion.exit_code, ?output_id, "run recorded");

        Ok(RunReport {
            run_id,
            name,
            exit_code: completion.exit_code,
            execution_time_seconds,
            output_id,
        })
    }
}
