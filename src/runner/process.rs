//! Child process execution: spawn a script, stream its stdout, and resolve
//! to a single [`Outcome`] once the child has exited and its stdout has
//! reached end-of-stream.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How a script execution ended.
#[derive(Debug)]
pub enum Outcome {
    /// The child ran to completion. A non-zero exit code is still a
    /// completion.
    Completed(Completion),
    /// The OS could not create the child, or lost track of it before an exit
    /// status was delivered. No timing is reported.
    SpawnFailed { error: std::io::Error },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub exit_code: i32,
    /// Wall time from just before the spawn call to the exit notification.
    pub elapsed: Duration,
    /// Captured stdout lines joined with `\n`. `None` if the child never
    /// wrote a line, which is distinct from `Some("")`.
    pub captured: Option<String>,
}

impl Completion {
    /// Elapsed time as a `seconds.nanoseconds` decimal string.
    pub fn execution_time_seconds(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{}.{:09}", elapsed.as_secs(), elapsed.subsec_nanos())
}

// ---------------------------------------------------------------------------
// OutputBuffer
// ---------------------------------------------------------------------------

/// Accumulates stdout chunks in arrival order, newline-separated.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    text: Option<String>,
}

impl OutputBuffer {
    pub fn push(&mut self, chunk: &str) {
        match &mut self.text {
            Some(text) => {
                text.push('\n');
                text.push_str(chunk);
            }
            None => self.text = Some(chunk.to_string()),
        }
    }

    pub fn into_text(self) -> Option<String> {
        self.text
    }
}

/// Read `reader` to end-of-stream, one line per chunk.
///
/// The `\n` terminator and a preceding `\r` are stripped; a trailing line
/// without terminator is still a chunk. Invalid UTF-8 is replaced rather
/// than rejected, so a script printing binary data still gets recorded.
///
/// Each chunk is echoed to `echo` when given. The first failed echo write
/// (the operator closed our stdout) turns echoing off; the stream is still
/// drained and buffered to the end.
pub async fn read_chunks<R, W>(
    mut reader: R,
    buffer: &mut OutputBuffer,
    mut echo: Option<W>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        let chunk = String::from_utf8_lossy(&line);
        if let Some(out) = echo.as_mut() {
            if let Err(e) = echo_line(out, &chunk).await {
                warn!(error = %e, "stdout closed, no longer echoing script output");
                echo = None;
            }
        }
        buffer.push(&chunk);
    }
}

async fn echo_line<W: AsyncWrite + Unpin>(out: &mut W, chunk: &str) -> std::io::Result<()> {
    out.write_all(chunk.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

// ---------------------------------------------------------------------------
// ProcessRunner
// ---------------------------------------------------------------------------

/// Launches scripts as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    interpreter: Option<String>,
    echo: bool,
}

impl ProcessRunner {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            echo: config.echo,
        }
    }

    fn command(&self, script: &Path, args: &[String]) -> Command {
        let mut command = match &self.interpreter {
            Some(interpreter) => {
                let mut c = Command::new(interpreter);
                c.arg(script);
                c
            }
            None => Command::new(script),
        };
        command
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            // The child outlives a dropped handle; only the recording step
            // waits on it.
            .kill_on_drop(false);
        command
    }

    /// Run `script` with `args` and wait for it to finish.
    ///
    /// stdout is drained concurrently with waiting for exit, and the outcome
    /// resolves only after both, so every chunk is buffered before the
    /// caller sees the exit code.
    pub async fn execute(&self, script: &Path, args: &[String]) -> Outcome {
        let mut command = self.command(script, args);

        let start = Instant::now();
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                warn!(script = %script.display(), error = %error, "failed to spawn script");
                return Outcome::SpawnFailed { error };
            }
        };
        debug!(script = %script.display(), pid = child.id(), "script spawned");

        let stdout = child.stdout.take();
        let echo = self.echo;
        let drain = async move {
            let mut buffer = OutputBuffer::default();
            if let Some(stdout) = stdout {
                let echo = echo.then(tokio::io::stdout);
                if let Err(e) = read_chunks(BufReader::new(stdout), &mut buffer, echo).await {
                    warn!(error = %e, "stdout stream failed; keeping output read so far");
                }
            }
            buffer
        };
        let exit = async {
            let status = child.wait().await;
            (status, start.elapsed())
        };

        let (buffer, (status, elapsed)) = tokio::join!(drain, exit);

        match status {
            Ok(status) => {
                let exit_code = exit_code(status);
                info!(
                    script = %script.display(),
                    exit_code,
                    elapsed_sec = elapsed.as_secs_f64(),
                    "script exited"
                );
                Outcome::Completed(Completion {
                    exit_code,
                    elapsed,
                    captured: buffer.into_text(),
                })
            }
            Err(error) => {
                warn!(script = %script.display(), error = %error, "failed to wait for script");
                Outcome::SpawnFailed { error }
            }
        }
    }
}

/// Numeric exit code. A child killed by a signal reports `128 + signal`,
/// the shell convention.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
