use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};

use bee::config::{BeeConfig, LoggingConfig};
use bee::prompt::TerminalPrompt;
use bee::query::{self, history, output, DeleteOutcome};
use bee::render;
use bee::runner::{NoteSource, ProcessRunner, Recorder, RunReport, RunRequest};
use bee::storage::{Store, Table};
use bee::BeeError;

#[derive(Parser)]
#[command(
    name = "bee",
    about = "Run scripts with a recorded history of arguments, exit status and output",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (default: ./bee.toml, or $BEE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script and record it. Options go before the script path;
    /// everything after it is passed to the script.
    #[command(alias = "script:run")]
    Run {
        /// Note stored with the run (max 50 characters)
        #[arg(long)]
        note: Option<String>,

        /// Do not ask for a note
        #[arg(long, conflicts_with = "note")]
        no_note: bool,

        /// Script to run, relative to the current directory
        script: PathBuf,

        /// Arguments passed to the script verbatim
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Show the run history (newest first)
    History {
        /// Script name filter; plain text matches as a substring, text with `%` as a LIKE pattern
        pattern: Option<String>,

        /// How many rows to display
        #[arg(long, default_value_t = history::DEFAULT_LIMIT)]
        limit: u32,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Delete run history entries
    #[command(name = "history:delete")]
    HistoryDelete {
        /// Run ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Show captured output, or dump one entry in full with --id
    Output {
        /// Script name filter, or an output id
        target: Option<String>,

        /// How many rows to display
        #[arg(long, default_value_t = output::DEFAULT_LIMIT)]
        limit: u32,

        /// Dump the full output of this entry to stdout
        #[arg(long)]
        id: Option<i64>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Delete output entries
    #[command(name = "output:delete")]
    OutputDelete {
        /// Output ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// List scripts that have run history
    List {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Show runs that started but never finished recording
    Pending {
        #[arg(long, default_value_t = history::DEFAULT_LIMIT)]
        limit: u32,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Create a script from the boilerplate template
    #[command(name = "script:make")]
    ScriptMake {
        /// Script path; the extension is replaced with .sh
        path: PathBuf,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    // Logs go to stderr; stdout carries script output and `bee output` dumps.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Cannot print help: {}", e);
                ExitCode::FAILURE
            }
        };
    };

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("Cannot determine the current directory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match BeeConfig::discover(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            report(&BeeError::StoreUnavailable(format!("{:#}", e)));
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging);

    match dispatch(command, &config, &cwd).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn open_store(config: &BeeConfig) -> bee::Result<Store> {
    let path = config.database_path();
    tracing::debug!(path = %path.display(), "opening store");
    Store::open(&path, config.database.pool_size)
}

async fn dispatch(command: Commands, config: &BeeConfig, cwd: &Path) -> bee::Result<ExitCode> {
    // script:make is the only command that never touches the store.
    if let Commands::ScriptMake { path } = &command {
        let created = bee::scaffold::make(cwd, path)?;
        let display = created.file_name().map(Path::new).unwrap_or(created.as_path());
        println!("{} was created!", display.display());
        return Ok(ExitCode::SUCCESS);
    }

    let store = open_store(config)?;
    let prompt = TerminalPrompt;

    match command {
        Commands::Run {
            note,
            no_note,
            script,
            args,
        } => {
            let note = match note {
                Some(note) => NoteSource::Given(note),
                None if no_note || !std::io::stdin().is_terminal() => NoteSource::Skip,
                None => NoteSource::Prompt,
            };
            let recorder = Recorder::new(store, ProcessRunner::new(&config.runner), cwd);
            let report = recorder
                .recorded_run(RunRequest { script, args, note }, &prompt)
                .await?;

            // The run is already recorded; a closed stdout must not turn it
            // into a failure.
            if let Err(e) = print_run_summary(&report) {
                tracing::warn!(error = %e, "could not print run summary");
            }
            Ok(exit_code_of(report.exit_code))
        }
        Commands::History {
            pattern,
            limit,
            json,
        } => {
            let runs = history::list(&store, pattern.as_deref(), limit)?;
            if json {
                print_json(&runs)?;
            } else if runs.is_empty() {
                println!("No history entries found.");
            } else {
                println!("{}", render::runs_table(&runs));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::HistoryDelete { ids, yes } => delete(&store, &prompt, Table::Runs, &ids, yes).await,
        Commands::Output {
            target,
            limit,
            id,
            json,
        } => {
            match output::OutputQuery::from_args(target.as_deref(), id, limit) {
                output::OutputQuery::One(id) => match output::get(&store, id)? {
                    Some(record) if json => print_json(&record)?,
                    Some(record) => println!("{}", record.output),
                    None => eprintln!("No output entry found with id {}", id),
                },
                output::OutputQuery::Recent { pattern, limit } => {
                    let outputs = output::list(&store, pattern.as_deref(), limit)?;
                    if json {
                        print_json(&outputs)?;
                    } else if outputs.is_empty() {
                        println!("No output entries found.");
                    } else {
                        print!("{}", render::outputs_listing(&outputs));
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::OutputDelete { ids, yes } => {
            delete(&store, &prompt, Table::Outputs, &ids, yes).await
        }
        Commands::List { json } => {
            let names = history::names(&store)?;
            if json {
                print_json(&names)?;
            } else {
                println!("bee has history entries for the following:");
                for name in names {
                    println!("{}", name);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Pending { limit, json } => {
            let runs = history::pending(&store, limit)?;
            if json {
                print_json(&runs)?;
            } else if runs.is_empty() {
                println!("No pending runs.");
            } else {
                println!("{}", render::runs_table(&runs));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::ScriptMake { .. } => Ok(ExitCode::SUCCESS),
    }
}

async fn delete(
    store: &Store,
    prompt: &TerminalPrompt,
    table: Table,
    ids: &[String],
    yes: bool,
) -> bee::Result<ExitCode> {
    match query::delete_batch(store, prompt, table, ids, yes).await? {
        DeleteOutcome::Deleted(n) => println!("{} {} deleted", n, query::entries(n)),
        DeleteOutcome::Declined => println!("aborted delete"),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_run_summary(report: &RunReport) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(
        out,
        "{} run finished. Exit Code: {}\nElapsed time: {} second(s)",
        report.name, report.exit_code, report.execution_time_seconds
    )?;
    if let Some(output_id) = report.output_id {
        writeln!(out, "Output entry created with id: {}", output_id)?;
    }
    out.flush()
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> bee::Result<()> {
    let json = render::to_json(value).map_err(|e| BeeError::Io(e.into()))?;
    println!("{}", json);
    Ok(())
}

/// `bee run` exits with the script's own code.
fn exit_code_of(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}

/// Print an error the way the operator should see it.
fn report(err: &BeeError) {
    match err {
        BeeError::StoreUnavailable(reason) => {
            eprintln!("Could not establish DB connection! {}", reason);
            eprintln!("Run bee from the directory holding bee.toml, or pass --config.");
        }
        BeeError::SpawnFailed { run_id, source } => {
            eprintln!("Error! Spawn failed: {}", source);
            eprintln!("Run {} was left pending (see `bee pending`).", run_id);
        }
        BeeError::NotFoundInBatch { .. } => {
            eprintln!("{}", err);
            eprintln!("aborted delete");
        }
        _ => eprintln!("{}", err),
    }
}
