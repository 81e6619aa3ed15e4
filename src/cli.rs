//! Command-line front end.
//!
//! The binary is a thin wrapper over [`GitReader`]: it streams the child's
//! stdout to the terminal as chunks arrive and maps failures to exit codes.
//! All logic lives here so `main.rs` stays a two-line delegation.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::command::GitCommand;
use crate::error::GitError;
use crate::logging::init_tracing;
use crate::reader::GitReader;

/// Exit code constants for the `gitread` binary.
pub mod codes {
    /// Operation completed and git exited with status zero.
    pub const SUCCESS: i32 = 0;

    /// Unclassified failure.
    pub const FAILURE: i32 = 1;

    /// Reading a pipe or writing the terminal failed mid-stream.
    pub const IO_FAILURE: i32 = 74;

    /// The program could not be launched at all.
    pub const SPAWN_FAILURE: i32 = 127;
}

/// Map a reader error to the binary's exit code. A non-zero git exit is
/// propagated as-is when it fits the shell's exit-code range.
#[must_use]
pub fn error_to_exit_code(error: &GitError) -> i32 {
    match error {
        GitError::SpawnFailure { .. } => codes::SPAWN_FAILURE,
        GitError::ExitStatus { code, .. } => {
            if (1..=255).contains(code) {
                *code
            } else {
                codes::FAILURE
            }
        }
        GitError::IoFailure { .. } => codes::IO_FAILURE,
    }
}

/// gitread - run a git command and stream its output as it is produced
#[derive(Debug, Parser)]
#[command(name = "gitread", version)]
#[command(about = "Run a git command and stream its output as it is produced")]
#[command(
    after_help = "EXAMPLES:\n  gitread -- blame --incremental src/lib.rs\n  gitread -C /path/to/repo -- log --oneline -20"
)]
pub struct Cli {
    /// Run git inside DIR instead of the current directory
    #[arg(short = 'C', long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Program to invoke instead of `git`
    #[arg(long = "git", value_name = "PROGRAM", default_value = "git")]
    pub program: OsString,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Arguments passed to git verbatim, after `--`
    #[arg(value_name = "ARGS", last = true, required = true)]
    pub args: Vec<OsString>,
}

/// Entry point used by `main`. Handles all output, including error
/// reporting; the caller only maps the returned code to `process::exit`.
pub fn run() -> Result<(), i32> {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("gitread: failed to initialize logging: {err}");
        return Err(codes::FAILURE);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| {
            eprintln!("gitread: failed to start async runtime: {err}");
            codes::FAILURE
        })?;

    runtime.block_on(stream(cli))
}

async fn stream(cli: Cli) -> Result<(), i32> {
    let mut command = GitCommand::with_program(&cli.program);
    if let Some(dir) = &cli.dir {
        command = command.cwd(dir);
    }
    let mut reader = GitReader::with_command(command);

    reader.start(&cli.args).await.map_err(|err| {
        eprintln!("gitread: {}", err.user_message());
        error_to_exit_code(&err)
    })?;

    let mut stdout = io::stdout();
    let mut write_error: Option<io::Error> = None;
    let result = reader
        .read_to_completion(|chunk| {
            if write_error.is_none()
                && let Err(err) = stdout.write_all(chunk)
            {
                write_error = Some(err);
            }
        })
        .await;
    let _ = stdout.flush();

    if let Err(err) = result {
        eprintln!("gitread: {}", err.user_message());
        return Err(error_to_exit_code(&err));
    }
    if let Some(err) = write_error {
        eprintln!("gitread: failed to write output: {err}");
        return Err(codes::IO_FAILURE);
    }
    Ok(())
}
