//! Argv-style assembly of the git invocation.
//!
//! All process execution goes through [`GitCommand`] so that arguments cross
//! the process boundary as discrete elements, never as shell strings. The
//! program defaults to `git` and is resolved through the search path; tests
//! substitute a scripted stub via [`GitCommand::with_program`].

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// Invocation template: the program plus everything that is fixed across
/// invocations (working directory, environment overrides). The per-invocation
/// arguments are supplied when the command is realized.
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: OsString,
    cwd: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl GitCommand {
    /// Template for the real `git` binary, resolved via the search path.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Template for an arbitrary program standing in for git.
    #[must_use]
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            cwd: None,
            envs: Vec::new(),
        }
    }

    /// Run the program inside `dir` instead of the caller's working directory.
    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment override. Later overrides for the same key win.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Realize the template into a runnable command with the given arguments
    /// appended after the program name. Stdio wiring is left to the caller.
    pub(crate) fn to_command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut cmd = Command::new(&self.program);
        for arg in args {
            cmd.arg(arg.into());
        }
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new()
    }
}
