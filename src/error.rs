//! Error taxonomy for git invocations.
//!
//! Three failure modes exist and they surface through different channels:
//! [`GitError::SpawnFailure`] is returned synchronously from `start`,
//! [`GitError::ExitStatus`] and [`GitError::IoFailure`] arrive through the
//! completion event. Teardown never produces errors of its own; releasing an
//! already-released resource is a no-op.

use std::fmt;
use std::io;

use thiserror::Error;

/// Which pipe an I/O failure occurred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Failure of one git invocation.
#[derive(Error, Debug)]
pub enum GitError {
    /// The program could not be launched at all (missing binary, permission
    /// denied). No process was created and no completion event will fire.
    #[error("failed to start {program}: {source}")]
    SpawnFailure {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and exited with a non-zero status. `message` is the
    /// trimmed stderr text, or a generic fallback when stderr was empty.
    #[error("error invoking git: {message}")]
    ExitStatus { code: i32, message: String },

    /// A pipe read failed for a reason other than end-of-stream. The child
    /// was force-terminated and the invocation ended immediately.
    #[error("error reading git {stream}: {source}")]
    IoFailure {
        stream: StreamKind,
        #[source]
        source: io::Error,
    },
}

impl GitError {
    /// Build the completion error for a non-zero exit from the captured
    /// diagnostic bytes. Trailing whitespace is trimmed; an empty or
    /// all-whitespace buffer yields a generic, non-empty message.
    #[must_use]
    pub(crate) fn from_exit(code: i32, diagnostics: &[u8]) -> Self {
        let text = String::from_utf8_lossy(diagnostics);
        let trimmed = text.trim_end();
        let message = if trimmed.is_empty() {
            format!("process exited with status {code}")
        } else {
            trimmed.to_string()
        };
        Self::ExitStatus { code, message }
    }

    /// Actionable one-liner for terminal users.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::SpawnFailure { program, source } => {
                format!("Could not launch `{program}` ({source}). Is it installed and on your PATH?")
            }
            Self::ExitStatus { message, .. } => {
                format!("git failed: {message}")
            }
            Self::IoFailure { stream, source } => {
                format!("Lost contact with the git process while reading {stream}: {source}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_exit_trims_trailing_whitespace() {
        let err = GitError::from_exit(1, b"fatal: bad object\n   ");
        match err {
            GitError::ExitStatus { code, message } => {
                assert_eq!(code, 1);
                assert_eq!(message, "fatal: bad object");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_exit_keeps_interior_whitespace() {
        let err = GitError::from_exit(128, b"fatal: not a git repository\nhint: try init\n");
        match err {
            GitError::ExitStatus { message, .. } => {
                assert_eq!(message, "fatal: not a git repository\nhint: try init");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_exit_empty_stderr_is_generic_but_nonempty() {
        for diagnostics in [&b""[..], &b"  \n\t "[..]] {
            let err = GitError::from_exit(1, diagnostics);
            match err {
                GitError::ExitStatus { code, message } => {
                    assert_eq!(code, 1);
                    assert!(!message.is_empty());
                    assert!(message.contains('1'));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn display_includes_diagnostic_text() {
        let err = GitError::from_exit(1, b"fatal: bad revision\n");
        assert_eq!(err.to_string(), "error invoking git: fatal: bad revision");
    }

    #[test]
    fn stream_kind_display() {
        assert_eq!(StreamKind::Stdout.to_string(), "stdout");
        assert_eq!(StreamKind::Stderr.to_string(), "stderr");
    }

    #[test]
    fn user_messages_are_actionable() {
        let spawn = GitError::SpawnFailure {
            program: "git".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(spawn.user_message().contains("PATH"));

        let io_err = GitError::IoFailure {
            stream: StreamKind::Stderr,
            source: io::Error::from(io::ErrorKind::BrokenPipe),
        };
        assert!(io_err.user_message().contains("stderr"));
    }
}
