//! Asynchronous git invocation with incremental output delivery.
//!
//! [`GitReader`] owns at most one child process at a time. `start` spawns
//! `git <args…>` with piped stdout/stderr, `read_to_completion` multiplexes
//! the two pipes and the exit notification on the current task, forwarding
//! stdout chunks to the caller's sink and collecting stderr for diagnostics.
//! The invocation is finished only when all three signals — process exited,
//! stdout drained, stderr drained — have been observed; the completion result
//! is produced exactly once, whatever order they arrive in.
//!
//! # Example
//!
//! ```no_run
//! use gitread::GitReader;
//!
//! # async fn demo() -> Result<(), gitread::GitError> {
//! let mut reader = GitReader::new();
//! reader.start(["blame", "--incremental", "src/lib.rs"]).await?;
//! reader
//!     .read_to_completion(|chunk| {
//!         // chunks arrive in process-output order, unparsed
//!         print!("{}", String::from_utf8_lossy(chunk));
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::ffi::OsString;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tracing::{debug, warn};

use crate::command::GitCommand;
use crate::completion::{CompletionSignal, CompletionTracker};
use crate::config::ReaderConfig;
use crate::error::{GitError, StreamKind};
use crate::ring_buffer::RingBuffer;

type CompletionCallback = Box<dyn FnMut(Option<&GitError>) + Send>;

/// Runner for one git invocation at a time.
///
/// Starting a new invocation while a previous one is still running tears the
/// previous one down first (forced termination included); the discarded
/// invocation never delivers a completion event.
pub struct GitReader {
    command: GitCommand,
    config: ReaderConfig,
    on_complete: Option<CompletionCallback>,
    invocation: Option<Invocation>,
}

/// One in-flight run: the child plus everything the pump mutates.
struct Invocation {
    child: Child,
    stdout: Option<tokio::process::ChildStdout>,
    stderr: Option<tokio::process::ChildStderr>,
    /// Write-once, set by the exit arm of the pump.
    exit_status: Option<ExitStatus>,
    signals: CompletionTracker,
    diagnostics: RingBuffer,
}

/// Why the pump loop stopped.
enum PumpEnd {
    /// All three completion signals observed.
    Complete,
    /// A pipe read failed hard; the join is bypassed.
    StreamFailed(StreamKind, io::Error),
}

impl GitReader {
    /// Reader for the real `git` binary with default tunables.
    #[must_use]
    pub fn new() -> Self {
        Self::with_command(GitCommand::new())
    }

    /// Reader for an arbitrary command template (program override, working
    /// directory, environment).
    #[must_use]
    pub fn with_command(command: GitCommand) -> Self {
        Self {
            command,
            config: ReaderConfig::default(),
            on_complete: None,
            invocation: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a callback invoked exactly once per completed invocation,
    /// with `None` on success and `Some(error)` on failure. Invocations torn
    /// down by [`stop`](Self::stop) or a superseding `start` never reach it.
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut(Option<&GitError>) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    /// OS pid of the current child, if one is running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.invocation.as_ref().and_then(|inv| inv.child.id())
    }

    /// Whether a child process is currently alive.
    pub fn is_running(&mut self) -> bool {
        match self.invocation.as_mut() {
            Some(inv) => matches!(inv.child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Spawn `git <args…>`.
    ///
    /// Any prior invocation is torn down first, exactly as
    /// [`stop`](Self::stop) would. On success the pipes and the exit watch
    /// are armed and the method returns without waiting for output. A spawn
    /// failure (missing binary, permissions) is reported here and only here —
    /// no completion event is scheduled for it.
    pub async fn start<I, S>(&mut self, args: I) -> Result<(), GitError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.stop().await;

        let mut cmd = self.command.to_command(args);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| GitError::SpawnFailure {
            program: self.command.program().to_string_lossy().into_owned(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        debug!(pid = child.id(), "spawned child");

        self.invocation = Some(Invocation {
            child,
            stdout,
            stderr,
            exit_status: None,
            signals: CompletionTracker::new(),
            diagnostics: RingBuffer::new(self.config.stderr_cap_bytes),
        });
        Ok(())
    }

    /// Drive the current invocation until it completes, forwarding each
    /// stdout chunk to `sink` in process-output order.
    ///
    /// Returns the exit status on success. A non-zero exit yields
    /// [`GitError::ExitStatus`] carrying the trimmed stderr text; a hard pipe
    /// error force-terminates the child and yields [`GitError::IoFailure`]
    /// without waiting for the remaining completion signals. Either way the
    /// completion is delivered exactly once, and a registered
    /// [`on_complete`](Self::on_complete) callback fires just before return.
    ///
    /// Cancelling the returned future leaves the invocation in place; calling
    /// this method again resumes it.
    ///
    /// # Panics
    ///
    /// Panics if no invocation has been started.
    pub async fn read_to_completion<F>(&mut self, mut sink: F) -> Result<ExitStatus, GitError>
    where
        F: FnMut(&[u8]),
    {
        let chunk_size = self.config.chunk_size;
        let end = {
            let inv = self
                .invocation
                .as_mut()
                .expect("read_to_completion called with no invocation started");
            let Invocation {
                child,
                stdout,
                stderr,
                exit_status,
                signals,
                diagnostics,
            } = inv;

            let mut out_buf = vec![0u8; chunk_size];
            let mut err_buf = vec![0u8; chunk_size];

            loop {
                tokio::select! {
                    read = read_chunk(stdout.as_mut(), &mut out_buf) => match read {
                        Ok(0) => {
                            *stdout = None;
                            signals.record(CompletionSignal::StdoutClosed);
                            debug!("stdout reached end of stream");
                        }
                        Ok(n) => sink(&out_buf[..n]),
                        Err(source) => break PumpEnd::StreamFailed(StreamKind::Stdout, source),
                    },
                    read = read_chunk(stderr.as_mut(), &mut err_buf) => match read {
                        Ok(0) => {
                            *stderr = None;
                            signals.record(CompletionSignal::StderrClosed);
                            debug!("stderr reached end of stream");
                        }
                        Ok(n) => diagnostics.write(&err_buf[..n]),
                        Err(source) => break PumpEnd::StreamFailed(StreamKind::Stderr, source),
                    },
                    waited = child.wait(), if !signals.contains(CompletionSignal::ProcessExited) => {
                        match waited {
                            Ok(status) => {
                                *exit_status = Some(status);
                                debug!(code = ?status.code(), "child exited");
                            }
                            // ECHILD and friends: the status is unrecoverable,
                            // treat the run as failed but keep draining pipes.
                            Err(err) => warn!(%err, "failed to collect child exit status"),
                        }
                        signals.record(CompletionSignal::ProcessExited);
                    },
                }

                if signals.is_complete() {
                    break PumpEnd::Complete;
                }
            }
        };

        match end {
            PumpEnd::Complete => self.finalize(),
            PumpEnd::StreamFailed(stream, source) => self.abort(stream, source).await,
        }
    }

    /// Convenience wrapper: start `git <args…>` and gather its whole stdout.
    pub async fn collect_output<I, S>(&mut self, args: I) -> Result<Vec<u8>, GitError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.start(args).await?;
        let mut output = Vec::new();
        self.read_to_completion(|chunk| output.extend_from_slice(chunk))
            .await?;
        Ok(output)
    }

    /// Tear down the current invocation, if any.
    ///
    /// The stream watches are dropped first, then the child is reaped: a
    /// non-blocking wait picks up a child that already exited without
    /// signalling it; otherwise SIGTERM is sent and the call waits until the
    /// child is gone, escalating to SIGKILL after the configured grace
    /// period. After `stop` returns, no completion event fires for the
    /// invocation and nothing reads its pipes. A no-op when idle.
    pub async fn stop(&mut self) {
        let Some(mut inv) = self.invocation.take() else {
            return;
        };
        inv.stdout = None;
        inv.stderr = None;
        terminate_child(&mut inv.child, self.config.kill_grace).await;
    }

    /// Normal completion path: all three signals present.
    fn finalize(&mut self) -> Result<ExitStatus, GitError> {
        let inv = self
            .invocation
            .take()
            .expect("finalize requires an invocation");
        // Both pipes are already closed here; dropping `inv` releases the
        // child handle and the diagnostic buffer.
        let result = match inv.exit_status {
            Some(status) if status.success() => Ok(status),
            status => {
                let code = status.and_then(|s| s.code()).unwrap_or(-1);
                Err(GitError::from_exit(code, &inv.diagnostics.to_vec()))
            }
        };
        debug!(ok = result.is_ok(), "invocation completed");
        self.notify_completion(result.as_ref().err());
        result
    }

    /// Fatal-read path: kill the child and complete immediately.
    async fn abort(&mut self, stream: StreamKind, source: io::Error) -> Result<ExitStatus, GitError> {
        warn!(%stream, err = %source, "pipe read failed, terminating child");
        if let Some(mut inv) = self.invocation.take() {
            inv.stdout = None;
            inv.stderr = None;
            terminate_child(&mut inv.child, self.config.kill_grace).await;
        }
        let error = GitError::IoFailure { stream, source };
        self.notify_completion(Some(&error));
        Err(error)
    }

    fn notify_completion(&mut self, error: Option<&GitError>) {
        if let Some(callback) = self.on_complete.as_mut() {
            callback(error);
        }
    }
}

impl Default for GitReader {
    fn default() -> Self {
        Self::new()
    }
}

/// One bounded read from an optional stream; pends forever once the stream
/// has been closed so the disabled source simply drops out of the select.
async fn read_chunk<R>(stream: Option<&mut R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(stream) => stream.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Reap-or-kill sequence shared by `stop`, restart and the fatal-read path.
///
/// The non-blocking wait must come first: a child that exited on its own may
/// already have been reaped, and its pid must not be signalled again once the
/// OS is free to recycle it.
async fn terminate_child(child: &mut Child, grace: Duration) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(code = ?status.code(), "child had already exited");
            return;
        }
        Ok(None) => {}
        Err(err) => warn!(%err, "could not poll child state before termination"),
    }

    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if let Err(err) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            warn!(%err, pid, "failed to deliver SIGTERM");
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => debug!(code = ?status.code(), "child terminated"),
        Ok(Err(err)) => warn!(%err, "failed to reap terminated child"),
        Err(_) => {
            warn!("child survived SIGTERM grace period, sending SIGKILL");
            let _ = child.start_kill();
            if let Err(err) = child.wait().await {
                warn!(%err, "failed to reap child after SIGKILL");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn new_reader_targets_git() {
        let reader = GitReader::new();
        assert_eq!(reader.command.program(), OsStr::new("git"));
        assert!(reader.invocation.is_none());
    }

    #[test]
    fn with_config_applies_tunables() {
        let config = ReaderConfig {
            chunk_size: 64,
            stderr_cap_bytes: 1024,
            kill_grace: Duration::from_millis(100),
        };
        let reader = GitReader::new().with_config(config);
        assert_eq!(reader.config.chunk_size, 64);
        assert_eq!(reader.config.stderr_cap_bytes, 1024);
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_no_op() {
        let mut reader = GitReader::new();
        reader.stop().await;
        reader.stop().await;
        assert!(!reader.is_running());
        assert!(reader.pid().is_none());
    }
}
