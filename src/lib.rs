//! gitread - streaming git subprocess runner with a single-shot completion
//! event.
//!
//! This crate runs `git <args…>` as a child process and hands its standard
//! output to the caller incrementally, chunk by chunk, while standard error
//! accumulates into a diagnostic buffer. An invocation is complete only when
//! three independent events have all happened — the child exited, stdout hit
//! end-of-stream, stderr hit end-of-stream — and the completion result is
//! delivered exactly once regardless of the order they arrive in.
//!
//! The crate exists for consumers like annotation ("blame") viewers that
//! want output as it is produced rather than after the process ends, but it
//! forwards bytes raw and knows nothing about any particular git
//! subcommand's output grammar.
//!
//! # Quick start
//!
//! ```no_run
//! use gitread::GitReader;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), gitread::GitError> {
//!     let mut reader = GitReader::new();
//!     let log = reader.collect_output(["log", "--oneline", "-5"]).await?;
//!     print!("{}", String::from_utf8_lossy(&log));
//!     Ok(())
//! }
//! ```
//!
//! # Failure surfaces
//!
//! A spawn failure ([`GitError::SpawnFailure`]) is returned synchronously
//! from [`GitReader::start`]; it never produces a completion event. Non-zero
//! exits ([`GitError::ExitStatus`], message built from trimmed stderr) and
//! hard pipe errors ([`GitError::IoFailure`]) surface through the completion
//! result instead. A process that exits with status zero completes cleanly
//! even if it wrote to stderr.

pub mod cli;
pub mod command;
pub mod completion;
pub mod config;
pub mod error;
pub mod logging;
pub mod reader;
pub mod ring_buffer;

pub use command::GitCommand;
pub use completion::{CompletionSignal, CompletionTracker};
pub use config::ReaderConfig;
pub use error::{GitError, StreamKind};
pub use reader::GitReader;
pub use ring_buffer::RingBuffer;
