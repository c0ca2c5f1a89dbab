// src/exec/mod.rs

//! Process execution layer.
//!
//! Everything that launches an external program goes through here, using
//! `tokio::process::Command` with argv-style arguments.
//!
//! - [`command`] is the immutable [`Command`] description.
//! - [`listener`] defines the start / line / exit callback surfaces.
//! - [`line_reader`] drains one output pipe into line listeners.
//! - [`handle`] has the cancellation [`ProcessHandle`] and the
//!   [`ProcessTracker`] used for teardown.
//! - [`runner`] owns the lifecycle of a single execution.
//! - [`executor`] provides the `CommandExecutor` trait and the blocking
//!   `ProcessExecutor` used by orchestration steps, and which tests can
//!   replace with a fake implementation.

pub mod command;
pub mod executor;
pub mod handle;
pub mod line_reader;
pub mod listener;
pub mod runner;

pub use command::Command;
pub use executor::{CommandExecutor, ProcessExecutor};
pub use handle::{ProcessHandle, ProcessTracker, TrackingGuard};
pub use line_reader::{DrainReport, LineReader};
pub use listener::{
    AccumulatingLineListener, ExitListener, LineListener, Listeners, StartListener,
    exit_listener, line_listener, start_listener,
};
pub use runner::{Completion, Execution, ProcessRunner, UNKNOWN_EXIT_CODE};
