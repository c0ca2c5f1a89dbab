// src/exec/executor.rs

//! Blocking "run this and fail loudly" convenience for orchestration steps.
//!
//! Higher-level steps (the SDK installer, for example) talk to a
//! [`CommandExecutor`] instead of a [`ProcessRunner`] directly. That keeps
//! them testable: tests provide their own executor that records commands
//! instead of spawning processes.
//!
//! [`ProcessExecutor`] is the real implementation. It always runs
//! synchronously with captured output, waits for both output pipelines to
//! finish, and turns a non-zero exit into [`SdkrunError::NonZeroExit`]
//! carrying the accumulated stderr text and any secondary failures.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{Result, SdkrunError};
use crate::exec::command::Command;
use crate::exec::handle::ProcessTracker;
use crate::exec::listener::{AccumulatingLineListener, LineListener, Listeners};
use crate::exec::runner::ProcessRunner;
use crate::types::{ExecutionMode, OutputRouting};

/// Trait abstracting how a fully-specified command gets executed.
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion, streaming its output to the two
    /// listeners. Resolves to `Ok(())` only for exit code 0.
    fn execute<'a>(
        &'a self,
        command: &'a Command,
        stdout: Arc<dyn LineListener>,
        stderr: Arc<dyn LineListener>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Executor backed by real OS processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    tracker: Option<ProcessTracker>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register spawned children with `tracker` so application teardown can
    /// destroy them.
    #[must_use]
    pub fn with_tracker(mut self, tracker: ProcessTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub async fn run(
        &self,
        command: &Command,
        stdout: Arc<dyn LineListener>,
        stderr: Arc<dyn LineListener>,
    ) -> Result<()> {
        let captured_stderr = Arc::new(AccumulatingLineListener::new());
        let listeners = Listeners::new()
            .on_stdout(stdout)
            .on_stderr(stderr)
            .on_stderr(captured_stderr.clone());

        let mut runner =
            ProcessRunner::new(ExecutionMode::Synchronous, OutputRouting::Captured, listeners)?;
        if let Some(tracker) = &self.tracker {
            runner = runner.with_tracker(tracker.clone());
        }

        let completion = runner.run(command).await?.wait().await;
        debug!(
            program = %command.program_display(),
            exit_code = completion.exit_code,
            "command finished"
        );

        if !completion.success() {
            if !completion.deferred.is_empty() {
                warn!(
                    count = completion.deferred.len(),
                    "secondary failures while running a failed command"
                );
            }
            return Err(SdkrunError::NonZeroExit {
                program: command.program_display(),
                code: completion.exit_code,
                stderr: captured_stderr.output(),
                deferred: completion.deferred,
            });
        }

        completion.into_result().map(|_| ())
    }
}

impl CommandExecutor for ProcessExecutor {
    fn execute<'a>(
        &'a self,
        command: &'a Command,
        stdout: Arc<dyn LineListener>,
        stderr: Arc<dyn LineListener>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.run(command, stdout, stderr))
    }
}
