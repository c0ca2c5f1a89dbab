// src/exec/runner.rs

//! Lifecycle of one external command execution.
//!
//! [`ProcessRunner::run`] spawns the child, wires one [`LineReader`] per
//! captured channel, notifies start listeners, and then either supervises
//! the child inline (synchronous mode) or hands the supervisor to a Tokio
//! task (asynchronous mode). The supervisor is the only owner of the
//! `tokio::process::Child`; it waits for termination or for the handle's
//! cancellation token, kills the child in the latter case, and notifies the
//! exit listeners exactly once.
//!
//! Readers drain on their own tasks while the child runs. Once the child
//! has terminated the supervisor joins them, so every captured line has
//! been delivered before any exit listener hears the code. A grandchild
//! that keeps a pipe open therefore delays the exit notification;
//! destroying the handle stops the readers.
//!
//! Long-lived tools that leave daemons or runtime processes behind, such as
//! the App Engine dev server, should run with [`OutputRouting::Inherited`].
//! Nothing is captured then, so the exit report follows the child alone.

use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{DeferredError, ListenerEvent, Result, SdkrunError};
use crate::exec::command::Command;
use crate::exec::handle::{ProcessHandle, ProcessTracker, TrackingGuard};
use crate::exec::line_reader::{DrainReport, LineReader};
use crate::exec::listener::{ExitListener, LineListener, Listeners, StartListener, dispatch};
use crate::types::{Channel, ExecutionMode, OutputRouting};

/// Exit code reported when the OS gives none (killed by a signal).
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Runs commands with a fixed mode, routing and set of listeners.
///
/// A runner can be reused; every call to [`run`](Self::run) is an
/// independent execution with its own handle, readers and exit report.
#[derive(Clone)]
pub struct ProcessRunner {
    mode: ExecutionMode,
    routing: OutputRouting,
    start: Arc<[Arc<dyn StartListener>]>,
    stdout: Arc<[Arc<dyn LineListener>]>,
    stderr: Arc<[Arc<dyn LineListener>]>,
    exit: Arc<[Arc<dyn ExitListener>]>,
    tracker: Option<ProcessTracker>,
}

impl ProcessRunner {
    /// Validate the listener/routing combination and build a runner.
    ///
    /// - `Inherited` routing with any output listener is rejected: output
    ///   cannot go to the parent's streams and to listeners at once.
    /// - `Captured` routing needs at least one output listener.
    pub fn new(mode: ExecutionMode, routing: OutputRouting, listeners: Listeners) -> Result<Self> {
        match routing {
            OutputRouting::Inherited if listeners.has_output_listeners() => {
                return Err(SdkrunError::InvalidSetup(
                    "inherited output routing does not accept output listeners".to_string(),
                ));
            }
            OutputRouting::Captured if !listeners.has_output_listeners() => {
                return Err(SdkrunError::InvalidSetup(
                    "captured output routing needs at least one stdout or stderr listener"
                        .to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            mode,
            routing,
            start: Arc::from(listeners.start),
            stdout: Arc::from(listeners.stdout),
            stderr: Arc::from(listeners.stderr),
            exit: Arc::from(listeners.exit),
            tracker: None,
        })
    }

    /// Register every spawned child with `tracker` until it terminates.
    #[must_use]
    pub fn with_tracker(mut self, tracker: ProcessTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn routing(&self) -> OutputRouting {
        self.routing
    }

    /// Spawn `command` and drive it according to the runner's mode.
    ///
    /// Spawn failures are returned before any listener is invoked. In
    /// synchronous mode this returns once the child has exited, its output
    /// is drained and the exit listeners have run; in asynchronous mode it
    /// returns right after spawn.
    pub async fn run(&self, command: &Command) -> Result<Execution> {
        command.validate()?;

        let program = command.program_display();
        let (stdin, stdout, stderr) = self.stdio();
        let mut cmd = command.to_tokio_command(stdin, stdout, stderr);

        info!(
            command = %command.display_line(),
            cwd = ?command.working_dir(),
            mode = ?self.mode,
            routing = ?self.routing,
            "spawning process"
        );

        let mut child = cmd.spawn().map_err(|source| SdkrunError::Spawn {
            program: program.clone(),
            source,
        })?;

        let handle = ProcessHandle::new(child.id(), program.as_str());
        let guard = self.tracker.as_ref().map(|t| t.track(handle.clone()));

        // Readers are running before anyone hears about the start.
        let stdout_reader = match child.stdout.take() {
            Some(pipe) => Some(self.reader(Channel::Stdout, &handle)?.spawn(pipe)),
            None => None,
        };
        let stderr_reader = match child.stderr.take() {
            Some(pipe) => Some(self.reader(Channel::Stderr, &handle)?.spawn(pipe)),
            None => None,
        };

        let start_failures = dispatch(&self.start[..], ListenerEvent::Start, |listener| {
            listener.on_start(&handle)
        });

        let readers = Readers {
            stdout: stdout_reader,
            stderr: stderr_reader,
        };
        let supervisor = supervise(child, handle.clone(), readers, self.exit.clone(), guard);
        let outcome = match self.mode {
            ExecutionMode::Synchronous => OutcomeState::Done(supervisor.await),
            ExecutionMode::Asynchronous => OutcomeState::Pending(tokio::spawn(supervisor)),
        };

        Ok(Execution {
            handle,
            outcome,
            start_failures,
        })
    }

    fn stdio(&self) -> (Stdio, Stdio, Stdio) {
        match self.routing {
            OutputRouting::Inherited => (Stdio::inherit(), Stdio::inherit(), Stdio::inherit()),
            OutputRouting::Captured => (
                Stdio::null(),
                piped_if(!self.stdout.is_empty()),
                piped_if(!self.stderr.is_empty()),
            ),
        }
    }

    fn reader(&self, channel: Channel, handle: &ProcessHandle) -> Result<LineReader> {
        let listeners = match channel {
            Channel::Stdout => self.stdout.clone(),
            Channel::Stderr => self.stderr.clone(),
        };
        LineReader::new(channel, listeners, handle.cancellation().clone())
    }
}

impl std::fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("mode", &self.mode)
            .field("routing", &self.routing)
            .field("start_listeners", &self.start.len())
            .field("stdout_listeners", &self.stdout.len())
            .field("stderr_listeners", &self.stderr.len())
            .field("exit_listeners", &self.exit.len())
            .field("tracked", &self.tracker.is_some())
            .finish()
    }
}

fn piped_if(has_listeners: bool) -> Stdio {
    if has_listeners {
        Stdio::piped()
    } else {
        Stdio::null()
    }
}

struct Readers {
    stdout: Option<JoinHandle<DrainReport>>,
    stderr: Option<JoinHandle<DrainReport>>,
}

/// Terminal state of one execution, produced exactly once.
#[derive(Debug)]
struct Outcome {
    code: i32,
    /// The child was killed through its handle.
    destroyed: bool,
    stdout: Option<DrainReport>,
    stderr: Option<DrainReport>,
    /// Wait, reader and exit-listener failures, in collection order.
    failures: Vec<DeferredError>,
}

/// Wait for the child (or for cancellation), drain, then notify exit listeners.
async fn supervise(
    mut child: Child,
    handle: ProcessHandle,
    readers: Readers,
    exit_listeners: Arc<[Arc<dyn ExitListener>]>,
    guard: Option<TrackingGuard>,
) -> Outcome {
    let mut failures = Vec::new();
    let mut destroyed = false;

    let status = tokio::select! {
        status = child.wait() => status,
        _ = handle.cancellation().cancelled() => {
            destroyed = true;
            if let Err(e) = child.kill().await {
                warn!(
                    program = %handle.program(),
                    pid = ?handle.pid(),
                    error = %e,
                    "failed to kill child process on cancellation"
                );
            }
            child.wait().await
        }
    };

    let code = match status {
        Ok(status) => status.code().unwrap_or(UNKNOWN_EXIT_CODE),
        Err(e) => {
            warn!(program = %handle.program(), error = %e, "waiting for process failed");
            failures.push(DeferredError::Wait {
                message: e.to_string(),
            });
            UNKNOWN_EXIT_CODE
        }
    };

    let stdout = join_reader(readers.stdout, "stdout reader", &mut failures).await;
    let stderr = join_reader(readers.stderr, "stderr reader", &mut failures).await;

    // Terminated and drained: no longer a candidate for teardown.
    drop(guard);

    info!(
        program = %handle.program(),
        pid = ?handle.pid(),
        exit_code = code,
        destroyed,
        "process exited"
    );

    failures.extend(dispatch(&exit_listeners[..], ListenerEvent::Exit, |listener| {
        listener.on_exit(code)
    }));

    Outcome {
        code,
        destroyed,
        stdout,
        stderr,
        failures,
    }
}

async fn join_reader(
    task: Option<JoinHandle<DrainReport>>,
    name: &'static str,
    failures: &mut Vec<DeferredError>,
) -> Option<DrainReport> {
    match task?.await {
        Ok(mut report) => {
            failures.append(&mut report.failures);
            Some(report)
        }
        Err(e) => {
            failures.push(DeferredError::Join {
                task: name,
                message: e.to_string(),
            });
            None
        }
    }
}

#[derive(Debug)]
enum OutcomeState {
    Done(Outcome),
    Pending(JoinHandle<Outcome>),
}

/// A spawned command. In synchronous mode the exit is already known.
#[derive(Debug)]
pub struct Execution {
    handle: ProcessHandle,
    outcome: OutcomeState,
    start_failures: Vec<DeferredError>,
}

impl Execution {
    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    /// Kill the child. Shorthand for `handle().destroy()`.
    pub fn destroy(&self) {
        self.handle.destroy();
    }

    /// Exit code, if the execution has already been supervised to the end.
    pub fn exit_code(&self) -> Option<i32> {
        match &self.outcome {
            OutcomeState::Done(outcome) => Some(outcome.code),
            OutcomeState::Pending(_) => None,
        }
    }

    /// Wait until the child has exited, its output is drained and the exit
    /// listeners have run.
    pub async fn wait(self) -> Completion {
        let mut deferred = self.start_failures;

        let outcome = match self.outcome {
            OutcomeState::Done(outcome) => outcome,
            OutcomeState::Pending(task) => match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    deferred.push(DeferredError::Join {
                        task: "exit waiter",
                        message: e.to_string(),
                    });
                    Outcome {
                        code: UNKNOWN_EXIT_CODE,
                        destroyed: false,
                        stdout: None,
                        stderr: None,
                        failures: Vec::new(),
                    }
                }
            },
        };
        deferred.extend(outcome.failures);

        debug!(
            program = %self.handle.program(),
            exit_code = outcome.code,
            deferred = deferred.len(),
            "execution complete"
        );

        Completion {
            exit_code: outcome.code,
            destroyed: outcome.destroyed,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            deferred,
        }
    }
}

/// Exit code plus everything the output readers observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub exit_code: i32,
    pub destroyed: bool,
    /// `None` when the channel was not captured.
    pub stdout: Option<DrainReport>,
    pub stderr: Option<DrainReport>,
    /// Secondary failures, in the order they were collected.
    pub deferred: Vec<DeferredError>,
}

impl Completion {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The exit code, unless secondary failures were collected.
    pub fn into_result(self) -> Result<i32> {
        if self.deferred.is_empty() {
            Ok(self.exit_code)
        } else {
            Err(SdkrunError::Deferred(self.deferred))
        }
    }
}
