// src/exec/listener.rs

//! Listener contracts and dispatch.
//!
//! Three independent capabilities, registered zero-or-more times each:
//! - [`StartListener`]: once per execution, after spawn and output wiring.
//! - [`LineListener`]: once per line on the channel it is registered for.
//! - [`ExitListener`]: exactly once per execution, with the exit code.
//!
//! Listeners are owned by the caller and only ever invoked by the engine. A
//! listener registered on both stdout and stderr may be called from two
//! reader tasks at the same time, hence the `Send + Sync` bound.
//!
//! A callback that returns an error (or panics) is isolated: the remaining
//! listeners still run and the failure is reported as a
//! [`DeferredError::Listener`] once the execution result is known.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::errors::{DeferredError, ListenerEvent};
use crate::exec::handle::ProcessHandle;

pub trait StartListener: Send + Sync {
    fn on_start(&self, handle: &ProcessHandle) -> anyhow::Result<()>;
}

pub trait LineListener: Send + Sync {
    /// `line` is UTF-8 with its `\n` terminator removed.
    fn on_line(&self, line: &str) -> anyhow::Result<()>;
}

pub trait ExitListener: Send + Sync {
    fn on_exit(&self, code: i32) -> anyhow::Result<()>;
}

pub struct FnStartListener<F>(F);
pub struct FnLineListener<F>(F);
pub struct FnExitListener<F>(F);

/// Wrap a closure as a [`StartListener`].
pub fn start_listener<F>(f: F) -> Arc<FnStartListener<F>>
where
    F: Fn(&ProcessHandle) -> anyhow::Result<()> + Send + Sync,
{
    Arc::new(FnStartListener(f))
}

/// Wrap a closure as a [`LineListener`].
pub fn line_listener<F>(f: F) -> Arc<FnLineListener<F>>
where
    F: Fn(&str) -> anyhow::Result<()> + Send + Sync,
{
    Arc::new(FnLineListener(f))
}

/// Wrap a closure as an [`ExitListener`].
pub fn exit_listener<F>(f: F) -> Arc<FnExitListener<F>>
where
    F: Fn(i32) -> anyhow::Result<()> + Send + Sync,
{
    Arc::new(FnExitListener(f))
}

impl<F> StartListener for FnStartListener<F>
where
    F: Fn(&ProcessHandle) -> anyhow::Result<()> + Send + Sync,
{
    fn on_start(&self, handle: &ProcessHandle) -> anyhow::Result<()> {
        (self.0)(handle)
    }
}

impl<F> LineListener for FnLineListener<F>
where
    F: Fn(&str) -> anyhow::Result<()> + Send + Sync,
{
    fn on_line(&self, line: &str) -> anyhow::Result<()> {
        (self.0)(line)
    }
}

impl<F> ExitListener for FnExitListener<F>
where
    F: Fn(i32) -> anyhow::Result<()> + Send + Sync,
{
    fn on_exit(&self, code: i32) -> anyhow::Result<()> {
        (self.0)(code)
    }
}

/// Collects every line into one string, each followed by `\n`.
#[derive(Debug, Default)]
pub struct AccumulatingLineListener {
    output: Mutex<String>,
}

impl AccumulatingLineListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> String {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LineListener for AccumulatingLineListener {
    fn on_line(&self, line: &str) -> anyhow::Result<()> {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        output.push_str(line);
        output.push('\n');
        Ok(())
    }
}

/// Ordered listener registrations for one runner.
#[derive(Clone, Default)]
pub struct Listeners {
    pub(crate) start: Vec<Arc<dyn StartListener>>,
    pub(crate) stdout: Vec<Arc<dyn LineListener>>,
    pub(crate) stderr: Vec<Arc<dyn LineListener>>,
    pub(crate) exit: Vec<Arc<dyn ExitListener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_start(mut self, listener: Arc<dyn StartListener>) -> Self {
        self.start.push(listener);
        self
    }

    #[must_use]
    pub fn on_stdout(mut self, listener: Arc<dyn LineListener>) -> Self {
        self.stdout.push(listener);
        self
    }

    #[must_use]
    pub fn on_stderr(mut self, listener: Arc<dyn LineListener>) -> Self {
        self.stderr.push(listener);
        self
    }

    #[must_use]
    pub fn on_exit(mut self, listener: Arc<dyn ExitListener>) -> Self {
        self.exit.push(listener);
        self
    }

    pub fn has_output_listeners(&self) -> bool {
        !self.stdout.is_empty() || !self.stderr.is_empty()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("start", &self.start.len())
            .field("stdout", &self.stdout.len())
            .field("stderr", &self.stderr.len())
            .field("exit", &self.exit.len())
            .finish()
    }
}

/// Invoke `call` on every listener in registration order.
///
/// Errors and panics are turned into [`DeferredError::Listener`]; they never
/// stop the remaining listeners from running.
pub(crate) fn dispatch<T, F>(listeners: &[Arc<T>], event: ListenerEvent, call: F) -> Vec<DeferredError>
where
    T: ?Sized,
    F: Fn(&T) -> anyhow::Result<()>,
{
    let mut failures = Vec::new();

    for (index, listener) in listeners.iter().enumerate() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(&**listener)));
        let message = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => format!("{err:#}"),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };

        warn!(%event, index, error = %message, "listener failed");
        failures.push(DeferredError::Listener {
            event,
            index,
            message,
        });
    }

    failures
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
