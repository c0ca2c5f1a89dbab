use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sdkrun::errors::{Result, SdkrunError};
use sdkrun::exec::{Command, CommandExecutor, LineListener};

/// A fake executor that:
/// - records every command it was asked to run
/// - replays canned stdout/stderr lines to the listeners
/// - finishes with the configured exit code (non-zero becomes `NonZeroExit`).
#[derive(Debug, Default)]
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<Command>>>,
    stdout: Vec<String>,
    stderr: Vec<String>,
    exit_code: i32,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stdout(mut self, lines: &[&str]) -> Self {
        self.stdout = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_stderr(mut self, lines: &[&str]) -> Self {
        self.stderr = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn executed(&self) -> Vec<Command> {
        self.executed.lock().unwrap().clone()
    }
}

impl CommandExecutor for FakeExecutor {
    fn execute<'a>(
        &'a self,
        command: &'a Command,
        stdout: Arc<dyn LineListener>,
        stderr: Arc<dyn LineListener>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(command.clone());

            for line in &self.stdout {
                stdout.on_line(line)?;
            }
            for line in &self.stderr {
                stderr.on_line(line)?;
            }

            if self.exit_code != 0 {
                return Err(SdkrunError::NonZeroExit {
                    program: command.program_display(),
                    code: self.exit_code,
                    stderr: self.stderr.join("\n"),
                    deferred: Vec::new(),
                });
            }
            Ok(())
        })
    }
}
