// src/sdk/install.rs

//! Running the install script shipped inside a Cloud SDK download.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::errors::Result;
use crate::exec::{Command, CommandExecutor, LineListener};

/// The platform-specific way to invoke the bundled install script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallScript {
    /// `<root>/install.sh`
    Unix,
    /// `cmd.exe /c <root>\install.bat`
    Windows,
}

impl InstallScript {
    pub fn for_current_platform() -> Self {
        if cfg!(windows) {
            InstallScript::Windows
        } else {
            InstallScript::Unix
        }
    }

    pub fn command_line(&self, sdk_root: &Path) -> Vec<OsString> {
        match self {
            InstallScript::Unix => vec![sdk_root.join("install.sh").into_os_string()],
            InstallScript::Windows => vec![
                OsString::from("cmd.exe"),
                OsString::from("/c"),
                sdk_root.join("install.bat").into_os_string(),
            ],
        }
    }
}

/// Runs the install script non-interactively through a [`CommandExecutor`].
pub struct Installer<E> {
    sdk_root: PathBuf,
    script: InstallScript,
    usage_reporting: bool,
    executor: E,
    stdout: Arc<dyn LineListener>,
    stderr: Arc<dyn LineListener>,
}

impl<E: CommandExecutor> Installer<E> {
    pub fn new(
        sdk_root: impl Into<PathBuf>,
        script: InstallScript,
        usage_reporting: bool,
        executor: E,
        stdout: Arc<dyn LineListener>,
        stderr: Arc<dyn LineListener>,
    ) -> Self {
        Self {
            sdk_root: sdk_root.into(),
            script,
            usage_reporting,
            executor,
            stdout,
            stderr,
        }
    }

    /// The full command `install` runs.
    pub fn command(&self) -> Result<Command> {
        let command = Command::from_argv(self.script.command_line(&self.sdk_root))?
            .arg("--path-update=false")
            .arg("--command-completion=false")
            .arg("--quiet")
            .arg(format!("--usage-reporting={}", self.usage_reporting))
            .current_dir(&self.sdk_root);
        Ok(command)
    }

    /// Install the SDK. A non-zero exit of the script is an error.
    pub async fn install(&self) -> Result<()> {
        let command = self.command()?;
        info!(sdk_root = %self.sdk_root.display(), "installing Cloud SDK");

        self.executor
            .execute(&command, self.stdout.clone(), self.stderr.clone())
            .await?;

        info!(sdk_root = %self.sdk_root.display(), "Cloud SDK installed");
        Ok(())
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}
