// src/exec/command.rs

//! Immutable description of an external program invocation.
//!
//! A [`Command`] is argv (program + arguments), an optional working directory
//! and a set of environment overrides. Arguments are discrete tokens and are
//! handed to the OS as-is; nothing here ever goes through a shell, so
//! metacharacters like `$(...)`, `|` or `;` reach the child literally.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command as TokioCommand;

use crate::errors::{Result, SdkrunError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: BTreeMap<OsString, OsString>,
}

impl Command {
    /// Start a command for `program`. Arguments, working directory and
    /// environment are added with the builder methods below.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    /// Build a command from a full argv (`argv[0]` is the program).
    ///
    /// Fails with [`SdkrunError::InvalidCommand`] if `argv` is empty.
    pub fn from_argv<I, S>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut tokens = argv.into_iter().map(Into::into);
        let program = tokens
            .next()
            .ok_or_else(|| SdkrunError::InvalidCommand("argv must not be empty".to_string()))?;
        Ok(Self::new(program).args(tokens))
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Override one environment variable. Overrides are merged over the
    /// inherited environment; they never replace it.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        for (key, value) in envs {
            self.env.insert(key.into(), value.into());
        }
        self
    }

    /// Replace the program with its absolute path as found on `PATH`.
    ///
    /// Programs that already contain a path separator are resolved relative
    /// to the current directory.
    pub fn resolved(mut self) -> Result<Self> {
        let path = which::which(&self.program).map_err(|err| {
            SdkrunError::InvalidCommand(format!(
                "cannot resolve executable '{}': {err}",
                self.program.to_string_lossy()
            ))
        })?;
        self.program = path.into_os_string();
        Ok(self)
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn env_overrides(&self) -> &BTreeMap<OsString, OsString> {
        &self.env
    }

    /// Full argv, program first.
    pub fn argv(&self) -> impl Iterator<Item = &OsStr> {
        std::iter::once(self.program.as_os_str()).chain(self.args.iter().map(OsString::as_os_str))
    }

    /// Program name for logs and error messages.
    pub fn program_display(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Space-joined argv for logs. Not meant to be re-parsed.
    pub fn display_line(&self) -> String {
        self.argv()
            .map(|token| token.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.program.is_empty() {
            return Err(SdkrunError::InvalidCommand(
                "program (argv[0]) must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Translate into a `tokio::process::Command` with all three standard
    /// streams set to the given dispositions.
    pub(crate) fn to_tokio_command(&self, stdin: Stdio, stdout: Stdio, stderr: Stdio) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(&self.env);

        cmd.stdin(stdin).stdout(stdout).stderr(stderr).kill_on_drop(true);
        cmd
    }
}
