// src/sdk/mod.rs

//! Cloud SDK layout and command wrappers.
//!
//! [`CloudSdk`] knows where the SDK's executables live and turns argument
//! lists into [`Command`]s. Running them is left to a caller-supplied
//! [`ProcessRunner`], which decides mode, routing and listeners.
//!
//! - [`args`] formats typed option values as flag tokens.
//! - [`deploy`] and [`dev_server`] are typed option sets built on [`args`].
//! - [`install`] runs the SDK's own install script.
//!
//! The dev server is long-lived and starts runtime processes that inherit
//! its output pipes. Run it with [`OutputRouting::Inherited`] so its exit is
//! reported when it exits, not when the last of those processes closes the
//! pipes.
//!
//! [`OutputRouting::Inherited`]: crate::types::OutputRouting::Inherited

pub mod args;
pub mod deploy;
pub mod dev_server;
pub mod install;

use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{Result, SdkrunError};
use crate::exec::{Command, Execution, ProcessRunner};
use crate::sdk::deploy::DeployConfiguration;
use crate::sdk::dev_server::DevServerConfiguration;

#[cfg(windows)]
const GCLOUD: &str = "bin/gcloud.cmd";
#[cfg(not(windows))]
const GCLOUD: &str = "bin/gcloud";

const DEV_APPSERVER_PY: &str = "bin/dev_appserver.py";

#[derive(Debug, Clone)]
pub struct CloudSdk {
    root: PathBuf,
    env: BTreeMap<String, String>,
}

impl CloudSdk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            env: BTreeMap::new(),
        }
    }

    /// Locate an installed SDK.
    ///
    /// The `gcloud` found on `PATH` wins (symlinks followed, so a `gcloud`
    /// linked into `/usr/bin` still resolves to the real SDK). Otherwise the
    /// first existing directory from [`candidate_roots`] is used.
    pub fn discover() -> Result<Self> {
        let path_env = env::var_os("PATH");
        let candidates = candidate_roots(
            path_env.as_deref(),
            |name| env::var_os(name),
            dirs::home_dir(),
        );

        let root = gcloud_on_path()
            .or_else(|| first_existing(&candidates))
            .ok_or_else(|| {
                SdkrunError::SdkError(format!(
                    "no Cloud SDK found on PATH or in {} known locations",
                    candidates.len()
                ))
            })?;

        info!(sdk_root = %root.display(), "discovered Cloud SDK");
        Ok(Self::new(root))
    }

    /// Environment overrides applied to every command built by this SDK.
    #[must_use]
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn gcloud_path(&self) -> PathBuf {
        self.root.join(GCLOUD)
    }

    pub fn dev_appserver_path(&self) -> PathBuf {
        self.root.join(DEV_APPSERVER_PY)
    }

    /// Check that the root is a directory holding `gcloud` and
    /// `dev_appserver.py`.
    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(SdkrunError::SdkError(format!(
                "SDK directory '{}' is not valid",
                self.root.display()
            )));
        }
        let gcloud = self.gcloud_path();
        if !gcloud.is_file() {
            return Err(SdkrunError::SdkError(format!(
                "gcloud path '{}' is not valid",
                gcloud.display()
            )));
        }
        let dev_appserver = self.dev_appserver_path();
        if !dev_appserver.is_file() {
            return Err(SdkrunError::SdkError(format!(
                "dev_appserver.py path '{}' is not valid",
                dev_appserver.display()
            )));
        }
        Ok(())
    }

    /// `gcloud app <args>`.
    pub fn app_command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Command::new(self.gcloud_path())
            .arg("app")
            .args(args)
            .envs(&self.env)
    }

    /// `dev_appserver.py <args>`.
    pub fn dev_appserver_command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Command::new(self.dev_appserver_path())
            .args(args)
            .envs(&self.env)
    }

    /// `gcloud app deploy ...` for `config`.
    pub fn deploy_command(&self, config: &DeployConfiguration) -> Command {
        self.app_command(config.to_args())
    }

    /// `dev_appserver.py ...` for `config`, followed by `extra` verbatim.
    pub fn dev_server_command(&self, config: &DevServerConfiguration, extra: &[String]) -> Command {
        self.dev_appserver_command(config.to_args().into_iter().chain(extra.iter().cloned()))
    }

    pub async fn run_app_command(&self, runner: &ProcessRunner, args: Vec<String>) -> Result<Execution> {
        self.submit(runner, self.app_command(args)).await
    }

    pub async fn deploy(
        &self,
        runner: &ProcessRunner,
        config: &DeployConfiguration,
    ) -> Result<Execution> {
        self.submit(runner, self.deploy_command(config)).await
    }

    pub async fn run_dev_server(
        &self,
        runner: &ProcessRunner,
        config: &DevServerConfiguration,
        extra: &[String],
    ) -> Result<Execution> {
        self.submit(runner, self.dev_server_command(config, extra)).await
    }

    async fn submit(&self, runner: &ProcessRunner, command: Command) -> Result<Execution> {
        info!(command = %command.display_line(), "submitting command");
        runner.run(&command).await
    }
}

/// SDK root of the `gcloud` on `PATH`, if it lives in an SDK `bin` directory.
fn gcloud_on_path() -> Option<PathBuf> {
    let gcloud = which::which("gcloud").ok()?;
    let gcloud = gcloud.canonicalize().unwrap_or(gcloud);
    let bin = gcloud.parent()?;
    if bin.file_name()? != "bin" {
        debug!(gcloud = %gcloud.display(), "gcloud on PATH is not inside an SDK bin directory");
        return None;
    }
    bin.parent().map(Path::to_path_buf)
}

/// Well-known SDK locations, in lookup order.
///
/// 1. `PATH` entries ending in `google-cloud-sdk/bin`
/// 2. `GOOGLE_CLOUD_SDK_HOME`
/// 3. per-platform install locations
///
/// `var` reads an environment variable; `home` is the user's home directory.
pub fn candidate_roots<F>(path_env: Option<&OsStr>, var: F, home: Option<PathBuf>) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    let mut candidates = Vec::new();

    if let Some(path_env) = path_env {
        for dir in env::split_paths(path_env) {
            if dir.ends_with(Path::new("google-cloud-sdk").join("bin")) {
                if let Some(root) = dir.parent() {
                    candidates.push(root.to_path_buf());
                }
            }
        }
    }

    if let Some(home_var) = var("GOOGLE_CLOUD_SDK_HOME").filter(|v| !v.is_empty()) {
        candidates.push(PathBuf::from(home_var));
    }

    if cfg!(windows) {
        let suffix = Path::new("Google").join("Cloud SDK").join("google-cloud-sdk");
        if let Some(local) = var("LOCALAPPDATA") {
            candidates.push(PathBuf::from(local).join(&suffix));
        }
        if let Some(program_files) = var("ProgramFiles").or_else(|| var("ProgramFiles(x86)")) {
            candidates.push(PathBuf::from(program_files).join(&suffix));
        }
    } else {
        if let Some(home) = home {
            candidates.push(home.join("google-cloud-sdk"));
        }
        for fixed in UNIX_INSTALL_ROOTS {
            candidates.push(PathBuf::from(fixed));
        }
    }

    candidates
}

const UNIX_INSTALL_ROOTS: [&str; 3] = [
    "/usr/lib/google-cloud-sdk",
    "/google/google-cloud-sdk",
    "/usr/local/share/google/google-cloud-sdk",
];

/// First candidate that exists as a directory.
pub fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_dir()).cloned()
}
