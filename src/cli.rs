// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::sdk::deploy::DeployConfiguration;
use crate::sdk::dev_server::DevServerConfiguration;

/// Command-line arguments for `sdkrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sdkrun",
    version,
    about = "Run Cloud SDK toolchain commands with streamed output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Sdkrun.toml` in the current working directory; a missing
    /// default file is not an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SDKRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run an arbitrary program and stream its output.
    Exec(ExecArgs),

    /// Run `gcloud app <ARGS>` from the configured SDK.
    App {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Deploy with `gcloud app deploy` from the configured SDK.
    Deploy(DeployArgs),

    /// Run the local development server from the configured SDK.
    ///
    /// Output is always inherited: the server is long-lived and its runtime
    /// processes share its output streams.
    DevServer(DevServerArgs),

    /// Run the SDK's install script non-interactively.
    Install {
        /// Opt in to SDK usage reporting (overrides the config file).
        #[arg(long)]
        usage_reporting: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ExecArgs {
    /// Return right after spawn and report the exit code when it arrives.
    #[arg(long = "async")]
    pub asynchronous: bool,

    /// Connect the child directly to our stdout/stderr.
    #[arg(long)]
    pub inherit: bool,

    /// Working directory for the child.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Environment override, repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Whole command as one string, split on unquoted whitespace.
    #[arg(long, value_name = "STR", conflicts_with = "argv")]
    pub line: Option<String>,

    /// Program and arguments.
    #[arg(last = true, value_name = "ARGV")]
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct DeployArgs {
    /// `app.yaml` files or other deployables.
    #[arg(required = true, value_name = "DEPLOYABLE")]
    pub deployables: Vec<PathBuf>,

    #[arg(long)]
    pub version: Option<String>,

    #[arg(long)]
    pub project: Option<String>,

    #[arg(long)]
    pub bucket: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,

    #[arg(long, conflicts_with = "no_promote")]
    pub promote: bool,

    #[arg(long)]
    pub no_promote: bool,

    #[arg(long, conflicts_with = "no_stop_previous_version")]
    pub stop_previous_version: bool,

    #[arg(long)]
    pub no_stop_previous_version: bool,
}

impl DeployArgs {
    pub fn to_configuration(&self) -> DeployConfiguration {
        DeployConfiguration {
            version: self.version.clone(),
            project: self.project.clone(),
            bucket: self.bucket.clone(),
            image_url: self.image_url.clone(),
            promote: either(self.promote, self.no_promote),
            stop_previous_version: either(
                self.stop_previous_version,
                self.no_stop_previous_version,
            ),
            ..DeployConfiguration::new(self.deployables.iter().cloned())
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DevServerArgs {
    /// `app.yaml` files (or service directories) to serve.
    #[arg(required = true, value_name = "APP_YAML")]
    pub app_yamls: Vec<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<i64>,

    #[arg(long)]
    pub admin_port: Option<i64>,

    /// JVM flag for Java runtimes, repeatable.
    #[arg(long = "jvm-flag", value_name = "FLAG", allow_hyphen_values = true)]
    pub jvm_flags: Vec<String>,

    /// Extra `dev_appserver.py` arguments, passed through verbatim.
    #[arg(last = true, value_name = "EXTRA")]
    pub extra: Vec<String>,
}

impl DevServerArgs {
    pub fn to_configuration(&self) -> DevServerConfiguration {
        DevServerConfiguration {
            host: self.host.clone(),
            port: self.port,
            admin_port: self.admin_port,
            jvm_flags: self.jvm_flags.clone(),
            ..DevServerConfiguration::new(self.app_yamls.iter().cloned())
        }
    }
}

/// `--x` / `--no-x` pair to a tri-state.
fn either(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
