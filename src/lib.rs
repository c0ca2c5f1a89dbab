// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod sdk;
pub mod shell;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::{CliArgs, CliCommand, ExecArgs};
use crate::config::{ConfigFile, default_config_path, load_and_validate, load_or_default};
use crate::exec::{
    Command, Completion, LineListener, Listeners, ProcessExecutor, ProcessRunner, ProcessTracker,
    exit_listener, line_listener, start_listener,
};
use crate::sdk::CloudSdk;
use crate::sdk::install::{InstallScript, Installer};
use crate::types::{ExecutionMode, OutputRouting};

/// High-level entry point used by `main.rs`.
///
/// Loads the config, installs the Ctrl-C teardown and runs the requested
/// subcommand. Returns the exit code the binary should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config '{}'", path.display()))?,
        None => load_or_default(default_config_path())?,
    };

    let tracker = ProcessTracker::new();

    // Ctrl-C → destroy every child still running.
    {
        let tracker = tracker.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let destroyed = tracker.destroy_all();
            warn!(destroyed, "interrupted; destroyed running processes");
        });
    }

    match args.command {
        CliCommand::Exec(exec) => run_exec(&cfg, exec, tracker).await,
        CliCommand::App { args } => {
            let sdk = cloud_sdk(&cfg)?;
            let runner = default_runner(&cfg, tracker)?;
            let execution = sdk.run_app_command(&runner, args).await?;
            finish(execution.wait().await)
        }
        CliCommand::Deploy(deploy) => {
            let sdk = cloud_sdk(&cfg)?;
            let runner = default_runner(&cfg, tracker)?;
            let execution = sdk.deploy(&runner, &deploy.to_configuration()).await?;
            finish(execution.wait().await)
        }
        CliCommand::DevServer(dev) => {
            let sdk = cloud_sdk(&cfg)?;
            let runner = ProcessRunner::new(
                cfg.run.mode,
                OutputRouting::Inherited,
                listeners_for(OutputRouting::Inherited),
            )?
            .with_tracker(tracker);
            let execution = sdk
                .run_dev_server(&runner, &dev.to_configuration(), &dev.extra)
                .await?;
            finish(execution.wait().await)
        }
        CliCommand::Install { usage_reporting } => {
            let root = cfg
                .sdk
                .root
                .clone()
                .context("install needs [sdk] root in the config file")?;
            let installer = Installer::new(
                root,
                InstallScript::for_current_platform(),
                usage_reporting || cfg.sdk.usage_reporting,
                ProcessExecutor::new().with_tracker(tracker),
                print_stdout(),
                print_stderr(),
            );
            installer.install().await?;
            Ok(0)
        }
    }
}

async fn run_exec(cfg: &ConfigFile, exec: ExecArgs, tracker: ProcessTracker) -> Result<i32> {
    let argv = match exec.line {
        Some(line) => shell::split(&line),
        None => exec.argv,
    };
    if argv.is_empty() {
        bail!("nothing to run: pass a command after `--` or use --line");
    }

    let mut command = Command::from_argv(argv)?
        .envs(&cfg.env)
        .envs(exec.env);
    if let Some(dir) = exec.cwd {
        command = command.current_dir(dir);
    }
    let command = command.resolved()?;

    let mode = if exec.asynchronous {
        ExecutionMode::Asynchronous
    } else {
        cfg.run.mode
    };
    let routing = if exec.inherit {
        OutputRouting::Inherited
    } else {
        cfg.run.routing
    };

    let runner = ProcessRunner::new(mode, routing, listeners_for(routing))?.with_tracker(tracker);
    let execution = runner.run(&command).await?;

    if mode == ExecutionMode::Asynchronous {
        info!(pid = ?execution.handle().pid(), "process running in the background");
    }

    finish(execution.wait().await)
}

fn cloud_sdk(cfg: &ConfigFile) -> Result<CloudSdk> {
    let sdk = match &cfg.sdk.root {
        Some(root) => CloudSdk::new(root),
        None => CloudSdk::discover()?,
    };
    sdk.validate()?;
    Ok(sdk.with_env(cfg.env.clone()))
}

fn default_runner(cfg: &ConfigFile, tracker: ProcessTracker) -> Result<ProcessRunner> {
    let runner = ProcessRunner::new(cfg.run.mode, cfg.run.routing, listeners_for(cfg.run.routing))?;
    Ok(runner.with_tracker(tracker))
}

/// Forward captured lines to our own streams; inherited output needs nothing.
fn listeners_for(routing: OutputRouting) -> Listeners {
    let listeners = Listeners::new()
        .on_start(start_listener(|handle| {
            info!(program = %handle.program(), pid = ?handle.pid(), "process started");
            Ok(())
        }))
        .on_exit(exit_listener(|code| {
            info!(exit_code = code, "process exited");
            Ok(())
        }));

    match routing {
        OutputRouting::Captured => listeners.on_stdout(print_stdout()).on_stderr(print_stderr()),
        OutputRouting::Inherited => listeners,
    }
}

fn print_stdout() -> Arc<dyn LineListener> {
    line_listener(|line| {
        println!("{line}");
        Ok(())
    })
}

fn print_stderr() -> Arc<dyn LineListener> {
    line_listener(|line| {
        eprintln!("{line}");
        Ok(())
    })
}

fn finish(completion: Completion) -> Result<i32> {
    Ok(completion.into_result()?)
}
