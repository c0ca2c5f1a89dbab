// src/errors.rs

//! Crate-wide error types.
//!
//! [`SdkrunError`] is what callers see. [`DeferredError`] describes failures
//! that happen *around* an execution (a listener returning an error, a pipe
//! read failing, the exit wait failing). Those never abort the execution
//! itself; they are collected and handed back after the exit code is known.

use thiserror::Error;

use crate::types::Channel;

#[derive(Error, Debug)]
pub enum SdkrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid runner setup: {0}")]
    InvalidSetup(String),

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{program} exited with non-zero exit code: {code}{}{}",
        stderr_suffix(.stderr),
        deferred_suffix(.deferred)
    )]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
        /// Secondary failures collected during the failed run.
        deferred: Vec<DeferredError>,
    },

    #[error("{} failure(s) after execution: {}", .0.len(), summarize(.0))]
    Deferred(Vec<DeferredError>),

    #[error("Cloud SDK error: {0}")]
    SdkError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Which listener surface a callback belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerEvent {
    Start,
    Stdout,
    Stderr,
    Exit,
}

impl std::fmt::Display for ListenerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ListenerEvent::Start => "start",
            ListenerEvent::Stdout => "stdout",
            ListenerEvent::Stderr => "stderr",
            ListenerEvent::Exit => "exit",
        };
        f.write_str(name)
    }
}

impl From<Channel> for ListenerEvent {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Stdout => ListenerEvent::Stdout,
            Channel::Stderr => ListenerEvent::Stderr,
        }
    }
}

/// A secondary failure collected while an execution was in flight.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeferredError {
    #[error("{event} listener #{index} failed: {message}")]
    Listener {
        event: ListenerEvent,
        index: usize,
        message: String,
    },

    #[error("reading {channel} failed: {message}")]
    Read { channel: Channel, message: String },

    #[error("waiting for process exit failed: {message}")]
    Wait { message: String },

    #[error("{task} did not complete: {message}")]
    Join { task: &'static str, message: String },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!("\nstderr:\n{}", stderr.trim_end())
    }
}

fn deferred_suffix(deferred: &[DeferredError]) -> String {
    if deferred.is_empty() {
        String::new()
    } else {
        format!("\nalso: {}", summarize(deferred))
    }
}

fn summarize(errors: &[DeferredError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, SdkrunError>;
