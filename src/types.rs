use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Whether `run` blocks until the child exits.
///
/// - `Synchronous`: the caller is suspended until the process terminates and
///   every exit listener has been notified.
/// - `Asynchronous`: `run` returns right after spawn; a background task waits
///   for termination and notifies the exit listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ExecutionMode {
    #[serde(rename = "sync")]
    Synchronous,
    #[serde(rename = "async")]
    Asynchronous,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Synchronous
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sync" | "synchronous" => Ok(ExecutionMode::Synchronous),
            "async" | "asynchronous" => Ok(ExecutionMode::Asynchronous),
            other => Err(format!(
                "invalid execution mode: {other} (expected \"sync\" or \"async\")"
            )),
        }
    }
}

/// Where the child's stdout/stderr go.
///
/// - `Captured`: output is piped, split into lines and handed to listeners.
/// - `Inherited`: the child writes straight to our own stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputRouting {
    Captured,
    Inherited,
}

impl Default for OutputRouting {
    fn default() -> Self {
        OutputRouting::Captured
    }
}

impl FromStr for OutputRouting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "captured" => Ok(OutputRouting::Captured),
            "inherited" => Ok(OutputRouting::Inherited),
            other => Err(format!(
                "invalid output routing: {other} (expected \"captured\" or \"inherited\")"
            )),
        }
    }
}

/// One of the two output streams of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Stdout,
    Stderr,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Stdout => f.write_str("stdout"),
            Channel::Stderr => f.write_str("stderr"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_mode_parses_short_and_long_names() {
        assert_eq!("sync".parse(), Ok(ExecutionMode::Synchronous));
        assert_eq!(" Async ".parse(), Ok(ExecutionMode::Asynchronous));
        assert!("later".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn output_routing_rejects_unknown_values() {
        assert_eq!("inherited".parse(), Ok(OutputRouting::Inherited));
        let err = "piped".parse::<OutputRouting>().unwrap_err();
        assert!(err.contains("piped"));
    }
}
