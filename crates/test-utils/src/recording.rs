use std::sync::Mutex;
use std::time::Instant;

use sdkrun::exec::{ExitListener, LineListener, ProcessHandle, StartListener};

/// What a [`RecordingListener`] observed, with arrival times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Start { pid: Option<u32> },
    Line(String),
    Exit(i32),
}

/// Listener that records every callback it receives.
///
/// Implements all three listener traits, so one instance can watch a whole
/// execution. Register it once per channel to keep channels apart.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<(Instant, Recorded)>>,
    fail_with: Option<String>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records like [`new`](Self::new), then returns an error from every
    /// callback.
    pub fn failing(message: &str) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    fn record(&self, event: Recorded) -> anyhow::Result<()> {
        self.events.lock().unwrap().push((Instant::now(), event));
        match &self.fail_with {
            Some(message) => Err(anyhow::anyhow!("{message}")),
            None => Ok(()),
        }
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, e)| match e {
                Recorded::Line(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn exit_codes(&self) -> Vec<i32> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, e)| match e {
                Recorded::Exit(code) => Some(*code),
                _ => None,
            })
            .collect()
    }

    pub fn starts(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, e)| matches!(e, Recorded::Start { .. }))
            .count()
    }

    /// When the first exit notification arrived.
    pub fn exit_time(&self) -> Option<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(_, e)| matches!(e, Recorded::Exit(_)))
            .map(|(at, _)| *at)
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl StartListener for RecordingListener {
    fn on_start(&self, handle: &ProcessHandle) -> anyhow::Result<()> {
        self.record(Recorded::Start { pid: handle.pid() })
    }
}

impl LineListener for RecordingListener {
    fn on_line(&self, line: &str) -> anyhow::Result<()> {
        self.record(Recorded::Line(line.to_string()))
    }
}

impl ExitListener for RecordingListener {
    fn on_exit(&self, code: i32) -> anyhow::Result<()> {
        self.record(Recorded::Exit(code))
    }
}
