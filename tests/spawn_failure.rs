// tests/spawn_failure.rs

mod common;
use crate::common::{RecordingListener, init_tracing};

use std::sync::Arc;

use sdkrun::errors::SdkrunError;
use sdkrun::exec::{Command, Listeners, ProcessRunner, ProcessTracker};
use sdkrun::types::{ExecutionMode, OutputRouting};

#[tokio::test]
async fn missing_executable_fails_without_invoking_listeners() {
    init_tracing();

    for mode in [ExecutionMode::Synchronous, ExecutionMode::Asynchronous] {
        let recorder = Arc::new(RecordingListener::new());
        let tracker = ProcessTracker::new();
        let listeners = Listeners::new()
            .on_start(recorder.clone())
            .on_stdout(recorder.clone())
            .on_stderr(recorder.clone())
            .on_exit(recorder.clone());
        let runner = ProcessRunner::new(mode, OutputRouting::Captured, listeners)
            .unwrap()
            .with_tracker(tracker.clone());

        let command = Command::new("/nonexistent/sdkrun-no-such-binary").arg("--version");
        let err = runner.run(&command).await.unwrap_err();

        match err {
            SdkrunError::Spawn { program, .. } => {
                assert_eq!(program, "/nonexistent/sdkrun-no-such-binary")
            }
            other => panic!("expected spawn error in {mode:?}, got {other:?}"),
        }
        assert!(recorder.is_empty(), "{mode:?}: listeners must not be invoked");
        assert_eq!(tracker.active(), 0);
    }
}

#[tokio::test]
async fn unresolvable_program_is_an_invalid_command() {
    let err = Command::new("sdkrun-no-such-binary-on-path").resolved().unwrap_err();
    assert!(matches!(err, SdkrunError::InvalidCommand(_)));
}
