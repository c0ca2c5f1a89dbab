// tests/runner_sync.rs
#![cfg(unix)]

mod common;
use crate::common::{RecordingListener, init_tracing, sh, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use sdkrun::exec::{
    Command, Listeners, ProcessRunner, ProcessTracker, UNKNOWN_EXIT_CODE, exit_listener,
};
use sdkrun::types::{ExecutionMode, OutputRouting};

type TestResult = Result<(), Box<dyn Error>>;

fn captured(
    stdout: &Arc<RecordingListener>,
    stderr: &Arc<RecordingListener>,
    lifecycle: &Arc<RecordingListener>,
) -> ProcessRunner {
    let listeners = Listeners::new()
        .on_start(lifecycle.clone())
        .on_stdout(stdout.clone())
        .on_stderr(stderr.clone())
        .on_exit(lifecycle.clone());
    ProcessRunner::new(ExecutionMode::Synchronous, OutputRouting::Captured, listeners).unwrap()
}

#[tokio::test]
async fn echo_delivers_one_line_then_exit_zero() -> TestResult {
    init_tracing();
    let stdout = Arc::new(RecordingListener::new());
    let stderr = Arc::new(RecordingListener::new());
    let lifecycle = Arc::new(RecordingListener::new());
    let runner = captured(&stdout, &stderr, &lifecycle);

    let execution = with_timeout(runner.run(&Command::from_argv(["echo", "hello"])?)).await?;
    assert_eq!(execution.exit_code(), Some(0));
    assert_eq!(lifecycle.exit_codes(), vec![0]);

    let completion = with_timeout(execution.wait()).await;
    assert!(completion.success());
    assert!(completion.deferred.is_empty());
    assert_eq!(stdout.lines(), vec!["hello"]);
    assert!(stderr.is_empty());
    assert_eq!(lifecycle.starts(), 1);
    Ok(())
}

#[tokio::test]
async fn large_output_is_fully_delivered_before_exit() -> TestResult {
    init_tracing();
    let stdout = Arc::new(RecordingListener::new());
    let stderr = Arc::new(RecordingListener::new());
    let lifecycle = Arc::new(RecordingListener::new());

    let lines_at_exit = Arc::new(AtomicUsize::new(usize::MAX));
    let exit_snapshot = {
        let stdout = stdout.clone();
        let lines_at_exit = lines_at_exit.clone();
        exit_listener(move |_| {
            lines_at_exit.store(stdout.lines().len(), Ordering::SeqCst);
            Ok(())
        })
    };
    let listeners = Listeners::new()
        .on_stdout(stdout.clone())
        .on_stderr(stderr.clone())
        .on_exit(lifecycle.clone())
        .on_exit(exit_snapshot);
    let runner =
        ProcessRunner::new(ExecutionMode::Synchronous, OutputRouting::Captured, listeners)?;

    let script = "i=1; while [ $i -le 10000 ]; do echo line$i; i=$((i+1)); done; exit 1";
    let execution = with_timeout(runner.run(&Command::from_argv(sh(script))?)).await?;
    let completion = with_timeout(execution.wait()).await;

    assert_eq!(completion.exit_code, 1);
    assert_eq!(lifecycle.exit_codes(), vec![1]);
    assert_eq!(lines_at_exit.load(Ordering::SeqCst), 10_000);

    let lines = stdout.lines();
    assert_eq!(lines.len(), 10_000);
    assert_eq!(lines.first().map(String::as_str), Some("line1"));
    assert_eq!(lines.last().map(String::as_str), Some("line10000"));
    assert!(lines.iter().enumerate().all(|(i, l)| *l == format!("line{}", i + 1)));
    assert_eq!(completion.stdout.map(|r| r.lines), Some(10_000));
    Ok(())
}

#[tokio::test]
async fn stdout_and_stderr_are_delivered_separately() -> TestResult {
    init_tracing();
    let stdout = Arc::new(RecordingListener::new());
    let stderr = Arc::new(RecordingListener::new());
    let lifecycle = Arc::new(RecordingListener::new());
    let runner = captured(&stdout, &stderr, &lifecycle);

    let script = "echo out1; echo err1 >&2; echo out2; echo err2 >&2";
    let execution = runner.run(&Command::from_argv(sh(script))?).await?;
    with_timeout(execution.wait()).await;

    assert_eq!(stdout.lines(), vec!["out1", "out2"]);
    assert_eq!(stderr.lines(), vec!["err1", "err2"]);
    Ok(())
}

#[tokio::test]
async fn unterminated_last_line_and_carriage_returns_are_kept() -> TestResult {
    init_tracing();
    let stdout = Arc::new(RecordingListener::new());
    let stderr = Arc::new(RecordingListener::new());
    let lifecycle = Arc::new(RecordingListener::new());
    let runner = captured(&stdout, &stderr, &lifecycle);

    let execution = runner
        .run(&Command::from_argv(sh("printf 'a\\r\\n\\nb'"))?)
        .await?;
    with_timeout(execution.wait()).await;

    assert_eq!(stdout.lines(), vec!["a\r", "", "b"]);
    Ok(())
}

#[tokio::test]
async fn env_overrides_merge_over_inherited_environment() -> TestResult {
    init_tracing();
    let stdout = Arc::new(RecordingListener::new());
    let stderr = Arc::new(RecordingListener::new());
    let lifecycle = Arc::new(RecordingListener::new());
    let runner = captured(&stdout, &stderr, &lifecycle);

    // PATH is inherited; SDKRUN_TEST_VAR is added.
    let command = Command::from_argv(sh("echo \"$SDKRUN_TEST_VAR\"; [ -n \"$PATH\" ] && echo has-path"))?
        .env("SDKRUN_TEST_VAR", "overridden");
    let execution = runner.run(&command).await?;
    with_timeout(execution.wait()).await;

    assert_eq!(stdout.lines(), vec!["overridden", "has-path"]);
    Ok(())
}

#[tokio::test]
async fn working_directory_is_applied() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let stdout = Arc::new(RecordingListener::new());
    let stderr = Arc::new(RecordingListener::new());
    let lifecycle = Arc::new(RecordingListener::new());
    let runner = captured(&stdout, &stderr, &lifecycle);

    let command = Command::from_argv(["pwd"])?.current_dir(dir.path());
    let execution = runner.run(&command).await?;
    with_timeout(execution.wait()).await;

    let expected = dir.path().canonicalize()?;
    let reported = std::path::PathBuf::from(&stdout.lines()[0]).canonicalize()?;
    assert_eq!(reported, expected);
    Ok(())
}

#[tokio::test]
async fn inherited_routing_still_reports_exit() -> TestResult {
    init_tracing();
    let lifecycle = Arc::new(RecordingListener::new());
    let listeners = Listeners::new()
        .on_start(lifecycle.clone())
        .on_exit(lifecycle.clone());
    let runner =
        ProcessRunner::new(ExecutionMode::Synchronous, OutputRouting::Inherited, listeners)?;

    let execution = runner.run(&Command::from_argv(sh("exit 3"))?).await?;
    let completion = with_timeout(execution.wait()).await;

    assert_eq!(completion.exit_code, 3);
    assert!(completion.stdout.is_none());
    assert!(completion.stderr.is_none());
    assert_eq!(lifecycle.starts(), 1);
    assert_eq!(lifecycle.exit_codes(), vec![3]);
    Ok(())
}

#[tokio::test]
async fn inherited_routing_does_not_wait_for_background_grandchildren() -> TestResult {
    init_tracing();
    let lifecycle = Arc::new(RecordingListener::new());
    let runner = ProcessRunner::new(
        ExecutionMode::Synchronous,
        OutputRouting::Inherited,
        Listeners::new().on_exit(lifecycle.clone()),
    )?;

    let started = Instant::now();
    let execution = with_timeout(runner.run(&Command::from_argv(sh("sleep 5 & exit 0"))?)).await?;

    assert_eq!(execution.exit_code(), Some(0));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(lifecycle.exit_codes(), vec![0]);
    Ok(())
}

#[tokio::test]
async fn reused_runner_does_not_duplicate_deliveries() -> TestResult {
    init_tracing();
    let runner_stdout = Arc::new(RecordingListener::new());
    let stderr = Arc::new(RecordingListener::new());
    let lifecycle = Arc::new(RecordingListener::new());
    let runner = captured(&runner_stdout, &stderr, &lifecycle);

    for _ in 0..2 {
        let execution = runner.run(&Command::from_argv(["echo", "once"])?).await?;
        with_timeout(execution.wait()).await;
    }

    assert_eq!(runner_stdout.lines(), vec!["once", "once"]);
    assert_eq!(lifecycle.exit_codes(), vec![0, 0]);
    assert_eq!(lifecycle.starts(), 2);
    Ok(())
}

#[tokio::test]
async fn failing_listener_does_not_stop_the_others() -> TestResult {
    init_tracing();
    let failing = Arc::new(RecordingListener::failing("boom"));
    let healthy = Arc::new(RecordingListener::new());
    let exit = Arc::new(RecordingListener::new());
    let listeners = Listeners::new()
        .on_stdout(failing.clone())
        .on_stdout(healthy.clone())
        .on_exit(exit.clone());
    let runner =
        ProcessRunner::new(ExecutionMode::Synchronous, OutputRouting::Captured, listeners)?;

    let execution = runner.run(&Command::from_argv(sh("echo a; echo b"))?).await?;
    let completion = with_timeout(execution.wait()).await;

    assert_eq!(failing.lines(), vec!["a", "b"]);
    assert_eq!(healthy.lines(), vec!["a", "b"]);
    assert_eq!(exit.exit_codes(), vec![0]);
    assert_eq!(completion.deferred.len(), 2);
    assert!(completion.into_result().is_err());
    Ok(())
}

#[tokio::test]
async fn both_channels_flooded_at_once_drain_completely() -> TestResult {
    init_tracing();
    let stdout = Arc::new(RecordingListener::new());
    let stderr = Arc::new(RecordingListener::new());
    let lifecycle = Arc::new(RecordingListener::new());
    let runner = captured(&stdout, &stderr, &lifecycle);

    // Interleaved, then a burst on stderr alone that would fill its pipe if
    // only stdout were being read.
    let script = "i=1; while [ $i -le 20000 ]; do echo out$i; echo err$i >&2; i=$((i+1)); done; \
                  yes burst | head -n 50000 >&2; echo tail";
    let execution = with_timeout(runner.run(&Command::from_argv(sh(script))?)).await?;
    let completion = with_timeout(execution.wait()).await;

    assert_eq!(completion.exit_code, 0);
    assert!(completion.deferred.is_empty());

    let out = stdout.lines();
    let err = stderr.lines();
    assert_eq!(out.len(), 20_001);
    assert_eq!(err.len(), 70_000);
    assert_eq!(out[19_999], "out20000");
    assert_eq!(out[20_000], "tail");
    assert_eq!(err[19_999], "err20000");
    assert!(err[20_000..].iter().all(|l| l == "burst"));
    assert_eq!(lifecycle.exit_codes(), vec![0]);
    Ok(())
}

#[tokio::test]
async fn tracker_tears_down_a_blocked_synchronous_run() -> TestResult {
    init_tracing();
    let tracker = ProcessTracker::new();
    let stdout = Arc::new(RecordingListener::new());
    let stderr = Arc::new(RecordingListener::new());
    let lifecycle = Arc::new(RecordingListener::new());
    let runner = captured(&stdout, &stderr, &lifecycle).with_tracker(tracker.clone());

    // Stands in for the application's interrupt handler.
    let teardown = {
        let tracker = tracker.clone();
        tokio::spawn(async move {
            while tracker.active() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            tracker.destroy_all()
        })
    };

    let execution = with_timeout(runner.run(&Command::from_argv(["sleep", "30"])?)).await?;
    assert_eq!(execution.exit_code(), Some(UNKNOWN_EXIT_CODE));
    assert_eq!(teardown.await?, 1);

    let completion = execution.wait().await;
    assert!(completion.destroyed);
    assert_eq!(completion.exit_code, UNKNOWN_EXIT_CODE);
    assert_eq!(lifecycle.exit_codes(), vec![UNKNOWN_EXIT_CODE]);
    assert_eq!(lifecycle.starts(), 1);
    assert_eq!(tracker.active(), 0);
    Ok(())
}
