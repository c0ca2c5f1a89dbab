// tests/installer_fake_executor.rs

mod common;
use crate::common::{FakeExecutor, RecordingListener, init_tracing};

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use sdkrun::errors::SdkrunError;
use sdkrun::sdk::install::{InstallScript, Installer};

fn installer(executor: FakeExecutor, usage_reporting: bool) -> (Installer<FakeExecutor>, Arc<RecordingListener>) {
    let output = Arc::new(RecordingListener::new());
    let installer = Installer::new(
        "/opt/google-cloud-sdk",
        InstallScript::Unix,
        usage_reporting,
        executor,
        output.clone(),
        output.clone(),
    );
    (installer, output)
}

#[tokio::test]
async fn install_runs_script_quietly_from_sdk_root() {
    init_tracing();
    let (installer, output) = installer(FakeExecutor::new().with_stdout(&["Installed."]), false);

    installer.install().await.unwrap();

    let executed = installer.executor().executed();
    assert_eq!(executed.len(), 1);
    let command = &executed[0];
    assert_eq!(command.program(), Path::new("/opt/google-cloud-sdk").join("install.sh").as_os_str());
    assert_eq!(
        command.arguments(),
        &[
            OsString::from("--path-update=false"),
            OsString::from("--command-completion=false"),
            OsString::from("--quiet"),
            OsString::from("--usage-reporting=false"),
        ]
    );
    assert_eq!(command.working_dir(), Some(Path::new("/opt/google-cloud-sdk")));
    assert_eq!(output.lines(), vec!["Installed."]);
}

#[tokio::test]
async fn usage_reporting_flag_is_forwarded() {
    let (installer, _) = installer(FakeExecutor::new(), true);
    let command = installer.command().unwrap();
    assert!(command.arguments().contains(&OsString::from("--usage-reporting=true")));
}

#[tokio::test]
async fn failed_install_surfaces_non_zero_exit() {
    init_tracing();
    let executor = FakeExecutor::new()
        .with_stderr(&["permission denied"])
        .with_exit_code(1);
    let (installer, output) = installer(executor, false);

    let err = installer.install().await.unwrap_err();
    match err {
        SdkrunError::NonZeroExit { code, stderr, .. } => {
            assert_eq!(code, 1);
            assert_eq!(stderr, "permission denied");
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
    assert_eq!(output.lines(), vec!["permission denied"]);
}
