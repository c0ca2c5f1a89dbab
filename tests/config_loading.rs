// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use sdkrun::config::{load_and_validate, load_or_default};
use sdkrun::errors::SdkrunError;
use sdkrun::types::{ExecutionMode, OutputRouting};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn full_config_is_loaded() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sdkrun.toml");
    fs::write(
        &path,
        r#"
[sdk]
root = "/opt/google-cloud-sdk"
usage_reporting = true

[run]
mode = "async"
routing = "inherited"

[env]
CLOUDSDK_CORE_DISABLE_PROMPTS = "1"
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.sdk.root, Some(PathBuf::from("/opt/google-cloud-sdk")));
    assert!(cfg.sdk.usage_reporting);
    assert_eq!(cfg.run.mode, ExecutionMode::Asynchronous);
    assert_eq!(cfg.run.routing, OutputRouting::Inherited);
    assert_eq!(cfg.env.get("CLOUDSDK_CORE_DISABLE_PROMPTS").map(String::as_str), Some("1"));
    Ok(())
}

#[test]
fn missing_default_file_gives_defaults() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg = load_or_default(dir.path().join("Sdkrun.toml"))?;
    assert_eq!(cfg.run.mode, ExecutionMode::Synchronous);
    assert_eq!(cfg.run.routing, OutputRouting::Captured);
    assert!(cfg.sdk.root.is_none());
    assert!(cfg.env.is_empty());
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, SdkrunError::IoError(_)));
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sdkrun.toml");
    fs::write(&path, "[run]\nmode = \"sync\"\ncolour = true\n")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, SdkrunError::TomlError(_)));
    Ok(())
}

#[test]
fn invalid_env_name_fails_validation() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sdkrun.toml");
    fs::write(&path, "[env]\n\"A=B\" = \"x\"\n")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, SdkrunError::ConfigError(_)));
    Ok(())
}
