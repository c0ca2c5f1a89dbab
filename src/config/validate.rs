// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SdkrunError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SdkrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.sdk, raw.run, raw.env))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_sdk_section(cfg)?;
    validate_env(cfg)?;
    Ok(())
}

fn validate_sdk_section(cfg: &RawConfigFile) -> Result<()> {
    if let Some(root) = &cfg.sdk.root {
        if root.as_os_str().is_empty() {
            return Err(SdkrunError::ConfigError(
                "[sdk].root must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_env(cfg: &RawConfigFile) -> Result<()> {
    for (name, value) in cfg.env.iter() {
        if name.is_empty() {
            return Err(SdkrunError::ConfigError(
                "[env] contains an empty variable name".to_string(),
            ));
        }
        if name.contains('=') || name.contains('\0') {
            return Err(SdkrunError::ConfigError(format!(
                "[env] variable name '{}' must not contain '=' or NUL",
                name.escape_debug()
            )));
        }
        if value.contains('\0') {
            return Err(SdkrunError::ConfigError(format!(
                "[env] value of '{}' must not contain NUL",
                name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExecutionMode, OutputRouting};

    fn parse(toml_src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        ConfigFile::try_from(raw)
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("").unwrap();
        assert!(cfg.sdk.root.is_none());
        assert!(!cfg.sdk.usage_reporting);
        assert_eq!(cfg.run.mode, ExecutionMode::Synchronous);
        assert_eq!(cfg.run.routing, OutputRouting::Captured);
        assert!(cfg.env.is_empty());
    }

    #[test]
    fn full_file_round_trips_into_model() {
        let cfg = parse(
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
        )
        .unwrap();

        assert_eq!(cfg.sdk.root.as_deref(), Some(std::path::Path::new("/opt/google-cloud-sdk")));
        assert!(cfg.sdk.usage_reporting);
        assert_eq!(cfg.run.mode, ExecutionMode::Asynchronous);
        assert_eq!(cfg.run.routing, OutputRouting::Inherited);
        assert_eq!(cfg.env.get("CLOUDSDK_CORE_DISABLE_PROMPTS").map(String::as_str), Some("1"));
    }

    #[test]
    fn env_name_with_equals_is_rejected() {
        let err = parse("[env]\n\"A=B\" = \"1\"\n").unwrap_err();
        match err {
            SdkrunError::ConfigError(msg) => assert!(msg.contains("A=B")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn empty_sdk_root_is_rejected() {
        assert!(matches!(
            parse("[sdk]\nroot = \"\"\n"),
            Err(SdkrunError::ConfigError(_))
        ));
    }

    #[test]
    fn unknown_mode_is_a_toml_error() {
        assert!(matches!(
            parse("[run]\nmode = \"later\"\n"),
            Err(SdkrunError::TomlError(_))
        ));
    }
}
