// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{ExecutionMode, OutputRouting};

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [sdk]
/// root = "/opt/google-cloud-sdk"
/// usage_reporting = false
///
/// [run]
/// mode = "sync"
/// routing = "captured"
///
/// [env]
/// CLOUDSDK_CORE_DISABLE_PROMPTS = "1"
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub sdk: SdkSection,

    #[serde(default)]
    pub run: RunSection,

    /// Environment overrides merged over the inherited environment of every
    /// spawned command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[sdk]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdkSection {
    /// SDK install root. Discovered from `PATH` when absent.
    pub root: Option<PathBuf>,

    /// Passed to the installer as `--usage-reporting=<bool>`.
    #[serde(default)]
    pub usage_reporting: bool,
}

/// `[run]` section: defaults for `exec`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    #[serde(default)]
    pub mode: ExecutionMode,

    #[serde(default)]
    pub routing: OutputRouting,
}

/// Validated configuration. Only constructed through `TryFrom<RawConfigFile>`
/// (see `validate.rs`) or [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub sdk: SdkSection,
    pub run: RunSection,
    pub env: BTreeMap<String, String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        sdk: SdkSection,
        run: RunSection,
        env: BTreeMap<String, String>,
    ) -> Self {
        Self { sdk, run, env }
    }
}
