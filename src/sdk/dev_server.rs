// src/sdk/dev_server.rs

//! Typed options for the local development server.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::sdk::args;

/// Options for `dev_appserver.py`. Unset values are left to the tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevServerConfiguration {
    /// `app.yaml` files (or service directories) to serve.
    pub app_yamls: Vec<PathBuf>,
    pub host: Option<String>,
    pub port: Option<i64>,
    pub admin_host: Option<String>,
    pub admin_port: Option<i64>,
    pub api_port: Option<i64>,
    pub auth_domain: Option<String>,
    pub storage_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub dev_appserver_log_level: Option<String>,
    pub max_module_instances: Option<i64>,
    pub runtime: Option<String>,
    pub default_gcs_bucket_name: Option<String>,
    pub use_mtime_file_watcher: Option<bool>,
    pub allow_skipped_files: Option<bool>,
    pub automatic_restart: Option<bool>,
    pub skip_sdk_update_check: Option<bool>,
    pub jvm_flags: Vec<String>,
    /// Passed to the served app as `--env_var KEY=VALUE`.
    pub env_vars: BTreeMap<String, String>,
}

impl DevServerConfiguration {
    pub fn new<I, P>(app_yamls: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            app_yamls: app_yamls.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Argument list for `dev_appserver.py`, app files first.
    pub fn to_args(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .app_yamls
            .iter()
            .map(|p| p.display().to_string())
            .collect();

        out.extend(args::string_eq("host", self.host.as_deref()));
        out.extend(args::integer("port", self.port));
        out.extend(args::string_eq("admin_host", self.admin_host.as_deref()));
        out.extend(args::integer("admin_port", self.admin_port));
        out.extend(args::integer("api_port", self.api_port));
        out.extend(args::string_eq("auth_domain", self.auth_domain.as_deref()));
        out.extend(args::path("storage_path", self.storage_path.as_deref()));
        out.extend(args::string("log_level", self.log_level.as_deref()));
        out.extend(args::string(
            "dev_appserver_log_level",
            self.dev_appserver_log_level.as_deref(),
        ));
        out.extend(args::integer("max_module_instances", self.max_module_instances));
        out.extend(args::string("runtime", self.runtime.as_deref()));
        out.extend(args::string(
            "default_gcs_bucket_name",
            self.default_gcs_bucket_name.as_deref(),
        ));
        out.extend(args::flag("use_mtime_file_watcher", self.use_mtime_file_watcher));
        out.extend(args::flag("allow_skipped_files", self.allow_skipped_files));
        out.extend(args::flag("skip_sdk_update_check", self.skip_sdk_update_check));
        if let Some(restart) = self.automatic_restart {
            out.extend(args::string_eq(
                "automatic_restart",
                Some(if restart { "true" } else { "false" }),
            ));
        }
        out.extend(args::strings("jvm_flag", &self.jvm_flags));
        out.extend(args::strings("env_var", &args::key_values(&self.env_vars)));
        out
    }
}
