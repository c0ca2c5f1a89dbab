// src/sdk/deploy.rs

//! Typed options for `gcloud app deploy`.

use std::path::PathBuf;

use crate::sdk::args;

/// Options for `gcloud app deploy`. Booleans are tri-state: `None` leaves
/// the gcloud default, `Some(false)` passes the `--no-` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployConfiguration {
    /// `app.yaml` files or other deployables.
    pub deployables: Vec<PathBuf>,
    pub bucket: Option<String>,
    pub docker_build: Option<String>,
    pub force: Option<bool>,
    pub image_url: Option<String>,
    pub promote: Option<bool>,
    pub server: Option<String>,
    pub stop_previous_version: Option<bool>,
    pub version: Option<String>,
    pub project: Option<String>,
}

impl DeployConfiguration {
    pub fn new<I, P>(deployables: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            deployables: deployables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Arguments following `gcloud app`.
    pub fn to_args(&self) -> Vec<String> {
        let mut out = vec!["deploy".to_string()];
        out.extend(self.deployables.iter().map(|p| p.display().to_string()));
        out.extend(args::string("bucket", self.bucket.as_deref()));
        out.extend(args::string("docker-build", self.docker_build.as_deref()));
        out.extend(args::bool_with_no("force", self.force));
        out.extend(args::string("image-url", self.image_url.as_deref()));
        out.extend(args::bool_with_no("promote", self.promote));
        out.extend(args::string("server", self.server.as_deref()));
        out.extend(args::bool_with_no("stop-previous-version", self.stop_previous_version));
        out.extend(args::string("version", self.version.as_deref()));
        out.extend(args::string("project", self.project.as_deref()));
        out
    }
}
