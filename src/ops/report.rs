//! Run summary.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::driver::{ConfigState, ConfigurationRun};
use crate::builder::merge::MergeReport;
use crate::core::artifact::{ArtifactKind, ConfigurationOutput};
use crate::core::platform::PlatformFamily;
use crate::sources::PreparedSource;

/// Final state of one configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationReport {
    pub label: String,
    pub state: ConfigState,
    pub failed_during: Option<ConfigState>,
    pub artifacts: usize,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl ConfigurationReport {
    pub fn new(run: &ConfigurationRun, output: Option<&ConfigurationOutput>) -> Self {
        ConfigurationReport {
            label: run.label.clone(),
            state: run.state,
            failed_during: run.failed_during,
            artifacts: output.map_or(0, |o| o.artifacts.len()),
            warnings: run.warnings.clone(),
            error: run.error.clone(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == ConfigState::Done
    }
}

/// Everything a run did.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub package: String,
    pub version: String,
    pub platform: PlatformFamily,
    pub generator: String,
    pub source: Option<PreparedSource>,
    pub configurations: Vec<ConfigurationReport>,
    /// Artifacts per configuration and kind, for the summary
    #[serde(skip)]
    pub outputs: Vec<ConfigurationOutput>,
    pub headers: usize,
    pub merge: MergeReport,
    pub package_dir: PathBuf,
    pub warnings: Vec<String>,
}

impl PipelineReport {
    /// Every configuration finished and packaging did not fail.
    pub fn succeeded(&self) -> bool {
        self.configurations.iter().all(ConfigurationReport::succeeded)
            && self.merge.error.is_none()
    }

    pub fn failed_configurations(&self) -> impl Iterator<Item = &ConfigurationReport> {
        self.configurations.iter().filter(|c| !c.succeeded())
    }

    /// Artifact count of one kind in one configuration.
    pub fn count(&self, label: &str, kind: ArtifactKind) -> usize {
        self.outputs
            .iter()
            .find(|o| o.label == label)
            .map_or(0, |o| o.of_kind(kind).count())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
