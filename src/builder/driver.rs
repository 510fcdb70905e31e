//! Per-configuration state machine.
//!
//! `Pending → Configuring → Building → Installing → Done`, or `Failed`.
//! Each configuration gets its own build directory and install prefix and
//! runs to completion before the next one starts.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::config::BuildConfig;
use crate::builder::tool::{BuildTool, Invocation};
use crate::core::errors::PipelineError;
use crate::core::policy::{disposition, Disposition};

/// Where a configuration is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigState {
    Pending,
    Configuring,
    Building,
    Installing,
    Collecting,
    Done,
    Failed,
}

impl ConfigState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigState::Pending => "pending",
            ConfigState::Configuring => "configuring",
            ConfigState::Building => "building",
            ConfigState::Installing => "installing",
            ConfigState::Collecting => "collecting",
            ConfigState::Done => "done",
            ConfigState::Failed => "failed",
        }
    }
}

impl fmt::Display for ConfigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of driving one configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationRun {
    pub label: String,
    pub state: ConfigState,
    /// Phase that failed, when `state` is `Failed`
    pub failed_during: Option<ConfigState>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
    pub build_dir: PathBuf,
    pub install_dir: PathBuf,
}

impl ConfigurationRun {
    fn new(label: &str, build_dir: PathBuf, install_dir: PathBuf) -> Self {
        ConfigurationRun {
            label: label.to_string(),
            state: ConfigState::Pending,
            failed_during: None,
            warnings: Vec::new(),
            error: None,
            build_dir,
            install_dir,
        }
    }

    fn enter(&mut self, state: ConfigState) {
        tracing::debug!("{}: {} -> {}", self.label, self.state, state);
        self.state = state;
    }

    pub fn is_done(&self) -> bool {
        self.state == ConfigState::Done
    }

    pub fn is_failed(&self) -> bool {
        self.state == ConfigState::Failed
    }

    /// Mark the configuration failed in its current phase.
    pub fn fail(&mut self, err: &PipelineError) {
        tracing::warn!("{}", err);
        self.failed_during = Some(self.state);
        self.state = ConfigState::Failed;
        self.error = Some(err.to_string());
    }

    /// Enter the collection phase after a successful install.
    pub fn begin_collect(&mut self) {
        self.enter(ConfigState::Collecting);
    }

    /// Finish after collection.
    pub fn finish(&mut self) {
        self.enter(ConfigState::Done);
    }
}

/// Runs the build tool for each configuration.
pub struct ConfigurationDriver<'a> {
    tool: &'a dyn BuildTool,
    source_dir: PathBuf,
    build_root: PathBuf,
    install_root: PathBuf,
    toolchain_file: PathBuf,
}

impl<'a> ConfigurationDriver<'a> {
    pub fn new(
        tool: &'a dyn BuildTool,
        source_dir: impl Into<PathBuf>,
        build_root: impl Into<PathBuf>,
        install_root: impl Into<PathBuf>,
        toolchain_file: impl Into<PathBuf>,
    ) -> Self {
        ConfigurationDriver {
            tool,
            source_dir: source_dir.into(),
            build_root: build_root.into(),
            install_root: install_root.into(),
            toolchain_file: toolchain_file.into(),
        }
    }

    pub fn build_dir(&self, label: &str) -> PathBuf {
        self.build_root.join(label)
    }

    pub fn install_dir(&self, label: &str) -> PathBuf {
        self.install_root.join(label)
    }

    pub fn toolchain_file(&self) -> &Path {
        &self.toolchain_file
    }

    /// Configure, build and install one configuration.
    ///
    /// On success the run is left in `Installing`; the caller collects
    /// artifacts and finishes it.
    pub fn drive(&self, config: &BuildConfig) -> ConfigurationRun {
        let label = config.label();
        let build_dir = self.build_dir(label);
        let install_dir = self.install_dir(label);
        let mut run = ConfigurationRun::new(label, build_dir.clone(), install_dir.clone());

        let inv = Invocation {
            config,
            source_dir: &self.source_dir,
            build_dir: &build_dir,
            install_dir: &install_dir,
            toolchain_file: &self.toolchain_file,
        };

        run.enter(ConfigState::Configuring);
        // Taken before configuring: a failed configure still writes a cache.
        let prior = self.tool.has_configure_state(&build_dir);
        if let Err(e) = self.tool.configure(&inv) {
            let err = PipelineError::GeneratorInvocation {
                configuration: label.to_string(),
                message: format!("{:#}", e),
            };
            match disposition(err.kind(), prior) {
                Disposition::Continue => {
                    let warning = format!("{} (continuing with existing build tree)", err);
                    tracing::warn!("{}", warning);
                    run.warnings.push(warning);
                }
                _ => {
                    run.fail(&err);
                    return run;
                }
            }
        }

        run.enter(ConfigState::Building);
        if let Err(e) = self.tool.build(&inv) {
            run.fail(&PipelineError::Build {
                configuration: label.to_string(),
                message: format!("{:#}", e),
            });
            return run;
        }

        run.enter(ConfigState::Installing);
        if let Err(e) = self.tool.install(&inv) {
            run.fail(&PipelineError::Install {
                configuration: label.to_string(),
                message: format!("{:#}", e),
            });
            return run;
        }

        run
    }
}
