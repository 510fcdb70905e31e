//! Test doubles for the retrieval and build tool boundaries.
//!
//! [`FakeTool`] stands in for CMake: it records every call, fails where told
//! to, leaves a `CMakeCache.txt` behind on every configure, failed or not,
//! and "installs" a fixed set of files per configuration. [`StaticSource`] writes a canned
//! source tree instead of cloning.

pub mod fixtures;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::builder::tool::{BuildTool, Invocation, ToolError};
use crate::sources::Source;

pub use fixtures::*;

/// One phase of a [`BuildTool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Configure,
    Build,
    Install,
}

impl Step {
    fn as_str(&self) -> &'static str {
        match self {
            Step::Configure => "configure",
            Step::Build => "build",
            Step::Install => "install",
        }
    }
}

/// Scripted build tool.
#[derive(Debug, Default)]
pub struct FakeTool {
    calls: Mutex<Vec<String>>,
    failures: BTreeSet<(Step, String)>,
    installs: BTreeMap<String, Vec<(PathBuf, String)>>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `step` for configuration `label`.
    pub fn fail_on(mut self, step: Step, label: &str) -> Self {
        self.failures.insert((step, label.to_string()));
        self
    }

    /// Install `contents` at `rel` below the prefix of `label`.
    pub fn installs(mut self, label: &str, rel: &str, contents: &str) -> Self {
        self.installs
            .entry(label.to_string())
            .or_default()
            .push((PathBuf::from(rel), contents.to_string()));
        self
    }

    /// Calls so far, as `"<step> <label>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, step: Step, inv: &Invocation<'_>) -> Result<(), ToolError> {
        let label = inv.config.label();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{} {}", step.as_str(), label));
        }

        if self.failures.contains(&(step, label.to_string())) {
            return Err(ToolError::Failed {
                command: format!("cmake {}", step.as_str()),
                code: Some(1),
                stderr: format!("scripted {} failure", step.as_str()),
            });
        }
        Ok(())
    }
}

impl BuildTool for FakeTool {
    fn name(&self) -> &str {
        "fake"
    }

    fn configure(&self, inv: &Invocation<'_>) -> Result<(), ToolError> {
        // CMake leaves a cache behind even when configuring fails.
        std::fs::create_dir_all(inv.build_dir).map_err(anyhow::Error::from)?;
        std::fs::write(inv.build_dir.join("CMakeCache.txt"), "").map_err(anyhow::Error::from)?;
        self.record(Step::Configure, inv)
    }

    fn build(&self, inv: &Invocation<'_>) -> Result<(), ToolError> {
        self.record(Step::Build, inv)
    }

    fn install(&self, inv: &Invocation<'_>) -> Result<(), ToolError> {
        self.record(Step::Install, inv)?;
        let files = self.installs.get(inv.config.label()).cloned().unwrap_or_default();
        for (rel, contents) in files {
            let path = inv.install_dir.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(anyhow::Error::from)?;
            }
            std::fs::write(&path, contents).map_err(anyhow::Error::from)?;
        }
        Ok(())
    }

    fn has_configure_state(&self, build_dir: &Path) -> bool {
        build_dir.join("CMakeCache.txt").is_file()
    }
}

/// Source that writes fixed files instead of fetching.
#[derive(Debug, Clone)]
pub struct StaticSource {
    checkout_path: PathBuf,
    files: Vec<(PathBuf, String)>,
    unreachable: bool,
}

impl StaticSource {
    pub fn new(checkout_path: impl Into<PathBuf>) -> Self {
        StaticSource {
            checkout_path: checkout_path.into(),
            files: Vec::new(),
            unreachable: false,
        }
    }

    pub fn file(mut self, rel: &str, contents: &str) -> Self {
        self.files.push((PathBuf::from(rel), contents.to_string()));
        self
    }

    /// Make every retrieval fail.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

impl Source for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn tag(&self) -> &str {
        "0.15.12"
    }

    fn checkout_path(&self) -> &Path {
        &self.checkout_path
    }

    fn retrieve(&mut self) -> Result<String> {
        if self.unreachable {
            bail!("network is unreachable");
        }
        for (rel, contents) in &self.files {
            let path = self.checkout_path.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, contents)?;
        }
        Ok("0123456789abcdef".to_string())
    }
}
