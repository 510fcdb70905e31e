//! The build tool boundary.
//!
//! The external generator (CMake) is reached only through [`BuildTool`], so
//! the driver can be exercised without a real toolchain.

use std::path::Path;

use thiserror::Error;

use crate::builder::config::BuildConfig;

/// Failure reported by the external build tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{tool}` not found\n\nInstall it and ensure it's in your PATH.")]
    NotFound { tool: String },

    #[error("`{command}` failed with exit code {code:?}\n{stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Spawn(#[from] anyhow::Error),
}

/// Everything one generator invocation needs.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub config: &'a BuildConfig,
    pub source_dir: &'a Path,
    pub build_dir: &'a Path,
    pub install_dir: &'a Path,
    pub toolchain_file: &'a Path,
}

/// generate → build → install for one configuration.
pub trait BuildTool {
    /// Tool name for display.
    fn name(&self) -> &str;

    /// Generate the native build in `build_dir`.
    fn configure(&self, inv: &Invocation<'_>) -> Result<(), ToolError>;

    /// Compile the configuration.
    fn build(&self, inv: &Invocation<'_>) -> Result<(), ToolError>;

    /// Install the configuration into `install_dir`.
    fn install(&self, inv: &Invocation<'_>) -> Result<(), ToolError>;

    /// Whether `build_dir` holds state from an earlier successful configure.
    fn has_configure_state(&self, build_dir: &Path) -> bool;
}
