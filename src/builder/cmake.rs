//! CMake adapter for the wrapped project.

use std::path::{Path, PathBuf};

use crate::builder::tool::{BuildTool, Invocation, ToolError};
use crate::util::fs::{ensure_dir, to_posix};
use crate::util::process::{find_cmake, ProcessBuilder};

/// Drives `cmake` for one configuration at a time.
#[derive(Debug, Clone)]
pub struct CMakeTool {
    cmake: PathBuf,
    jobs: Option<usize>,
    verbose: bool,
}

impl CMakeTool {
    /// Locate cmake, preferring an explicitly configured path.
    pub fn locate(configured: Option<&Path>) -> Result<Self, ToolError> {
        let cmake = find_cmake(configured).ok_or_else(|| ToolError::NotFound {
            tool: "cmake".to_string(),
        })?;
        Ok(Self::new(cmake))
    }

    pub fn new(cmake: PathBuf) -> Self {
        CMakeTool {
            cmake,
            jobs: None,
            verbose: false,
        }
    }

    /// Parallel jobs for `cmake --build`.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Pass `--verbose` to the build step.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Arguments for the configure step.
    pub fn configure_args(&self, inv: &Invocation<'_>) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            inv.source_dir.display().to_string(),
            "-B".to_string(),
            inv.build_dir.display().to_string(),
        ];

        if let Some(generator) = inv.config.generator().name() {
            args.push("-G".to_string());
            args.push(generator.to_string());
        }

        args.push(format!(
            "-DCMAKE_TOOLCHAIN_FILE={}",
            to_posix(inv.toolchain_file)
        ));
        args.push(format!(
            "-DCMAKE_INSTALL_PREFIX={}",
            to_posix(inv.install_dir)
        ));

        for (key, value) in inv.config.variables() {
            args.push(format!("-D{}={}", key, value));
        }

        args
    }

    /// Arguments for the build step.
    pub fn build_args(&self, inv: &Invocation<'_>) -> Vec<String> {
        let mut args = vec![
            "--build".to_string(),
            inv.build_dir.display().to_string(),
            "--config".to_string(),
            inv.config.label().to_string(),
        ];

        if let Some(jobs) = self.jobs {
            args.push("--parallel".to_string());
            args.push(jobs.to_string());
        }

        if self.verbose {
            args.push("--verbose".to_string());
        }

        args
    }

    /// Arguments for the install step.
    pub fn install_args(&self, inv: &Invocation<'_>) -> Vec<String> {
        vec![
            "--install".to_string(),
            inv.build_dir.display().to_string(),
            "--config".to_string(),
            inv.config.label().to_string(),
            "--prefix".to_string(),
            inv.install_dir.display().to_string(),
        ]
    }

    fn run(&self, args: Vec<String>) -> Result<(), ToolError> {
        let cmd = ProcessBuilder::new(&self.cmake).args(&args);
        let output = cmd.exec()?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                command: cmd.display_command(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }

        Ok(())
    }
}

impl BuildTool for CMakeTool {
    fn name(&self) -> &str {
        "cmake"
    }

    fn configure(&self, inv: &Invocation<'_>) -> Result<(), ToolError> {
        tracing::info!("Configuring `{}`", inv.config.label());
        ensure_dir(inv.build_dir)?;
        self.run(self.configure_args(inv))
    }

    fn build(&self, inv: &Invocation<'_>) -> Result<(), ToolError> {
        tracing::info!("Building `{}`", inv.config.label());
        self.run(self.build_args(inv))
    }

    fn install(&self, inv: &Invocation<'_>) -> Result<(), ToolError> {
        tracing::info!("Installing `{}`", inv.config.label());
        ensure_dir(inv.install_dir)?;
        self.run(self.install_args(inv))
    }

    fn has_configure_state(&self, build_dir: &Path) -> bool {
        build_dir.join("CMakeCache.txt").is_file()
    }
}
