//! The generated CMake toolchain file.
//!
//! Directives are accumulated in memory for the whole run and written once,
//! before the first configuration is generated. The descriptor is append-only:
//! nothing resets it between configurations.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::fs::{to_posix, write_string};

/// File name of the toolchain file inside the build root.
pub const TOOLCHAIN_FILE: &str = "drydock_toolchain.cmake";

/// Accumulated toolchain directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainDescriptor {
    directives: Vec<String>,
}

impl ToolchainDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directive. Returns `false` if the identical directive is
    /// already present.
    pub fn append(&mut self, directive: impl Into<String>) -> bool {
        let directive = directive.into();
        if self.directives.contains(&directive) {
            return false;
        }
        self.directives.push(directive);
        true
    }

    /// Append an `include_directories(...)` block. Empty input appends nothing.
    pub fn include_directories(&mut self, dirs: &[PathBuf]) -> bool {
        if dirs.is_empty() {
            return false;
        }

        let mut block = String::from("include_directories(\n");
        for dir in dirs {
            block.push_str("    \"");
            block.push_str(&to_posix(dir));
            block.push_str("\"\n");
        }
        block.push(')');
        self.append(block)
    }

    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Render the toolchain file.
    pub fn render(&self) -> String {
        let mut out = String::from("# Generated by drydock. Do not edit.\n");
        for directive in &self.directives {
            out.push('\n');
            out.push_str(directive);
            out.push('\n');
        }
        out
    }

    /// Write the toolchain file.
    pub fn write(&self, path: &Path) -> Result<()> {
        tracing::debug!("writing toolchain file {}", path.display());
        write_string(path, &self.render())
    }
}
