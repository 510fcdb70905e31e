//! Work directory layout.
//!
//! ```text
//! <work>/
//!   source/<checkout>/
//!   build/drydock_toolchain.cmake
//!   build/<label>/
//!   install/<label>/
//!   staging/<kind>/<label>/
//!   package/{include,lib/<label>,bin/<label>}/
//! ```

use std::path::{Path, PathBuf};

use crate::builder::toolchain::TOOLCHAIN_FILE;

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Layout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_root(&self) -> PathBuf {
        self.root.join("source")
    }

    pub fn checkout(&self, name: &str) -> PathBuf {
        self.source_root().join(name)
    }

    pub fn build_root(&self) -> PathBuf {
        self.root.join("build")
    }

    pub fn toolchain_file(&self) -> PathBuf {
        self.build_root().join(TOOLCHAIN_FILE)
    }

    pub fn install_root(&self) -> PathBuf {
        self.root.join("install")
    }

    pub fn staging_root(&self) -> PathBuf {
        self.root.join("staging")
    }

    pub fn package_root(&self) -> PathBuf {
        self.root.join("package")
    }
}
