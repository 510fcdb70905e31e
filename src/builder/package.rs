//! The final package tree: `include/`, `lib/<cfg>/`, `bin/<cfg>/`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::merge::{Layer, Merged};
use crate::core::artifact::PackageDir;
use crate::util::fs::{
    copy_file, ensure_dir, glob_files, relative_path, remove_dir_all_if_exists,
    remove_top_level_files,
};

/// Package directory layout rooted at `<work>/package`.
#[derive(Debug, Clone)]
pub struct PackageTree {
    root: PathBuf,
}

impl PackageTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PackageTree { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn include_dir(&self) -> PathBuf {
        self.root.join("include")
    }

    /// `lib/<label>` or `bin/<label>`.
    pub fn dir(&self, dir: PackageDir, label: &str) -> PathBuf {
        self.root.join(dir.as_str()).join(label)
    }

    /// Remove stray top-level files in `lib/` and `bin/` and the
    /// per-configuration directories of `labels`.
    pub fn prepare<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for dir in [PackageDir::Lib, PackageDir::Bin] {
            removed.extend(remove_top_level_files(&self.root.join(dir.as_str()))?);
            for label in labels {
                let path = self.dir(dir, label.as_ref());
                if path.exists() {
                    remove_dir_all_if_exists(&path)?;
                    removed.push(path);
                }
            }
        }
        for path in &removed {
            tracing::debug!("removed stale {}", path.display());
        }
        Ok(removed)
    }

    /// Copy headers matching `patterns` below `src` into `include/`, keeping
    /// their relative paths. Replaces any earlier `include/`.
    pub fn copy_headers(&self, src: &Path, patterns: &[String]) -> Result<usize> {
        let include = self.include_dir();
        remove_dir_all_if_exists(&include)?;
        ensure_dir(&include)?;

        let headers = glob_files(src, patterns)?;
        for header in &headers {
            let rel = relative_path(src, header);
            copy_file(header, &include.join(rel))?;
        }
        Ok(headers.len())
    }

    /// Place a package-relative path (`lib/foo.a`) under `label`.
    fn place(&self, rel: &Path, label: &str) -> PathBuf {
        let mut components = rel.components();
        match components.next() {
            Some(top) => self
                .root
                .join(top.as_os_str())
                .join(label)
                .join(components.as_path()),
            None => self.root.join(label),
        }
    }

    /// Package one configuration in its own directories.
    pub fn write_layer(&self, layer: &Layer) -> Result<usize> {
        for (rel, src) in &layer.entries {
            copy_file(src, &self.place(rel, &layer.label))?;
        }
        Ok(layer.entries.len())
    }

    /// Package merged artifacts in the target's directories.
    pub fn write_merged(&self, to: &str, merged: &Merged) -> Result<usize> {
        for (rel, (src, _)) in &merged.entries {
            copy_file(src, &self.place(rel, to))?;
        }
        Ok(merged.entries.len())
    }
}
