//! Removal of work directory contents.

use std::path::PathBuf;

use anyhow::Result;

use crate::ops::layout::Layout;
use crate::util::fs::remove_dir_all_if_exists;

#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Also remove the source checkout
    pub source: bool,
}

/// Remove build outputs, returning the directories that existed.
pub fn clean(layout: &Layout, opts: &CleanOptions) -> Result<Vec<PathBuf>> {
    let mut dirs = vec![
        layout.build_root(),
        layout.install_root(),
        layout.staging_root(),
        layout.package_root(),
    ];
    if opts.source {
        dirs.push(layout.source_root());
    }

    let mut removed = Vec::new();
    for dir in dirs {
        if dir.exists() {
            tracing::debug!("removing {}", dir.display());
            remove_dir_all_if_exists(&dir)?;
            removed.push(dir);
        }
    }
    Ok(removed)
}
