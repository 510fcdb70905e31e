//! Global context for Drydock operations.
//!
//! Provides centralized access to the recipe location, the work directory
//! layout and configuration paths.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Canonical recipe file name.
pub const RECIPE_FILE: &str = "Drydock.toml";

/// Global context containing paths and configuration.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Work directory override (defaults to `.drydock` beside the recipe)
    work_dir: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            work_dir: None,
        }
    }

    /// Override the work directory.
    pub fn set_work_dir(&mut self, dir: Option<PathBuf>) {
        self.work_dir = dir.map(|d| if d.is_absolute() { d } else { self.cwd.join(d) });
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Find `Drydock.toml` starting from cwd and searching upward.
    pub fn find_recipe(&self) -> Result<PathBuf> {
        let mut current = Some(self.cwd.as_path());
        while let Some(dir) = current {
            let candidate = dir.join(RECIPE_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }
            current = dir.parent();
        }

        bail!(
            "could not find `{}` in `{}` or any parent directory",
            RECIPE_FILE,
            self.cwd.display()
        )
    }

    /// The work directory for a recipe: all checkouts, builds, staging and
    /// the final package live below it.
    pub fn work_dir(&self, recipe_path: &Path) -> PathBuf {
        if let Some(ref dir) = self.work_dir {
            return dir.clone();
        }
        recipe_root(recipe_path).join(".drydock")
    }

    /// Load the merged global + project configuration for a recipe.
    pub fn load_config(&self, recipe_path: &Path) -> Config {
        let global = global_config_path();
        load_config(global.as_deref(), &project_config_path(recipe_root(recipe_path)))
    }
}

fn recipe_root(recipe_path: &Path) -> &Path {
    recipe_path.parent().unwrap_or_else(|| Path::new("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_recipe_searches_upward() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(RECIPE_FILE), "").unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(ctx.find_recipe().unwrap(), tmp.path().join(RECIPE_FILE));
    }

    #[test]
    fn test_work_dir_default_and_override() {
        let tmp = TempDir::new().unwrap();
        let recipe = tmp.path().join(RECIPE_FILE);
        let mut ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        assert_eq!(ctx.work_dir(&recipe), tmp.path().join(".drydock"));

        ctx.set_work_dir(Some(PathBuf::from("out")));
        assert_eq!(ctx.work_dir(&recipe), tmp.path().join("out"));
    }
}
