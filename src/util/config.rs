//! Configuration file support for Drydock.
//!
//! Drydock reads two configuration file locations:
//! - Global: `~/.drydock/config.toml` - User-wide defaults
//! - Project: `.drydock/config.toml` next to the recipe - Project-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Drydock configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildSettings,

    /// Source retrieval settings
    pub source: SourceSettings,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Parallel jobs passed to `cmake --build` (None = generator default)
    pub jobs: Option<usize>,

    /// Explicit path to the cmake executable
    pub cmake: Option<PathBuf>,

    /// Generator name overriding the platform profile's choice
    pub generator: Option<String>,

    /// Pass `--verbose` to the generator's build step
    pub verbose: bool,
}

/// Source retrieval configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Skip retrieval and work against the existing checkout
    pub offline: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.cmake.is_some() {
            self.build.cmake = other.build.cmake;
        }
        if other.build.generator.is_some() {
            self.build.generator = other.build.generator;
        }
        if other.build.verbose {
            self.build.verbose = true;
        }

        if other.source.offline {
            self.source.offline = true;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.drydock/config.toml)
/// 2. Global config (~/.drydock/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global drydock config directory (~/.drydock).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".drydock"))
}

/// Get the global config path (~/.drydock/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.drydock/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".drydock").join("config.toml")
}
