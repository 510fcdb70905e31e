//! Dependency locations supplied by the external dependency manager.
//!
//! Drydock never resolves dependencies itself. It receives, per dependency
//! name, an install root and optional include directories, and forwards them
//! to the generator.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Install location of one resolved dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    /// Dependency name as declared in the recipe
    #[serde(skip)]
    pub name: String,

    /// Install root
    pub root: PathBuf,

    /// Include directories (empty = `<root>/include`)
    #[serde(default)]
    pub include: Vec<PathBuf>,
}

impl DependencyRef {
    /// Create a reference with the default include directory.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        DependencyRef {
            name: name.into(),
            root: root.into(),
            include: Vec::new(),
        }
    }

    /// Effective include directories.
    pub fn include_dirs(&self) -> Vec<PathBuf> {
        if self.include.is_empty() {
            vec![self.root.join("include")]
        } else {
            self.include.clone()
        }
    }
}

/// Raised when required dependencies have no supplied location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing dependencies: {}", missing.join(", "))]
pub struct MissingDependencyError {
    /// Sorted names of every absent dependency
    pub missing: Vec<String>,
}

impl MissingDependencyError {
    pub fn new(mut missing: Vec<String>) -> Self {
        missing.sort();
        missing.dedup();
        MissingDependencyError { missing }
    }
}

/// All dependency locations supplied for one run, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    deps: BTreeMap<String, DependencyRef>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dependency file:
    ///
    /// ```toml
    /// [xeus]
    /// root = "/deps/xeus"
    /// include = ["/deps/xeus/include"]
    /// ```
    ///
    /// Relative paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dependency file: {}", path.display()))?;
        let table: BTreeMap<String, DependencyRef> = toml::from_str(&contents)
            .with_context(|| format!("failed to parse dependency file: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let mut map = DependencyMap::new();
        for (name, mut dep) in table {
            dep.name = name;
            dep.root = base.join(&dep.root);
            dep.include = dep.include.iter().map(|p| base.join(p)).collect();
            map.insert(dep);
        }
        Ok(map)
    }

    /// Parse a `name=root` command-line entry.
    pub fn parse_entry(spec: &str) -> Result<DependencyRef> {
        let (name, root) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid dependency `{}`; expected `name=path`", spec))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("invalid dependency `{}`: empty name", spec));
        }
        Ok(DependencyRef::new(name, root.trim()))
    }

    /// Insert or replace a dependency.
    pub fn insert(&mut self, dep: DependencyRef) {
        self.deps.insert(dep.name.clone(), dep);
    }

    pub fn get(&self, name: &str) -> Option<&DependencyRef> {
        self.deps.get(name)
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Resolve every required name, or report all of the absent ones.
    pub fn resolve<'a, I>(&self, required: I) -> Result<Vec<&DependencyRef>, MissingDependencyError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut found = Vec::new();
        let mut missing = Vec::new();

        for name in required {
            match self.deps.get(name) {
                Some(dep) => found.push(dep),
                None => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(found)
        } else {
            Err(MissingDependencyError::new(missing))
        }
    }
}

impl FromIterator<DependencyRef> for DependencyMap {
    fn from_iter<T: IntoIterator<Item = DependencyRef>>(iter: T) -> Self {
        let mut map = DependencyMap::new();
        for dep in iter {
            map.insert(dep);
        }
        map
    }
}
