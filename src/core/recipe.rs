//! `Drydock.toml` recipe parsing and schema.
//!
//! The recipe describes the wrapped project: where its source lives, how to
//! patch it, which dependencies it needs, which configurations to build and
//! how to package them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::core::options::Options;

/// Parsed recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub package: PackageSection,

    pub source: SourceSpec,

    #[serde(default)]
    pub options: Options,

    #[serde(default)]
    pub build: BuildSection,

    /// Fixed variables forwarded to the generator (version pins, feature toggles)
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Dependencies the wrapped project requires
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<DependencySpec>,

    /// Path variables derived from a dependency root
    #[serde(default)]
    pub path_variables: BTreeMap<String, DerivedPath>,

    #[serde(default)]
    pub merge: MergeSection,
}

/// `[package]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub headers: HeaderSpec,
}

/// `[package.headers]`: headers copied into `include/` keeping their path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderSpec {
    /// Directory relative to the source checkout
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_header_patterns")]
    pub patterns: Vec<String>,
}

impl Default for HeaderSpec {
    fn default() -> Self {
        HeaderSpec {
            dir: None,
            patterns: default_header_patterns(),
        }
    }
}

fn default_header_patterns() -> Vec<String> {
    vec!["**/*.h".to_string(), "**/*.hpp".to_string()]
}

/// `[source]`: where the wrapped project comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Repository URL or local path
    pub url: String,

    /// Pinned tag (defaults to the package version)
    #[serde(default)]
    pub tag: Option<String>,

    /// Checkout directory name (defaults to the repository name)
    #[serde(default)]
    pub checkout: Option<String>,

    /// Textual patches, applied in order
    #[serde(default, rename = "patch")]
    pub patches: Vec<PatchRule>,
}

impl SourceSpec {
    /// Directory name of the checkout below `<work>/source`.
    pub fn checkout_name(&self) -> String {
        if let Some(ref name) = self.checkout {
            return name.clone();
        }

        let trimmed = self.url.trim_end_matches('/');
        let last = match url::Url::parse(trimmed) {
            Ok(url) if url.scheme() != "file" && url.host_str().is_some() => url
                .path_segments()
                .and_then(|mut segs| segs.next_back().map(str::to_string))
                .unwrap_or_default(),
            _ => Path::new(trimmed)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let name = last.strip_suffix(".git").unwrap_or(&last);
        if name.is_empty() {
            "source".to_string()
        } else {
            name.to_string()
        }
    }
}

/// One textual patch against a file of the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchRule {
    /// Replace every occurrence of `search` with `replace`.
    Replace {
        file: PathBuf,
        search: String,
        replace: String,
    },
    /// Append `append` to the end of the file.
    Append { file: PathBuf, append: String },
}

impl PatchRule {
    pub fn file(&self) -> &Path {
        match self {
            PatchRule::Replace { file, .. } | PatchRule::Append { file, .. } => file,
        }
    }
}

/// `[build]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Configurations built, in order
    pub configurations: Vec<String>,

    /// Labels whose debug symbol files are kept
    pub debug_like: Vec<String>,

    /// Emit `CMAKE_VERBOSE_MAKEFILE=ON`
    pub verbose_makefile: bool,

    /// Generator name overriding the platform profile
    pub generator: Option<String>,

    /// Source subdirectory holding the top-level CMakeLists.txt
    pub source_subdir: Option<PathBuf>,
}

impl Default for BuildSection {
    fn default() -> Self {
        BuildSection {
            configurations: vec!["Debug".to_string(), "Release".to_string()],
            debug_like: vec!["Debug".to_string(), "RelWithDebInfo".to_string()],
            verbose_makefile: true,
            generator: None,
            source_subdir: None,
        }
    }
}

/// `[[dependency]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: String,

    /// Variable receiving the install root; `<name>_ROOT` when absent
    #[serde(default)]
    pub root_variable: Option<String>,

    /// Forward the install root at all (header-only deps often don't)
    #[serde(default = "default_true")]
    pub forward_root: bool,

    /// Add the include directories to the toolchain `include_directories`
    #[serde(default)]
    pub include: bool,
}

impl DependencySpec {
    /// Variable name carrying this dependency's root, if forwarded.
    pub fn root_variable(&self) -> Option<String> {
        if !self.forward_root {
            return None;
        }
        Some(
            self.root_variable
                .clone()
                .unwrap_or_else(|| format!("{}_ROOT", self.name)),
        )
    }
}

fn default_true() -> bool {
    true
}

/// A path variable computed from a dependency root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedPath {
    pub dependency: String,
    #[serde(default)]
    pub subdir: Option<PathBuf>,
}

/// `[merge]`: which configurations fold into which.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSection {
    /// Merge-from configurations, highest precedence first
    pub from: Vec<String>,
    /// Merge-to configuration; wins every conflict
    pub to: String,
}

impl Default for MergeSection {
    fn default() -> Self {
        MergeSection {
            from: vec!["Debug".to_string()],
            to: "Release".to_string(),
        }
    }
}

impl Recipe {
    /// Load and validate a recipe file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recipe: {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid recipe: {}", path.display()))
    }

    /// Parse and validate recipe text.
    pub fn parse(contents: &str) -> Result<Self> {
        let recipe: Recipe = toml::from_str(contents)?;
        recipe.validate()?;
        Ok(recipe)
    }

    /// Pinned tag to check out.
    pub fn tag(&self) -> String {
        self.source
            .tag
            .clone()
            .unwrap_or_else(|| self.package.version.to_string())
    }

    /// Names of every required dependency, in declaration order.
    pub fn required_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.name.as_str())
    }

    fn validate(&self) -> Result<()> {
        let configs = &self.build.configurations;
        if configs.is_empty() {
            bail!("`build.configurations` must name at least one configuration");
        }

        let mut seen = BTreeSet::new();
        for label in configs {
            if label.trim().is_empty() {
                bail!("configuration labels must not be empty");
            }
            if !seen.insert(label.as_str()) {
                bail!("configuration `{}` is listed twice", label);
            }
        }

        let mut names = BTreeSet::new();
        for dep in &self.dependencies {
            if !names.insert(dep.name.as_str()) {
                bail!("dependency `{}` is declared twice", dep.name);
            }
        }

        for (var, derived) in &self.path_variables {
            if !names.contains(derived.dependency.as_str()) {
                bail!(
                    "path variable `{}` refers to undeclared dependency `{}`",
                    var,
                    derived.dependency
                );
            }
        }

        if self.options.merge_package {
            self.validate_merge()?;
        }

        for rule in &self.source.patches {
            if rule.file().is_absolute() {
                bail!(
                    "patch file `{}` must be relative to the checkout",
                    rule.file().display()
                );
            }
        }

        Ok(())
    }

    /// Merge labels must be built configurations and `to` cannot also be a source.
    pub fn validate_merge(&self) -> Result<()> {
        let configs = &self.build.configurations;
        if !configs.contains(&self.merge.to) {
            bail!(
                "merge target `{}` is not one of the configurations: {}",
                self.merge.to,
                configs.join(", ")
            );
        }
        for from in &self.merge.from {
            if from == &self.merge.to {
                bail!("configuration `{}` cannot merge into itself", from);
            }
            if !configs.contains(from) {
                bail!(
                    "merge source `{}` is not one of the configurations: {}",
                    from,
                    configs.join(", ")
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: &str = r#"
[package]
name = "xeus-python"
version = "0.15.12"

[package.headers]
dir = "src/cpp"

[source]
url = "https://github.com/jupyter-xeus/xeus-python.git"

[[source.patch]]
file = "CMakeLists.txt"
search = "cmake_minimum_required(VERSION 3.4.3)"
replace = "cmake_minimum_required(VERSION 3.21)"

[[source.patch]]
file = "CMakeLists.txt"
append = "add_dependencies(xpython xeus-python-static xeus-python)\n"

[variables]
PythonLibsNew_FIND_VERSION = "3.11"

[[dependency]]
name = "xeus-zmq"
include = false

[[dependency]]
name = "nlohmann_json"
forward_root = false
include = true

[path_variables]
ZeroMQ_ROOT = { dependency = "xeus-zmq", subdir = "CMake" }
"#;

    #[test]
    fn test_parse_recipe() {
        let recipe = Recipe::parse(RECIPE).unwrap();
        assert_eq!(recipe.package.name, "xeus-python");
        assert_eq!(recipe.tag(), "0.15.12");
        assert_eq!(recipe.source.checkout_name(), "xeus-python");
        assert_eq!(recipe.source.patches.len(), 2);
        assert!(matches!(recipe.source.patches[0], PatchRule::Replace { .. }));
        assert!(matches!(recipe.source.patches[1], PatchRule::Append { .. }));
        assert_eq!(recipe.build.configurations, vec!["Debug", "Release"]);
        assert!(recipe.options.shared);
        assert_eq!(
            recipe.required_dependencies().collect::<Vec<_>>(),
            vec!["xeus-zmq", "nlohmann_json"]
        );
        assert_eq!(recipe.dependencies[0].root_variable().as_deref(), Some("xeus-zmq_ROOT"));
        assert_eq!(recipe.dependencies[1].root_variable(), None);
    }

    #[test]
    fn test_rejects_unknown_path_variable_dependency() {
        let text = RECIPE.replace("dependency = \"xeus-zmq\"", "dependency = \"zeromq\"");
        let err = Recipe::parse(&text).unwrap_err();
        assert!(err.to_string().contains("undeclared dependency `zeromq`"));
    }

    #[test]
    fn test_rejects_duplicate_configuration() {
        let text = format!("{}\n[build]\nconfigurations = [\"Debug\", \"Debug\"]\n", RECIPE);
        assert!(Recipe::parse(&text).is_err());
    }

    #[test]
    fn test_merge_validation_only_when_enabled() {
        let text = format!("{}\n[merge]\nfrom = [\"Debug\"]\nto = \"MinSizeRel\"\n", RECIPE);
        assert!(Recipe::parse(&text).is_ok());

        let enabled = text.replace("[variables]", "[options]\nmerge_package = true\n\n[variables]");
        let err = Recipe::parse(&enabled).unwrap_err();
        assert!(err.to_string().contains("MinSizeRel"));
    }

    #[test]
    fn test_shipped_xeus_python_recipe() {
        let recipe = Recipe::parse(crate::test_support::XEUS_PYTHON_RECIPE).unwrap();
        assert_eq!(recipe.package.version, Version::new(0, 15, 12));
        assert_eq!(recipe.package.headers.dir.as_deref(), Some(Path::new("src/cpp")));
        assert_eq!(recipe.source.patches.len(), 7);
        assert!(!recipe.options.merge_package);
        assert_eq!(recipe.merge.from, vec!["Debug"]);
        assert_eq!(recipe.merge.to, "Release");

        let included: Vec<&str> = recipe
            .dependencies
            .iter()
            .filter(|d| d.include)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(
            included,
            vec!["nlohmann_json", "xeus", "xtl", "pybind11", "pybind11_json"]
        );

        let forwarded: Vec<String> = recipe
            .dependencies
            .iter()
            .filter_map(|d| d.root_variable())
            .collect();
        assert_eq!(
            forwarded,
            vec!["xeus_ROOT", "xeus-zmq_ROOT", "pybind11_ROOT", "pybind11_json_ROOT"]
        );
    }

    #[test]
    fn test_checkout_name_from_local_path() {
        let spec = SourceSpec {
            url: "/srv/mirrors/xeus-python/".to_string(),
            tag: None,
            checkout: None,
            patches: Vec::new(),
        };
        assert_eq!(spec.checkout_name(), "xeus-python");
    }
}
