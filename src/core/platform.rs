//! Platform profiles.
//!
//! Everything that differs between host platform families (generator choice,
//! artifact type rules, debug-symbol handling, extra variables and lookups)
//! lives in one table built by [`PlatformProfile::for_family`]. The rest of
//! the crate consults the profile instead of branching on the platform.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::core::artifact::{ArtifactKind, PackageDir};

/// Host operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Windows,
    Macos,
    Linux,
    Other,
}

impl PlatformFamily {
    /// Detect the family of the host this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            PlatformFamily::Windows
        } else if cfg!(target_os = "macos") {
            PlatformFamily::Macos
        } else if cfg!(target_os = "linux") {
            PlatformFamily::Linux
        } else {
            PlatformFamily::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFamily::Windows => "windows",
            PlatformFamily::Macos => "macos",
            PlatformFamily::Linux => "linux",
            PlatformFamily::Other => "other",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(PlatformFamily::Windows),
            "macos" | "darwin" => Ok(PlatformFamily::Macos),
            "linux" => Ok(PlatformFamily::Linux),
            "other" => Ok(PlatformFamily::Other),
            _ => Err(format!(
                "invalid platform '{}'; expected 'windows', 'macos', 'linux', or 'other'",
                s
            )),
        }
    }
}

/// CMake generator selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Generator {
    VisualStudio,
    Xcode,
    NinjaMultiConfig,
    /// Let the generator tool pick its own default.
    Default,
    /// Explicitly named generator from configuration.
    Named(String),
}

impl Generator {
    /// Parse a generator name, mapping the well-known ones.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Visual Studio 17 2022" => Generator::VisualStudio,
            "Xcode" => Generator::Xcode,
            "Ninja Multi-Config" => Generator::NinjaMultiConfig,
            other => Generator::Named(other.to_string()),
        }
    }

    /// Value for `-G`, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Generator::VisualStudio => Some("Visual Studio 17 2022"),
            Generator::Xcode => Some("Xcode"),
            Generator::NinjaMultiConfig => Some("Ninja Multi-Config"),
            Generator::Default => None,
            Generator::Named(name) => Some(name),
        }
    }

    /// Whether one build tree holds every configuration (`--config` selects).
    pub fn is_multi_config(&self) -> bool {
        match self {
            Generator::VisualStudio | Generator::Xcode | Generator::NinjaMultiConfig => true,
            Generator::Default => false,
            Generator::Named(name) => {
                name.contains("Multi-Config") || name.starts_with("Visual Studio") || name == "Xcode"
            }
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("<default>"))
    }
}

/// Maps a file extension to an artifact kind and its package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRule {
    pub extension: &'static str,
    pub kind: ArtifactKind,
    pub dest: PackageDir,
}

const fn rule(extension: &'static str, kind: ArtifactKind, dest: PackageDir) -> TypeRule {
    TypeRule {
        extension,
        kind,
        dest,
    }
}

/// A variable whose value comes from running a host tool, e.g.
/// `OpenMP_ROOT` from `brew --prefix libomp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvLookup {
    pub variable: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

/// Everything platform-specific, in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    pub family: PlatformFamily,
    pub generator: Generator,
    pub type_rules: Vec<TypeRule>,
    /// Whether the toolchain writes debug info to separate symbol files
    pub splits_debug_symbols: bool,
    pub extra_variables: Vec<(&'static str, &'static str)>,
    pub env_lookups: Vec<EnvLookup>,
}

impl PlatformProfile {
    /// Look up the profile of a platform family.
    pub fn for_family(family: PlatformFamily) -> Self {
        use ArtifactKind::*;
        use PackageDir::*;

        match family {
            PlatformFamily::Windows => PlatformProfile {
                family,
                generator: Generator::VisualStudio,
                type_rules: vec![
                    rule("exe", Executable, Bin),
                    rule("dll", DynamicLibrary, Bin),
                    rule("lib", ImportLibrary, Lib),
                    rule("pdb", DebugSymbols, Lib),
                ],
                splits_debug_symbols: true,
                extra_variables: Vec::new(),
                env_lookups: Vec::new(),
            },
            PlatformFamily::Macos => PlatformProfile {
                family,
                generator: Generator::Xcode,
                type_rules: vec![rule("dylib", DynamicLibrary, Lib), rule("a", Archive, Lib)],
                splits_debug_symbols: false,
                extra_variables: Vec::new(),
                env_lookups: vec![EnvLookup {
                    variable: "OpenMP_ROOT",
                    program: "brew",
                    args: &["--prefix", "libomp"],
                }],
            },
            PlatformFamily::Linux => PlatformProfile {
                family,
                generator: Generator::NinjaMultiConfig,
                type_rules: vec![rule("so", DynamicLibrary, Lib), rule("a", Archive, Lib)],
                splits_debug_symbols: false,
                extra_variables: vec![("CMAKE_CONFIGURATION_TYPES", "Debug;Release;RelWithDebInfo")],
                env_lookups: Vec::new(),
            },
            PlatformFamily::Other => PlatformProfile {
                family,
                generator: Generator::Default,
                type_rules: vec![rule("so", DynamicLibrary, Lib), rule("a", Archive, Lib)],
                splits_debug_symbols: false,
                extra_variables: Vec::new(),
                env_lookups: Vec::new(),
            },
        }
    }

    /// Profile of the host.
    pub fn current() -> Self {
        Self::for_family(PlatformFamily::current())
    }

    /// Replace the generator choice.
    pub fn with_generator(mut self, generator: Generator) -> Self {
        self.generator = generator;
        self
    }

    /// The rule matching a file's extension (case-insensitive), if any.
    pub fn rule_for(&self, path: &Path) -> Option<&TypeRule> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.type_rules.iter().find(|r| r.extension == ext)
    }

    /// Package directory for an artifact kind.
    pub fn dest_for(&self, kind: ArtifactKind) -> Option<PackageDir> {
        self.type_rules.iter().find(|r| r.kind == kind).map(|r| r.dest)
    }

    /// Debug symbols are only collected for debug-like configurations on a
    /// symbol-splitting toolchain.
    pub fn collects_debug_symbols(&self, label: &str, debug_like: &[String]) -> bool {
        self.splits_debug_symbols && debug_like.iter().any(|l| l == label)
    }
}
