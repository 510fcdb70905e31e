//! Artifact kinds and per-configuration outputs.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// What a collected file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Executable,
    DynamicLibrary,
    ImportLibrary,
    Archive,
    DebugSymbols,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Executable,
        ArtifactKind::DynamicLibrary,
        ArtifactKind::ImportLibrary,
        ArtifactKind::Archive,
        ArtifactKind::DebugSymbols,
    ];

    /// Directory name used under `staging/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Executable => "executable",
            ArtifactKind::DynamicLibrary => "dynamic-library",
            ArtifactKind::ImportLibrary => "import-library",
            ArtifactKind::Archive => "archive",
            ArtifactKind::DebugSymbols => "debug-symbols",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level package subdirectory an artifact is packaged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageDir {
    Bin,
    Lib,
}

impl PackageDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageDir::Bin => "bin",
            PackageDir::Lib => "lib",
        }
    }
}

/// One staged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Location in the staging area
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub size: u64,
    pub sha256: String,
}

impl Artifact {
    /// File name of the staged artifact.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// What one configuration produced once built, installed and collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationOutput {
    pub label: String,
    /// Install root the artifacts were collected from
    pub install_dir: PathBuf,
    pub artifacts: Vec<Artifact>,
}

impl ConfigurationOutput {
    pub fn new(label: impl Into<String>, install_dir: impl Into<PathBuf>) -> Self {
        ConfigurationOutput {
            label: label.into(),
            install_dir: install_dir.into(),
            artifacts: Vec::new(),
        }
    }

    /// Artifacts of one kind.
    pub fn of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(move |a| a.kind == kind)
    }
}
