//! Artifact collection from an install tree into the staging area.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::core::artifact::{Artifact, ArtifactKind, ConfigurationOutput};
use crate::core::errors::PipelineError;
use crate::core::platform::PlatformProfile;
use crate::util::fs::{copy_file, ensure_dir, remove_dir_all_if_exists};
use crate::util::hash::sha256_file;

/// What collection produced for one configuration.
#[derive(Debug, Clone)]
pub struct Collected {
    pub output: ConfigurationOutput,
    pub warnings: Vec<String>,
}

/// Copies artifacts matching the profile's type rules into
/// `<staging>/<kind>/<label>/`, flattening directories.
pub struct ArtifactCollector<'a> {
    profile: &'a PlatformProfile,
    staging_root: PathBuf,
    debug_like: &'a [String],
}

impl<'a> ArtifactCollector<'a> {
    pub fn new(
        profile: &'a PlatformProfile,
        staging_root: impl Into<PathBuf>,
        debug_like: &'a [String],
    ) -> Self {
        ArtifactCollector {
            profile,
            staging_root: staging_root.into(),
            debug_like,
        }
    }

    /// Staging directory of one kind and configuration.
    pub fn staging_dir(&self, kind: ArtifactKind, label: &str) -> PathBuf {
        self.staging_root.join(kind.as_str()).join(label)
    }

    /// Collect `label`'s artifacts from `install_dir`.
    pub fn collect(&self, label: &str, install_dir: &Path) -> Result<Collected, PipelineError> {
        self.collect_inner(label, install_dir)
            .map_err(|e| PipelineError::Collect {
                configuration: label.to_string(),
                message: format!("{:#}", e),
            })
    }

    fn collect_inner(&self, label: &str, install_dir: &Path) -> Result<Collected> {
        let mut output = ConfigurationOutput::new(label, install_dir);
        let mut warnings = Vec::new();

        for kind in ArtifactKind::ALL {
            remove_dir_all_if_exists(&self.staging_dir(kind, label))?;
        }

        if !install_dir.is_dir() {
            let warning = format!(
                "install directory for `{}` does not exist: {}",
                label,
                install_dir.display()
            );
            tracing::warn!("{}", warning);
            warnings.push(warning);
            return Ok(Collected { output, warnings });
        }

        let symbols = self.profile.collects_debug_symbols(label, self.debug_like);
        let mut staged = BTreeSet::new();

        for entry in WalkDir::new(install_dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", install_dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(rule) = self.profile.rule_for(path) else {
                continue;
            };
            if rule.kind == ArtifactKind::DebugSymbols && !symbols {
                continue;
            }

            let file_name = entry.file_name().to_os_string();
            if !staged.insert((rule.kind, file_name.clone())) {
                let warning = format!(
                    "`{}` collides with an earlier {} of `{}`; skipped",
                    path.display(),
                    rule.kind,
                    label
                );
                tracing::warn!("{}", warning);
                warnings.push(warning);
                continue;
            }

            let dest_dir = self.staging_dir(rule.kind, label);
            ensure_dir(&dest_dir)?;
            let dest = dest_dir.join(&file_name);
            let size = copy_file(path, &dest)?;
            let sha256 = sha256_file(&dest)?;

            tracing::debug!("staged {} as {}", path.display(), rule.kind);
            output.artifacts.push(Artifact {
                path: dest,
                kind: rule.kind,
                size,
                sha256,
            });
        }

        Ok(Collected { output, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::PlatformFamily;

    fn debug_like() -> Vec<String> {
        vec!["Debug".to_string(), "RelWithDebInfo".to_string()]
    }

    fn touch(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn names(output: &ConfigurationOutput, kind: ArtifactKind) -> Vec<String> {
        output.of_kind(kind).map(|a| a.file_name()).collect()
    }

    fn windows_install(root: &Path) {
        touch(&root.join("bin/xpython.exe"), "exe");
        touch(&root.join("bin/xeus-python.dll"), "dll");
        touch(&root.join("lib/xeus-python.lib"), "lib");
        touch(&root.join("lib/xeus-python.pdb"), "pdb");
        touch(&root.join("include/xeus-python/xinterpreter.hpp"), "hdr");
        touch(&root.join("share/jupyter/kernels/xpython/kernel.json"), "{}");
    }

    #[test]
    fn test_windows_debug_collects_symbols() {
        let tmp = tempfile::TempDir::new().unwrap();
        let install = tmp.path().join("install/Debug");
        windows_install(&install);

        let profile = PlatformProfile::for_family(PlatformFamily::Windows);
        let dl = debug_like();
        let collector = ArtifactCollector::new(&profile, tmp.path().join("staging"), &dl);
        let collected = collector.collect("Debug", &install).unwrap();
        let out = &collected.output;

        assert_eq!(names(out, ArtifactKind::Executable), vec!["xpython.exe"]);
        assert_eq!(names(out, ArtifactKind::DynamicLibrary), vec!["xeus-python.dll"]);
        assert_eq!(names(out, ArtifactKind::ImportLibrary), vec!["xeus-python.lib"]);
        assert_eq!(names(out, ArtifactKind::DebugSymbols), vec!["xeus-python.pdb"]);
        assert_eq!(out.artifacts.len(), 4);
        assert!(tmp
            .path()
            .join("staging/debug-symbols/Debug/xeus-python.pdb")
            .is_file());
    }

    #[test]
    fn test_windows_release_skips_symbols() {
        let tmp = tempfile::TempDir::new().unwrap();
        let install = tmp.path().join("install/Release");
        windows_install(&install);

        let profile = PlatformProfile::for_family(PlatformFamily::Windows);
        let dl = debug_like();
        let collector = ArtifactCollector::new(&profile, tmp.path().join("staging"), &dl);
        let out = collector.collect("Release", &install).unwrap().output;

        assert!(names(&out, ArtifactKind::DebugSymbols).is_empty());
        assert_eq!(out.artifacts.len(), 3);
    }

    #[test]
    fn test_non_splitting_platform_never_collects_symbols() {
        let tmp = tempfile::TempDir::new().unwrap();
        let install = tmp.path().join("install/Debug");
        touch(&install.join("lib/libxeus-python.so"), "so");
        touch(&install.join("lib/libxeus-python.pdb"), "pdb");

        let profile = PlatformProfile::for_family(PlatformFamily::Linux);
        let dl = debug_like();
        let collector = ArtifactCollector::new(&profile, tmp.path().join("staging"), &dl);
        let out = collector.collect("Debug", &install).unwrap().output;

        assert_eq!(names(&out, ArtifactKind::DynamicLibrary), vec!["libxeus-python.so"]);
        assert_eq!(out.artifacts.len(), 1);
    }

    #[test]
    fn test_only_rule_extensions_are_staged() {
        let tmp = tempfile::TempDir::new().unwrap();
        let install = tmp.path().join("install/Release");
        touch(&install.join("lib/libxeus-python.a"), "a");
        touch(&install.join("lib/libxeus-python.dylib"), "dylib");
        touch(&install.join("lib/cmake/xeus-pythonConfig.cmake"), "cmake");
        touch(&install.join("bin/xpython"), "elf");

        let profile = PlatformProfile::for_family(PlatformFamily::Linux);
        let dl = debug_like();
        let collector = ArtifactCollector::new(&profile, tmp.path().join("staging"), &dl);
        let out = collector.collect("Release", &install).unwrap().output;

        assert_eq!(out.artifacts.len(), 1);
        assert_eq!(out.artifacts[0].kind, ArtifactKind::Archive);

        for entry in WalkDir::new(tmp.path().join("staging")) {
            let entry = entry.unwrap();
            if entry.file_type().is_file() {
                assert!(profile.rule_for(entry.path()).is_some());
            }
        }
    }

    #[test]
    fn test_flatten_collision_keeps_first() {
        let tmp = tempfile::TempDir::new().unwrap();
        let install = tmp.path().join("install/Release");
        touch(&install.join("a/libfoo.a"), "first");
        touch(&install.join("b/libfoo.a"), "second");

        let profile = PlatformProfile::for_family(PlatformFamily::Linux);
        let dl = debug_like();
        let collector = ArtifactCollector::new(&profile, tmp.path().join("staging"), &dl);
        let collected = collector.collect("Release", &install).unwrap();

        assert_eq!(collected.output.artifacts.len(), 1);
        assert_eq!(collected.warnings.len(), 1);
        let staged = tmp.path().join("staging/archive/Release/libfoo.a");
        assert_eq!(std::fs::read_to_string(staged).unwrap(), "first");
    }

    #[test]
    fn test_missing_install_dir_is_empty_with_warning() {
        let tmp = tempfile::TempDir::new().unwrap();
        let profile = PlatformProfile::for_family(PlatformFamily::Linux);
        let dl = debug_like();
        let collector = ArtifactCollector::new(&profile, tmp.path().join("staging"), &dl);
        let collected = collector
            .collect("Debug", &tmp.path().join("install/Debug"))
            .unwrap();

        assert!(collected.output.artifacts.is_empty());
        assert_eq!(collected.warnings.len(), 1);
    }

    #[test]
    fn test_recollect_drops_stale_staging() {
        let tmp = tempfile::TempDir::new().unwrap();
        let install = tmp.path().join("install/Release");
        touch(&install.join("lib/libold.a"), "old");

        let profile = PlatformProfile::for_family(PlatformFamily::Linux);
        let dl = debug_like();
        let collector = ArtifactCollector::new(&profile, tmp.path().join("staging"), &dl);
        collector.collect("Release", &install).unwrap();

        std::fs::remove_file(install.join("lib/libold.a")).unwrap();
        touch(&install.join("lib/libnew.a"), "new");
        collector.collect("Release", &install).unwrap();

        let staged = tmp.path().join("staging/archive/Release");
        assert!(!staged.join("libold.a").exists());
        assert!(staged.join("libnew.a").is_file());
    }
}
