//! Source preparation: retrieve, then patch.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::errors::PipelineError;
use crate::core::recipe::PatchRule;
use crate::sources::patch::{apply_patches, PatchReport, PATCH_MARKER};
use crate::sources::Source;

/// How retrieval went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RetrievalStatus {
    /// Checked out the pinned tag at this commit
    Fetched { commit: String },
    /// Retrieval was not attempted (offline)
    Skipped,
    /// Retrieval failed; the existing tree was used as-is
    Failed { warning: String },
}

/// A source tree ready for configuration.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedSource {
    pub path: PathBuf,
    pub retrieval: RetrievalStatus,
    pub patches: PatchReport,
}

/// Drives a [`Source`] and the recipe's patch rules.
pub struct SourcePreparer<'a> {
    source: Box<dyn Source + 'a>,
    rules: &'a [PatchRule],
    offline: bool,
}

impl<'a> SourcePreparer<'a> {
    pub fn new(source: Box<dyn Source + 'a>, rules: &'a [PatchRule]) -> Self {
        SourcePreparer {
            source,
            rules,
            offline: false,
        }
    }

    /// Skip retrieval and use whatever tree exists.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Step 1: retrieval. Failures come back as `PipelineError::Retrieval`.
    pub fn retrieve(&mut self) -> Result<RetrievalStatus, PipelineError> {
        if self.offline {
            tracing::info!(
                "Offline: using existing tree at {}",
                self.source.checkout_path().display()
            );
            return Ok(RetrievalStatus::Skipped);
        }

        let commit = self
            .source
            .retrieve()
            .map_err(|e| PipelineError::Retrieval {
                url: self.source.name().to_string(),
                tag: self.source.tag().to_string(),
                message: format!("{:#}", e),
            })?;

        // A fresh checkout restores the original files.
        let marker = self.source.checkout_path().join(PATCH_MARKER);
        if marker.exists() {
            if let Err(e) = std::fs::remove_file(&marker) {
                tracing::warn!("failed to remove {}: {}", marker.display(), e);
            }
        }

        Ok(RetrievalStatus::Fetched { commit })
    }

    /// Step 2: patching. Requires a tree to exist.
    pub fn patch(&self) -> Result<PatchReport, PipelineError> {
        let root = self.source.checkout_path();
        if !root.is_dir() {
            return Err(PipelineError::Patch {
                file: root.to_path_buf(),
                message: "no source tree to patch (retrieval failed and nothing was fetched before)"
                    .to_string(),
            });
        }
        apply_patches(root, self.rules)
    }

    pub fn checkout_path(&self) -> PathBuf {
        self.source.checkout_path().to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{xeus_python_recipe, StaticSource, CMAKE_LISTS};

    #[test]
    fn test_retrieve_then_patch() {
        let tmp = tempfile::TempDir::new().unwrap();
        let checkout = tmp.path().join("xeus-python");
        let recipe = xeus_python_recipe();
        let source = StaticSource::new(&checkout).file("CMakeLists.txt", CMAKE_LISTS);

        let mut preparer = SourcePreparer::new(Box::new(source), &recipe.source.patches);
        let status = preparer.retrieve().unwrap();
        assert!(matches!(status, RetrievalStatus::Fetched { .. }));

        let report = preparer.patch().unwrap();
        assert_eq!(report.applied, recipe.source.patches.len());
        let text = std::fs::read_to_string(checkout.join("CMakeLists.txt")).unwrap();
        assert!(text.starts_with("cmake_minimum_required(VERSION 3.21)"));
    }

    #[test]
    fn test_refetch_reapplies_patches() {
        let tmp = tempfile::TempDir::new().unwrap();
        let checkout = tmp.path().join("xeus-python");
        let recipe = xeus_python_recipe();

        for _ in 0..2 {
            let source = StaticSource::new(&checkout).file("CMakeLists.txt", CMAKE_LISTS);
            let mut preparer = SourcePreparer::new(Box::new(source), &recipe.source.patches);
            preparer.retrieve().unwrap();
            let report = preparer.patch().unwrap();
            assert!(!report.up_to_date);
            assert_eq!(report.applied, recipe.source.patches.len());
        }
    }

    #[test]
    fn test_offline_skips_retrieval() {
        let tmp = tempfile::TempDir::new().unwrap();
        let checkout = tmp.path().join("xeus-python");
        std::fs::create_dir_all(&checkout).unwrap();
        std::fs::write(checkout.join("CMakeLists.txt"), CMAKE_LISTS).unwrap();
        let recipe = xeus_python_recipe();

        let source = StaticSource::new(&checkout).unreachable();
        let mut preparer =
            SourcePreparer::new(Box::new(source), &recipe.source.patches).offline(true);
        assert_eq!(preparer.retrieve().unwrap(), RetrievalStatus::Skipped);
        assert_eq!(
            preparer.patch().unwrap().applied,
            recipe.source.patches.len()
        );
    }

    #[test]
    fn test_failed_retrieval_without_tree() {
        let tmp = tempfile::TempDir::new().unwrap();
        let recipe = xeus_python_recipe();
        let source = StaticSource::new(tmp.path().join("missing")).unreachable();
        let mut preparer = SourcePreparer::new(Box::new(source), &recipe.source.patches);

        let err = preparer.retrieve().unwrap_err();
        assert!(matches!(err, PipelineError::Retrieval { .. }));
        assert!(err.to_string().contains("network is unreachable"));

        let err = preparer.patch().unwrap_err();
        assert!(matches!(err, PipelineError::Patch { .. }));
    }
}
