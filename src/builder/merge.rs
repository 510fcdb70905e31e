//! Merging the staged outputs of several configurations.
//!
//! Each configuration is turned into a [`Layer`]: package-relative paths
//! (`lib/foo.a`, `bin/foo.dll`) mapped to staged files. Layers are folded in
//! the order given by [`MergePlan::precedence`]; the first layer to claim a
//! path keeps it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::artifact::ConfigurationOutput;
use crate::core::platform::PlatformProfile;
use crate::core::recipe::MergeSection;

/// One configuration's artifacts keyed by package-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub label: String,
    pub entries: BTreeMap<PathBuf, PathBuf>,
}

impl Layer {
    pub fn new(label: impl Into<String>) -> Self {
        Layer {
            label: label.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add a file at a package-relative path.
    pub fn insert(&mut self, rel: impl Into<PathBuf>, src: impl Into<PathBuf>) {
        self.entries.insert(rel.into(), src.into());
    }

    /// Build a layer from collected artifacts, placing each kind where the
    /// profile says.
    pub fn from_output(output: &ConfigurationOutput, profile: &PlatformProfile) -> Self {
        let mut layer = Layer::new(output.label.clone());
        for artifact in &output.artifacts {
            if let Some(dest) = profile.dest_for(artifact.kind) {
                let rel = Path::new(dest.as_str()).join(artifact.file_name());
                layer.insert(rel, artifact.path.clone());
            }
        }
        layer
    }
}

/// Which configurations merge into which, and in what order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergePlan {
    /// Merge-from labels, highest precedence first
    pub from: Vec<String>,
    /// Merge-to label; wins every conflict
    pub to: String,
}

impl MergePlan {
    pub fn new(from: Vec<String>, to: impl Into<String>) -> Self {
        MergePlan { from, to: to.into() }
    }

    /// Labels in precedence order: the target, then each source as declared.
    pub fn precedence(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.to.as_str()).chain(self.from.iter().map(String::as_str))
    }

    /// Whether `label` takes part in the merge.
    pub fn involves(&self, label: &str) -> bool {
        self.to == label || self.from.iter().any(|l| l == label)
    }
}

impl From<&MergeSection> for MergePlan {
    fn from(section: &MergeSection) -> Self {
        MergePlan::new(section.from.clone(), section.to.clone())
    }
}

/// A path claimed by more than one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub path: PathBuf,
    pub kept: String,
    pub dropped: String,
}

/// Result of folding layers.
#[derive(Debug, Clone, Default)]
pub struct Merged {
    /// Package-relative path -> (source file, origin label)
    pub entries: BTreeMap<PathBuf, (PathBuf, String)>,
    /// Labels that contributed a layer, in precedence order
    pub merged: Vec<String>,
    /// Labels named by the plan without a layer
    pub missing: Vec<String>,
    pub conflicts: Vec<Conflict>,
}

/// Fold `layers` following `plan`. Layers not named by the plan are ignored.
pub fn merge_layers(plan: &MergePlan, layers: &[Layer]) -> Merged {
    let mut merged = Merged::default();

    for label in plan.precedence() {
        let Some(layer) = layers.iter().find(|l| l.label == label) else {
            merged.missing.push(label.to_string());
            continue;
        };
        merged.merged.push(label.to_string());

        for (rel, src) in &layer.entries {
            match merged.entries.get(rel) {
                Some((_, owner)) => {
                    tracing::debug!(
                        "{}: keeping `{}` version over `{}`",
                        rel.display(),
                        owner,
                        label
                    );
                    merged.conflicts.push(Conflict {
                        path: rel.clone(),
                        kept: owner.clone(),
                        dropped: label.to_string(),
                    });
                }
                None => {
                    merged
                        .entries
                        .insert(rel.clone(), (src.clone(), label.to_string()));
                }
            }
        }
    }

    merged
}

/// Summary of the merge step, for the run report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub ran: bool,
    pub to: Option<String>,
    pub merged: Vec<String>,
    pub skipped: Vec<String>,
    pub files: usize,
    pub conflicts: Vec<Conflict>,
    pub error: Option<String>,
}

impl MergeReport {
    pub fn from_merged(plan: &MergePlan, merged: &Merged) -> Self {
        MergeReport {
            ran: true,
            to: Some(plan.to.clone()),
            merged: merged.merged.clone(),
            skipped: merged.missing.clone(),
            files: merged.entries.len(),
            conflicts: merged.conflicts.clone(),
            error: None,
        }
    }
}
