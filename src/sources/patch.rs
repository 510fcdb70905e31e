//! Textual patches against the retrieved tree.
//!
//! Patches are applied so that re-running against an already-patched tree is
//! a no-op:
//!
//! - a marker file records the fingerprint of the rule set last applied in
//!   full; a matching marker skips the whole step;
//! - without a matching marker each rule checks the file content itself.
//!   Occurrences of the search text that already sit inside the replacement
//!   text are left alone, and appended blocks are not appended twice.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::errors::PipelineError;
use crate::core::recipe::PatchRule;
use crate::util::fs::{read_to_string, write_string};
use crate::util::hash::Fingerprint;

/// Marker written to the checkout root after a full successful application.
pub const PATCH_MARKER: &str = ".drydock-patches";

/// Outcome of applying a rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    /// Rules that changed a file
    pub applied: usize,
    /// Rules whose effect was already present
    pub already_applied: usize,
    /// The marker matched and nothing was inspected
    pub up_to_date: bool,
}

/// What one rule did to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleOutcome {
    Applied,
    AlreadyApplied,
}

/// Fingerprint of an ordered rule set.
pub fn rules_fingerprint(rules: &[PatchRule]) -> String {
    let mut fp = Fingerprint::new();
    for rule in rules {
        match rule {
            PatchRule::Replace {
                file,
                search,
                replace,
            } => {
                fp.update_str("replace")
                    .update_str(&file.to_string_lossy())
                    .update_str(search)
                    .update_str(replace);
            }
            PatchRule::Append { file, append } => {
                fp.update_str("append")
                    .update_str(&file.to_string_lossy())
                    .update_str(append);
            }
        }
    }
    fp.finish()
}

/// Apply `rules` in order to the tree at `root`.
pub fn apply_patches(root: &Path, rules: &[PatchRule]) -> Result<PatchReport, PipelineError> {
    let fingerprint = rules_fingerprint(rules);
    let marker = root.join(PATCH_MARKER);

    if let Ok(existing) = std::fs::read_to_string(&marker) {
        if existing.trim() == fingerprint {
            tracing::info!("Patches already applied to {}", root.display());
            return Ok(PatchReport {
                up_to_date: true,
                ..PatchReport::default()
            });
        }
    }

    let mut report = PatchReport::default();
    for rule in rules {
        let path = root.join(rule.file());
        match apply_rule(&path, rule)? {
            RuleOutcome::Applied => report.applied += 1,
            RuleOutcome::AlreadyApplied => report.already_applied += 1,
        }
    }

    write_string(&marker, &fingerprint).map_err(|e| patch_error(&marker, e))?;

    tracing::info!(
        "Patched {} ({} applied, {} already present)",
        root.display(),
        report.applied,
        report.already_applied
    );
    Ok(report)
}

fn apply_rule(path: &Path, rule: &PatchRule) -> Result<RuleOutcome, PipelineError> {
    let content = read_to_string(path).map_err(|e| patch_error(path, e))?;

    let (patched, outcome) = match rule {
        PatchRule::Replace {
            search, replace, ..
        } => replace_outside_replacements(&content, search, replace)
            .ok_or_else(|| PipelineError::Patch {
                file: path.to_path_buf(),
                message: format!("search text not found: `{}`", search),
            })?,
        PatchRule::Append { append, .. } => {
            if content.contains(append.as_str()) {
                (content, RuleOutcome::AlreadyApplied)
            } else {
                let mut patched = content;
                if !patched.is_empty() && !patched.ends_with('\n') {
                    patched.push('\n');
                }
                patched.push_str(append);
                (patched, RuleOutcome::Applied)
            }
        }
    };

    if outcome == RuleOutcome::Applied {
        tracing::debug!("patching {}", path.display());
        write_string(path, &patched).map_err(|e| patch_error(path, e))?;
    }
    Ok(outcome)
}

/// Replace every `search` occurrence that is not already part of a `replace`
/// occurrence. Returns `None` when neither text is present.
fn replace_outside_replacements(
    content: &str,
    search: &str,
    replace: &str,
) -> Option<(String, RuleOutcome)> {
    if search.is_empty() {
        return None;
    }

    let segments: Vec<&str> = if replace.is_empty() {
        vec![content]
    } else {
        content.split(replace).collect()
    };

    if !segments.iter().any(|s| s.contains(search)) {
        if !replace.is_empty() && segments.len() > 1 {
            return Some((content.to_string(), RuleOutcome::AlreadyApplied));
        }
        return None;
    }

    let patched = segments
        .iter()
        .map(|s| s.replace(search, replace))
        .collect::<Vec<_>>()
        .join(replace);
    Some((patched, RuleOutcome::Applied))
}

fn patch_error(path: &Path, err: anyhow::Error) -> PipelineError {
    PipelineError::Patch {
        file: PathBuf::from(path),
        message: format!("{:#}", err),
    }
}
