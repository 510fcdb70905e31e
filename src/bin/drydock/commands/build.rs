//! `drydock build` command

use anyhow::{bail, Result};

use crate::cli::{BuildArgs, GlobalArgs, MessageFormat};
use crate::commands::Session;
use drydock::builder::{CMakeTool, MergeReport};
use drydock::core::ArtifactKind;
use drydock::ops::{Pipeline, PipelineReport};

pub fn execute(global: &GlobalArgs, args: BuildArgs) -> Result<()> {
    let session = Session::load(global)?;

    let mut opts = session.pipeline_options(&args.configure)?;
    opts.offline |= args.offline;
    let deps = session.dependencies(&args.configure)?;

    // Jobs: CLI > config > generator default
    let jobs = args.jobs.or(session.config.build.jobs);
    let tool = CMakeTool::locate(session.config.build.cmake.as_deref())?
        .jobs(jobs)
        .verbose(session.config.build.verbose);

    let pipeline = Pipeline::new(&session.recipe, &deps, &session.layout, &opts);
    let report = pipeline.run(Box::new(session.git_source()), &tool)?;

    match args.message_format {
        MessageFormat::Json => println!("{}", report.to_json()?),
        MessageFormat::Human => print_summary(&report, opts.options.merge_package),
    }

    if !report.succeeded() {
        let failed: Vec<&str> = report
            .failed_configurations()
            .map(|c| c.label.as_str())
            .collect();
        if failed.is_empty() {
            bail!("packaging failed");
        }
        bail!("{} configuration(s) failed: {}", failed.len(), failed.join(", "));
    }

    Ok(())
}

fn print_summary(report: &PipelineReport, merge_enabled: bool) {
    for config in &report.configurations {
        if config.succeeded() {
            let counts: Vec<String> = ArtifactKind::ALL
                .iter()
                .filter_map(|&kind| {
                    let n = report.count(&config.label, kind);
                    (n > 0).then(|| format!("{} {}", n, kind))
                })
                .collect();
            eprintln!(
                "{:>12} `{}` ({})",
                "Finished",
                config.label,
                if counts.is_empty() {
                    "no artifacts".to_string()
                } else {
                    counts.join(", ")
                }
            );
        } else {
            eprintln!(
                "{:>12} `{}`: {}",
                "Failed",
                config.label,
                config.error.as_deref().unwrap_or("unknown error")
            );
        }
        for warning in &config.warnings {
            eprintln!("{:>12} {}", "Warning", warning);
        }
    }

    for line in merge_lines(&report.merge, merge_enabled) {
        eprintln!("{}", line);
    }

    eprintln!(
        "{:>12} {} v{} -> {}",
        "Packaged",
        report.package,
        report.version,
        report.package_dir.display()
    );
}

/// Status lines saying whether and how the merge step ran.
fn merge_lines(merge: &MergeReport, enabled: bool) -> Vec<String> {
    if let Some(ref error) = merge.error {
        return vec![format!("{:>12} {}", "Failed", error)];
    }
    if !enabled {
        return vec![format!("{:>12} merge (merge_package=false)", "Skipped")];
    }
    if !merge.ran {
        return vec![format!("{:>12} merge (no configuration finished)", "Skipped")];
    }

    let mut lines = vec![format!(
        "{:>12} {} into `{}` ({} files, {} overridden)",
        "Merged",
        merge.merged.join(", "),
        merge.to.as_deref().unwrap_or_default(),
        merge.files,
        merge.conflicts.len()
    )];
    if !merge.skipped.is_empty() {
        lines.push(format!("{:>12} {} (not built)", "Skipped", merge.skipped.join(", ")));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_disabled_is_reported() {
        let lines = merge_lines(&MergeReport::default(), false);
        assert_eq!(lines, vec!["     Skipped merge (merge_package=false)"]);
    }

    #[test]
    fn test_merge_ran_with_missing_configuration() {
        let merge = MergeReport {
            ran: true,
            to: Some("Release".to_string()),
            merged: vec!["Release".to_string()],
            skipped: vec!["Debug".to_string()],
            files: 4,
            ..MergeReport::default()
        };
        let lines = merge_lines(&merge, true);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Merged Release into `Release` (4 files, 0 overridden)"));
        assert!(lines[1].ends_with("Skipped Debug (not built)"));
    }

    #[test]
    fn test_merge_error_wins() {
        let merge = MergeReport {
            error: Some("package merge failed: none finished".to_string()),
            ..MergeReport::default()
        };
        let lines = merge_lines(&merge, true);
        assert_eq!(lines, vec!["      Failed package merge failed: none finished"]);
    }
}
