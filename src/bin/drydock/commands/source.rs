//! `drydock source` command

use anyhow::Result;

use crate::cli::{GlobalArgs, SourceArgs};
use crate::commands::Session;
use drydock::core::DependencyMap;
use drydock::ops::Pipeline;
use drydock::sources::RetrievalStatus;

pub fn execute(global: &GlobalArgs, args: SourceArgs) -> Result<()> {
    let session = Session::load(global)?;

    let mut opts = session.pipeline_options(&Default::default())?;
    opts.offline |= args.offline;

    let deps = DependencyMap::new();
    let pipeline = Pipeline::new(&session.recipe, &deps, &session.layout, &opts);

    let mut warnings = Vec::new();
    let prepared = pipeline.prepare_source(Box::new(session.git_source()), &mut warnings)?;

    match prepared.retrieval {
        RetrievalStatus::Fetched { ref commit } => {
            eprintln!("{:>12} {} at {}", "Fetched", session.recipe.tag(), commit);
        }
        RetrievalStatus::Skipped => eprintln!("{:>12} retrieval (offline)", "Skipped"),
        RetrievalStatus::Failed { ref warning } => eprintln!("{:>12} {}", "Warning", warning),
    }

    let patches = &prepared.patches;
    if patches.up_to_date {
        eprintln!("{:>12} patches already applied", "Fresh");
    } else {
        eprintln!(
            "{:>12} {} ({} applied, {} already present)",
            "Patched",
            prepared.path.display(),
            patches.applied,
            patches.already_applied
        );
    }

    Ok(())
}
