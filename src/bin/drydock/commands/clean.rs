//! `drydock clean` command

use anyhow::Result;

use crate::cli::{CleanArgs, GlobalArgs};
use crate::commands::Session;
use drydock::ops::{clean, CleanOptions};

pub fn execute(global: &GlobalArgs, args: CleanArgs) -> Result<()> {
    let session = Session::load(global)?;

    let removed = clean(&session.layout, &CleanOptions { source: args.source })?;
    if removed.is_empty() {
        eprintln!("     Nothing to clean");
    }
    for dir in removed {
        eprintln!("{:>12} {}", "Removed", dir.display());
    }

    Ok(())
}
