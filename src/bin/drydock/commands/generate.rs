//! `drydock generate` command

use anyhow::Result;

use crate::cli::{GenerateArgs, GlobalArgs};
use crate::commands::Session;
use drydock::ops::Pipeline;

pub fn execute(global: &GlobalArgs, args: GenerateArgs) -> Result<()> {
    let session = Session::load(global)?;
    let opts = session.pipeline_options(&args.configure)?;
    let deps = session.dependencies(&args.configure)?;

    let pipeline = Pipeline::new(&session.recipe, &deps, &session.layout, &opts);
    let (set, _) = pipeline.generate()?;

    for warning in &set.warnings {
        eprintln!("{:>12} {}", "Warning", warning);
    }

    for config in &set.configs {
        println!("[{}]", config.label());
        println!("generator = {}", config.generator());
        for (name, value) in config.variables() {
            println!("{} = {}", name, value);
        }
        println!();
    }

    eprintln!(
        "{:>12} {}",
        "Wrote",
        session.layout.toolchain_file().display()
    );

    Ok(())
}
