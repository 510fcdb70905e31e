//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod generate;
pub mod source;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::{ConfigureArgs, GlobalArgs};
use drydock::core::platform::{Generator, PlatformFamily, PlatformProfile};
use drydock::core::{DependencyMap, Recipe};
use drydock::ops::{Layout, PipelineOptions};
use drydock::sources::GitSource;
use drydock::util::{Config, GlobalContext};

/// A loaded recipe with its work directory and configuration.
pub struct Session {
    pub recipe_path: PathBuf,
    pub recipe: Recipe,
    pub config: Config,
    pub layout: Layout,
}

impl Session {
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let mut ctx = GlobalContext::new()?;
        ctx.set_work_dir(global.work_dir.clone());

        let recipe_path = match global.recipe {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => ctx.cwd().join(path),
            None => ctx.find_recipe()?,
        };
        let recipe = Recipe::load(&recipe_path)?;
        let config = ctx.load_config(&recipe_path);
        let layout = Layout::new(ctx.work_dir(&recipe_path));

        Ok(Session {
            recipe_path,
            recipe,
            config,
            layout,
        })
    }

    /// Git source for the recipe's checkout. Relative local paths resolve
    /// against the recipe directory.
    pub fn git_source(&self) -> GitSource {
        let url = &self.recipe.source.url;
        let remote = match self.recipe_path.parent() {
            Some(dir) if !url.contains("://") && !PathBuf::from(url).is_absolute() => {
                let local = dir.join(url);
                if local.exists() {
                    local.display().to_string()
                } else {
                    url.clone()
                }
            }
            _ => url.clone(),
        };
        GitSource::new(
            remote,
            self.recipe.tag(),
            self.layout.checkout(&self.recipe.source.checkout_name()),
        )
    }

    /// Options, platform and generator from the recipe, configuration and
    /// command line, in increasing precedence.
    pub fn pipeline_options(&self, args: &ConfigureArgs) -> Result<PipelineOptions> {
        let mut options = self.recipe.options.clone();
        for spec in &args.option {
            options.apply_override(spec)?;
        }
        if options.merge_package {
            self.recipe.validate_merge()?;
        }

        let family = match args.platform {
            Some(ref name) => name.parse::<PlatformFamily>().map_err(anyhow::Error::msg)?,
            None => PlatformFamily::current(),
        };

        let mut opts = PipelineOptions::new(options);
        opts.profile = PlatformProfile::for_family(family);
        opts.generator = args
            .generator
            .as_deref()
            .or(self.config.build.generator.as_deref())
            .map(Generator::from_name);
        opts.offline = self.config.source.offline;
        Ok(opts)
    }

    /// Dependency locations from `--deps` and `-d` entries, the latter winning.
    pub fn dependencies(&self, args: &ConfigureArgs) -> Result<DependencyMap> {
        let mut deps = match args.deps {
            Some(ref path) => DependencyMap::load(path)
                .with_context(|| format!("failed to load dependencies from {}", path.display()))?,
            None => DependencyMap::new(),
        };
        for entry in &args.dep {
            deps.insert(DependencyMap::parse_entry(entry)?);
        }
        Ok(deps)
    }
}
