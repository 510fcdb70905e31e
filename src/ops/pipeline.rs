//! The build-and-merge pipeline.
//!
//! Source Preparer → Configuration Builder → { Configuration Driver →
//! Artifact Collector } per configuration → Package Merger. Every phase
//! returns a [`PipelineError`]; [`disposition`] decides what happens next.

use std::path::PathBuf;

use crate::builder::collect::ArtifactCollector;
use crate::builder::config::{ConfigurationBuilder, ConfigurationSet};
use crate::builder::driver::{ConfigurationDriver, ConfigurationRun};
use crate::builder::merge::{merge_layers, Layer, MergePlan, MergeReport};
use crate::builder::package::PackageTree;
use crate::builder::tool::BuildTool;
use crate::builder::toolchain::ToolchainDescriptor;
use crate::core::artifact::ConfigurationOutput;
use crate::core::dependency::DependencyMap;
use crate::core::errors::PipelineError;
use crate::core::options::Options;
use crate::core::platform::{Generator, PlatformProfile};
use crate::core::policy::{disposition, Disposition};
use crate::core::recipe::Recipe;
use crate::ops::layout::Layout;
use crate::ops::report::{ConfigurationReport, PipelineReport};
use crate::sources::{PreparedSource, RetrievalStatus, Source, SourcePreparer};

/// Knobs for a run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub options: Options,
    pub profile: PlatformProfile,
    /// Generator forced from user configuration or the command line
    pub generator: Option<Generator>,
    pub offline: bool,
}

impl PipelineOptions {
    pub fn new(options: Options) -> Self {
        PipelineOptions {
            options,
            profile: PlatformProfile::current(),
            generator: None,
            offline: false,
        }
    }
}

/// One recipe, one dependency map, one work directory.
pub struct Pipeline<'a> {
    recipe: &'a Recipe,
    deps: &'a DependencyMap,
    layout: &'a Layout,
    opts: &'a PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        recipe: &'a Recipe,
        deps: &'a DependencyMap,
        layout: &'a Layout,
        opts: &'a PipelineOptions,
    ) -> Self {
        Pipeline {
            recipe,
            deps,
            layout,
            opts,
        }
    }

    /// Directory holding the checkout.
    pub fn checkout(&self) -> PathBuf {
        self.layout.checkout(&self.recipe.source.checkout_name())
    }

    /// Directory holding the top-level CMakeLists.txt.
    pub fn source_dir(&self) -> PathBuf {
        match self.recipe.build.source_subdir {
            Some(ref sub) => self.checkout().join(sub),
            None => self.checkout(),
        }
    }

    /// Derive every configuration and the toolchain directives.
    pub fn configurations(
        &self,
    ) -> Result<(ConfigurationSet, ToolchainDescriptor), PipelineError> {
        let mut descriptor = ToolchainDescriptor::new();
        let set = ConfigurationBuilder::new(
            self.recipe,
            &self.opts.profile,
            &self.opts.options,
            self.layout.build_root(),
        )
        .with_generator(self.opts.generator.clone())
        .build(self.deps, &mut descriptor)?;
        Ok((set, descriptor))
    }

    /// Derive the configurations and write the toolchain file.
    pub fn generate(&self) -> Result<(ConfigurationSet, ToolchainDescriptor), PipelineError> {
        let (set, descriptor) = self.configurations()?;
        self.write_toolchain(&descriptor)?;
        Ok((set, descriptor))
    }

    fn write_toolchain(&self, descriptor: &ToolchainDescriptor) -> Result<PathBuf, PipelineError> {
        let path = self.layout.toolchain_file();
        descriptor
            .write(&path)
            .map_err(|e| PipelineError::Toolchain {
                path: path.clone(),
                message: format!("{:#}", e),
            })?;
        Ok(path)
    }

    /// Retrieve and patch the source. Retrieval failures become warnings.
    pub fn prepare_source(
        &self,
        source: Box<dyn Source + '_>,
        warnings: &mut Vec<String>,
    ) -> Result<PreparedSource, PipelineError> {
        let mut preparer =
            SourcePreparer::new(source, &self.recipe.source.patches).offline(self.opts.offline);

        let retrieval = match preparer.retrieve() {
            Ok(status) => status,
            Err(err) => {
                let warning = absorb(err)?;
                warnings.push(warning.clone());
                RetrievalStatus::Failed { warning }
            }
        };

        let patches = preparer.patch()?;

        Ok(PreparedSource {
            path: preparer.checkout_path(),
            retrieval,
            patches,
        })
    }

    /// Run everything.
    ///
    /// Returns `Err` only for run-aborting errors. Per-configuration and
    /// merge failures are recorded in the report.
    pub fn run(
        &self,
        source: Box<dyn Source + '_>,
        tool: &dyn BuildTool,
    ) -> Result<PipelineReport, PipelineError> {
        let mut warnings = Vec::new();

        // dependencies first: nothing is fetched or built without them
        let (set, descriptor) = self.configurations()?;
        warnings.extend(set.warnings.iter().cloned());

        let prepared = self.prepare_source(source, &mut warnings)?;

        let toolchain_file = self.write_toolchain(&descriptor)?;

        let driver = ConfigurationDriver::new(
            tool,
            self.source_dir(),
            self.layout.build_root(),
            self.layout.install_root(),
            toolchain_file,
        );
        let collector = ArtifactCollector::new(
            &self.opts.profile,
            self.layout.staging_root(),
            &self.recipe.build.debug_like,
        );

        let mut runs = Vec::new();
        let mut outputs = Vec::new();
        for config in &set.configs {
            let mut run = driver.drive(config);
            if !run.is_failed() {
                run.begin_collect();
                match collector.collect(config.label(), &run.install_dir) {
                    Ok(collected) => {
                        run.warnings.extend(collected.warnings);
                        run.finish();
                        outputs.push(collected.output);
                    }
                    Err(err) => run.fail(&err),
                }
            }
            runs.push(run);
        }

        let package = PackageTree::new(self.layout.package_root());
        let (headers, merge) = match self.package(&package, &prepared, &runs, &outputs) {
            Ok(done) => done,
            Err(err) => match disposition(err.kind(), false) {
                Disposition::AbortMerge => {
                    tracing::warn!("{}", err);
                    let merge = MergeReport {
                        error: Some(err.to_string()),
                        ..MergeReport::default()
                    };
                    (0, merge)
                }
                _ => return Err(err),
            },
        };

        let configurations = runs
            .iter()
            .map(|run| {
                let output = outputs.iter().find(|o| o.label == run.label);
                ConfigurationReport::new(run, output)
            })
            .collect();

        let generator = set
            .configs
            .first()
            .map(|c| c.generator().to_string())
            .unwrap_or_default();

        Ok(PipelineReport {
            package: self.recipe.package.name.clone(),
            version: self.recipe.package.version.to_string(),
            platform: self.opts.profile.family,
            generator,
            source: Some(prepared),
            configurations,
            outputs,
            headers,
            merge,
            package_dir: package.root().to_path_buf(),
            warnings,
        })
    }

    /// Assemble the package tree from the configurations that finished.
    fn package(
        &self,
        package: &PackageTree,
        prepared: &PreparedSource,
        runs: &[ConfigurationRun],
        outputs: &[ConfigurationOutput],
    ) -> Result<(usize, MergeReport), PipelineError> {
        let merge_error = |e: anyhow::Error| PipelineError::Merge {
            message: format!("{:#}", e),
        };

        // stale output from an earlier run goes even when nothing finished
        let labels: Vec<&str> = runs.iter().map(|r| r.label.as_str()).collect();
        package.prepare(labels.as_slice()).map_err(merge_error)?;

        if outputs.is_empty() {
            tracing::warn!("no configuration finished; skipping packaging");
            return Ok((0, MergeReport::default()));
        }

        let header_src = match self.recipe.package.headers.dir {
            Some(ref dir) => Some(prepared.path.join(dir)),
            None => Some(outputs[0].install_dir.join("include")).filter(|p| p.is_dir()),
        };
        let headers = match header_src {
            Some(src) => package
                .copy_headers(&src, &self.recipe.package.headers.patterns)
                .map_err(merge_error)?,
            None => 0,
        };

        let layers: Vec<Layer> = outputs
            .iter()
            .map(|o| Layer::from_output(o, &self.opts.profile))
            .collect();

        if !self.opts.options.merge_package {
            for layer in &layers {
                package.write_layer(layer).map_err(merge_error)?;
            }
            return Ok((headers, MergeReport::default()));
        }

        let plan = MergePlan::from(&self.recipe.merge);
        for layer in layers.iter().filter(|l| !plan.involves(&l.label)) {
            package.write_layer(layer).map_err(merge_error)?;
        }

        let merged = merge_layers(&plan, &layers);
        if merged.merged.is_empty() {
            return Err(PipelineError::Merge {
                message: format!(
                    "none of the merged configurations finished: {}",
                    plan.precedence().collect::<Vec<_>>().join(", ")
                ),
            });
        }
        for label in &merged.missing {
            tracing::warn!("configuration `{}` did not finish; merging without it", label);
        }

        package.write_merged(&plan.to, &merged).map_err(merge_error)?;
        tracing::info!(
            "Merged {} into `{}` ({} files)",
            merged.merged.join(", "),
            plan.to,
            merged.entries.len()
        );

        Ok((headers, MergeReport::from_merged(&plan, &merged)))
    }
}

/// Turn an error the policy lets the run survive into a warning.
fn absorb(err: PipelineError) -> Result<String, PipelineError> {
    match disposition(err.kind(), false) {
        Disposition::Continue => {
            let warning = err.to_string();
            tracing::warn!("{}", warning);
            Ok(warning)
        }
        _ => Err(err),
    }
}
