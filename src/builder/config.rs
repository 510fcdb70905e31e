//! Per-configuration build settings.
//!
//! [`ConfigurationBuilder`] turns the recipe, options, platform profile and
//! supplied dependency locations into one immutable [`BuildConfig`] per
//! configuration label. Nothing is built here; toggles only change the
//! variables emitted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::builder::toolchain::ToolchainDescriptor;
use crate::core::dependency::{DependencyMap, MissingDependencyError};
use crate::core::options::{on_off, Options};
use crate::core::platform::{EnvLookup, Generator, PlatformProfile};
use crate::core::recipe::Recipe;
use crate::util::fs::to_posix;
use crate::util::process::ProcessBuilder;

/// Settings for one configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    label: String,
    generator: Generator,
    variables: BTreeMap<String, String>,
}

impl BuildConfig {
    pub fn new(
        label: impl Into<String>,
        generator: Generator,
        variables: BTreeMap<String, String>,
    ) -> Self {
        BuildConfig {
            label: label.into(),
            generator,
            variables,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }
}

/// Every configuration of a run plus the warnings raised producing them.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationSet {
    pub configs: Vec<BuildConfig>,
    pub warnings: Vec<String>,
}

type LookupFn<'a> = Box<dyn Fn(&EnvLookup) -> Result<String, String> + 'a>;

/// Produces [`BuildConfig`]s.
pub struct ConfigurationBuilder<'a> {
    recipe: &'a Recipe,
    profile: &'a PlatformProfile,
    options: &'a Options,
    build_root: PathBuf,
    generator: Option<Generator>,
    lookup: LookupFn<'a>,
}

impl<'a> ConfigurationBuilder<'a> {
    pub fn new(
        recipe: &'a Recipe,
        profile: &'a PlatformProfile,
        options: &'a Options,
        build_root: impl Into<PathBuf>,
    ) -> Self {
        ConfigurationBuilder {
            recipe,
            profile,
            options,
            build_root: build_root.into(),
            generator: None,
            lookup: Box::new(run_lookup),
        }
    }

    /// Force a generator over both the recipe and the profile.
    pub fn with_generator(mut self, generator: Option<Generator>) -> Self {
        self.generator = generator;
        self
    }

    /// Replace how environment lookups are answered.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&EnvLookup) -> Result<String, String> + 'a,
    {
        self.lookup = Box::new(lookup);
        self
    }

    /// Build one config per recipe configuration.
    ///
    /// Dependencies are resolved first. If any is missing nothing is
    /// produced and the descriptor is left untouched.
    pub fn build(
        &self,
        deps: &DependencyMap,
        descriptor: &mut ToolchainDescriptor,
    ) -> Result<ConfigurationSet, MissingDependencyError> {
        deps.resolve(self.recipe.required_dependencies())?;

        let mut warnings = Vec::new();
        let mut common = BTreeMap::new();

        common.insert("BUILD_TESTING".to_string(), on_off(self.options.testing).to_string());
        common.insert(
            "BUILD_SHARED_LIBS".to_string(),
            on_off(self.options.shared).to_string(),
        );
        common.insert("CMAKE_PREFIX_PATH".to_string(), to_posix(&self.build_root));
        if self.recipe.build.verbose_makefile {
            common.insert("CMAKE_VERBOSE_MAKEFILE".to_string(), "ON".to_string());
        }

        for (name, value) in &self.profile.extra_variables {
            common.insert(name.to_string(), value.to_string());
        }

        for lookup in &self.profile.env_lookups {
            match (self.lookup)(lookup) {
                Ok(value) => {
                    common.insert(lookup.variable.to_string(), value);
                }
                Err(reason) => {
                    let warning = format!(
                        "could not determine `{}` from `{} {}`: {}",
                        lookup.variable,
                        lookup.program,
                        lookup.args.join(" "),
                        reason
                    );
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        for (name, value) in &self.recipe.variables {
            common.insert(name.clone(), value.clone());
        }

        let mut include_dirs = Vec::new();
        for spec in &self.recipe.dependencies {
            // resolved above
            let Some(dep) = deps.get(&spec.name) else {
                continue;
            };
            if let Some(var) = spec.root_variable() {
                common.insert(var, to_posix(&dep.root));
            }
            if spec.include {
                include_dirs.extend(dep.include_dirs());
            }
        }

        for (var, derived) in &self.recipe.path_variables {
            if let Some(dep) = deps.get(&derived.dependency) {
                let path = match derived.subdir {
                    Some(ref sub) => dep.root.join(sub),
                    None => dep.root.clone(),
                };
                common.insert(var.clone(), to_posix(&path));
            }
        }

        let generator = self.generator();
        let configs = self
            .recipe
            .build
            .configurations
            .iter()
            .map(|label| {
                let mut variables = common.clone();
                if !generator.is_multi_config() {
                    variables.insert("CMAKE_BUILD_TYPE".to_string(), label.clone());
                }
                BuildConfig::new(label.clone(), generator.clone(), variables)
            })
            .collect();

        if !include_dirs.is_empty() {
            descriptor.include_directories(&include_dirs);
        }

        Ok(ConfigurationSet { configs, warnings })
    }

    /// Explicit override, then the recipe, then the profile.
    fn generator(&self) -> Generator {
        if let Some(ref generator) = self.generator {
            return generator.clone();
        }
        match self.recipe.build.generator {
            Some(ref name) => Generator::from_name(name),
            None => self.profile.generator.clone(),
        }
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }
}

/// Run the lookup's host tool and take its trimmed stdout.
fn run_lookup(lookup: &EnvLookup) -> Result<String, String> {
    let value = ProcessBuilder::new(lookup.program)
        .args(lookup.args)
        .exec_stdout()
        .map_err(|e| format!("{:#}", e))?;
    let value = value.trim();
    if value.is_empty() {
        return Err("empty output".to_string());
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::DependencyRef;
    use crate::core::platform::PlatformFamily;
    use crate::test_support::{full_deps, xeus_python_recipe};

    fn profile(family: PlatformFamily) -> PlatformProfile {
        PlatformProfile::for_family(family)
    }

    #[test]
    fn test_all_dependency_variables_emitted() {
        let recipe = xeus_python_recipe();
        let profile = profile(PlatformFamily::Linux);
        let options = Options::default();
        let builder = ConfigurationBuilder::new(&recipe, &profile, &options, "/work/build");
        let mut descriptor = ToolchainDescriptor::new();

        let set = builder.build(&full_deps(), &mut descriptor).unwrap();
        assert_eq!(set.configs.len(), 2);

        let debug = &set.configs[0];
        assert_eq!(debug.label(), "Debug");
        assert_eq!(debug.variable("xeus_ROOT"), Some("/deps/xeus"));
        assert_eq!(debug.variable("xeus-zmq_ROOT"), Some("/deps/xeus-zmq"));
        assert_eq!(debug.variable("pybind11_ROOT"), Some("/deps/pybind11"));
        assert_eq!(debug.variable("ZeroMQ_ROOT"), Some("/deps/xeus-zmq/CMake"));
        assert_eq!(debug.variable("nlohmann_json_ROOT"), None);
        assert_eq!(debug.variable("BUILD_SHARED_LIBS"), Some("ON"));
        assert_eq!(debug.variable("BUILD_TESTING"), Some("OFF"));
        assert_eq!(debug.variable("CMAKE_PREFIX_PATH"), Some("/work/build"));
        assert_eq!(debug.variable("CMAKE_VERBOSE_MAKEFILE"), Some("ON"));
        assert_eq!(debug.variable("PythonLibsNew_FIND_VERSION"), Some("3.11"));
        assert_eq!(
            debug.variable("CMAKE_CONFIGURATION_TYPES"),
            Some("Debug;Release;RelWithDebInfo")
        );
        // multi-config generator
        assert_eq!(debug.variable("CMAKE_BUILD_TYPE"), None);

        assert_eq!(debug.variable("xtl_ROOT"), None);

        let rendered = descriptor.render();
        for dep in ["nlohmann_json", "xeus", "xtl", "pybind11", "pybind11_json"] {
            assert!(rendered.contains(&format!("\"/deps/{}/include\"", dep)));
        }
        assert!(!rendered.contains("/deps/xeus-zmq/include"));
    }

    #[test]
    fn test_missing_dependencies_produce_nothing() {
        let recipe = xeus_python_recipe();
        let profile = profile(PlatformFamily::Linux);
        let options = Options::default();
        let builder = ConfigurationBuilder::new(&recipe, &profile, &options, "/work/build");
        let mut descriptor = ToolchainDescriptor::new();

        let deps: DependencyMap = [
            DependencyRef::new("xeus", "/deps/xeus"),
            DependencyRef::new("pybind11", "/deps/pybind11"),
        ]
        .into_iter()
        .collect();

        let err = builder.build(&deps, &mut descriptor).unwrap_err();
        assert_eq!(
            err.missing,
            vec![
                "nlohmann_json".to_string(),
                "pybind11_json".to_string(),
                "xeus-zmq".to_string(),
                "xtl".to_string()
            ]
        );
        assert!(descriptor.is_empty());
    }

    #[test]
    fn test_single_config_generator_sets_build_type() {
        let recipe = xeus_python_recipe();
        let profile = profile(PlatformFamily::Other);
        let options = Options::default();
        let builder = ConfigurationBuilder::new(&recipe, &profile, &options, "/work/build");
        let mut descriptor = ToolchainDescriptor::new();

        let set = builder.build(&full_deps(), &mut descriptor).unwrap();
        assert_eq!(set.configs[0].variable("CMAKE_BUILD_TYPE"), Some("Debug"));
        assert_eq!(set.configs[1].variable("CMAKE_BUILD_TYPE"), Some("Release"));
        assert_eq!(set.configs[0].generator(), &Generator::Default);
    }

    #[test]
    fn test_toggles_change_variables_only() {
        let recipe = xeus_python_recipe();
        let profile = profile(PlatformFamily::Windows);
        let options = Options {
            shared: false,
            testing: true,
            merge_package: true,
        };
        let builder = ConfigurationBuilder::new(&recipe, &profile, &options, "/work/build");
        let mut descriptor = ToolchainDescriptor::new();

        let set = builder.build(&full_deps(), &mut descriptor).unwrap();
        assert_eq!(set.configs.len(), 2);
        assert_eq!(set.configs[0].variable("BUILD_SHARED_LIBS"), Some("OFF"));
        assert_eq!(set.configs[0].variable("BUILD_TESTING"), Some("ON"));
        assert_eq!(set.configs[0].generator().name(), Some("Visual Studio 17 2022"));
    }

    #[test]
    fn test_env_lookup_success_and_failure() {
        let recipe = xeus_python_recipe();
        let profile = profile(PlatformFamily::Macos);
        let options = Options::default();
        let mut descriptor = ToolchainDescriptor::new();

        let found = ConfigurationBuilder::new(&recipe, &profile, &options, "/work/build")
            .with_lookup(|_| Ok("/opt/homebrew/opt/libomp".to_string()))
            .build(&full_deps(), &mut descriptor)
            .unwrap();
        assert_eq!(
            found.configs[0].variable("OpenMP_ROOT"),
            Some("/opt/homebrew/opt/libomp")
        );
        assert!(found.warnings.is_empty());

        let missing = ConfigurationBuilder::new(&recipe, &profile, &options, "/work/build")
            .with_lookup(|_| Err("`brew` not found".to_string()))
            .build(&full_deps(), &mut descriptor)
            .unwrap();
        assert_eq!(missing.configs[0].variable("OpenMP_ROOT"), None);
        assert_eq!(missing.warnings.len(), 1);
        assert!(missing.warnings[0].contains("OpenMP_ROOT"));
    }

    #[test]
    fn test_recipe_generator_override() {
        let mut recipe = xeus_python_recipe();
        recipe.build.generator = Some("Unix Makefiles".to_string());
        let profile = profile(PlatformFamily::Linux);
        let options = Options::default();
        let builder = ConfigurationBuilder::new(&recipe, &profile, &options, "/work/build");
        let mut descriptor = ToolchainDescriptor::new();

        let set = builder.build(&full_deps(), &mut descriptor).unwrap();
        assert_eq!(set.configs[0].generator().name(), Some("Unix Makefiles"));
        assert_eq!(set.configs[0].variable("CMAKE_BUILD_TYPE"), Some("Debug"));

        let forced = ConfigurationBuilder::new(&recipe, &profile, &options, "/work/build")
            .with_generator(Some(Generator::NinjaMultiConfig))
            .build(&full_deps(), &mut descriptor)
            .unwrap();
        assert_eq!(forced.configs[0].generator(), &Generator::NinjaMultiConfig);
        assert_eq!(forced.configs[0].variable("CMAKE_BUILD_TYPE"), None);
    }
}
