//! Drydock - a multi-configuration build-and-merge orchestrator.
//!
//! Drydock wraps an external CMake project: it fetches and patches the
//! source, derives per-configuration build settings, drives configure,
//! build and install for every configuration, stages the installed
//! artifacts and assembles a package tree, optionally merging several
//! configurations into one.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test doubles for the source and build tool boundaries.
#[cfg(test)]
pub mod test_support;

pub use core::{DependencyMap, MissingDependencyError, Options, PipelineError, Recipe};
pub use ops::{Layout, Pipeline, PipelineOptions, PipelineReport};
pub use util::context::GlobalContext;
