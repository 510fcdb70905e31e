//! Core data model: recipes, platform profiles, dependencies and artifacts.

pub mod artifact;
pub mod dependency;
pub mod errors;
pub mod options;
pub mod platform;
pub mod policy;
pub mod recipe;

pub use artifact::{Artifact, ArtifactKind, ConfigurationOutput, PackageDir};
pub use dependency::{DependencyMap, DependencyRef, MissingDependencyError};
pub use errors::PipelineError;
pub use options::Options;
pub use platform::{Generator, PlatformFamily, PlatformProfile, TypeRule};
pub use recipe::Recipe;
