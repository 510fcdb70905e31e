//! Turning a prepared source tree into packaged artifacts.
//!
//! The builder derives per-configuration settings, drives the external build
//! tool through each configuration, stages installed artifacts and assembles
//! the package tree.

pub mod cmake;
pub mod collect;
pub mod config;
pub mod driver;
pub mod merge;
pub mod package;
pub mod tool;
pub mod toolchain;

pub use cmake::CMakeTool;
pub use collect::{ArtifactCollector, Collected};
pub use config::{BuildConfig, ConfigurationBuilder, ConfigurationSet};
pub use driver::{ConfigState, ConfigurationDriver, ConfigurationRun};
pub use merge::{merge_layers, Conflict, Layer, MergePlan, MergeReport, Merged};
pub use package::PackageTree;
pub use tool::{BuildTool, Invocation, ToolError};
pub use toolchain::{ToolchainDescriptor, TOOLCHAIN_FILE};
