//! High-level operations.
//!
//! This module contains the implementation of drydock commands.

pub mod clean;
pub mod layout;
pub mod pipeline;
pub mod report;

pub use clean::{clean, CleanOptions};
pub use layout::Layout;
pub use pipeline::{Pipeline, PipelineOptions};
pub use report::{ConfigurationReport, PipelineReport};
