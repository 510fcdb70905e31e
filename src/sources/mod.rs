//! Source preparation.
//!
//! Retrieves the wrapped project at its pinned tag and applies the recipe's
//! textual patches.

pub mod git;
pub mod patch;
pub mod prepare;
pub mod source;

pub use git::GitSource;
pub use patch::{apply_patches, PatchReport};
pub use prepare::{PreparedSource, RetrievalStatus, SourcePreparer};
pub use source::Source;
