//! Source trait - the retrieval boundary.

use std::path::Path;

use anyhow::Result;

/// Something that can place the wrapped project's tree on disk.
pub trait Source {
    /// Get the source name for display.
    fn name(&self) -> &str;

    /// The pinned revision.
    fn tag(&self) -> &str;

    /// Where the tree lives once retrieved.
    fn checkout_path(&self) -> &Path;

    /// Fetch and check out the pinned revision, returning its commit id.
    fn retrieve(&mut self) -> Result<String>;
}
