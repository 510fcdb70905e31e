//! Git source - the wrapped project's repository at a pinned tag.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{Repository, ResetType};

use crate::sources::Source;
use crate::util::fs::ensure_dir;

/// A git checkout pinned to a tag.
pub struct GitSource {
    /// Remote repository URL or local path
    remote: String,

    /// Tag to check out
    tag: String,

    /// Local checkout path
    checkout_path: PathBuf,

    /// Resolved commit hash
    precise: Option<String>,
}

impl GitSource {
    /// Create a new git source.
    pub fn new(remote: impl Into<String>, tag: impl Into<String>, checkout_path: PathBuf) -> Self {
        GitSource {
            remote: remote.into(),
            tag: tag.into(),
            checkout_path,
            precise: None,
        }
    }

    fn open_or_clone(&self) -> Result<Repository> {
        if self.checkout_path.join(".git").exists() {
            tracing::info!("Updating {}", self.remote);
            return Repository::open(&self.checkout_path).with_context(|| {
                format!(
                    "failed to open git repository: {}",
                    self.checkout_path.display()
                )
            });
        }

        tracing::info!("Cloning {}", self.remote);
        if let Some(parent) = self.checkout_path.parent() {
            ensure_dir(parent)?;
        }
        Repository::clone(&self.remote, &self.checkout_path)
            .with_context(|| format!("failed to clone {}", self.remote))
    }

    fn fetch_tags(&self, repo: &Repository) -> Result<()> {
        let mut remote = repo
            .find_remote("origin")
            .context("repository has no `origin` remote")?;
        remote
            .fetch(&["+refs/tags/*:refs/tags/*"], None, None)
            .with_context(|| format!("failed to fetch tags from {}", self.remote))?;
        Ok(())
    }

    fn checkout(&mut self, repo: &Repository) -> Result<String> {
        let reference = repo
            .find_reference(&format!("refs/tags/{}", self.tag))
            .with_context(|| format!("tag `{}` not found", self.tag))?;
        let commit = reference.peel_to_commit()?;

        repo.reset(commit.as_object(), ResetType::Hard, None)?;
        repo.set_head_detached(commit.id())?;

        let id = commit.id().to_string();
        self.precise = Some(id.clone());
        Ok(id)
    }

    /// Get the resolved commit hash.
    pub fn precise(&self) -> Option<&str> {
        self.precise.as_deref()
    }
}

impl Source for GitSource {
    fn name(&self) -> &str {
        &self.remote
    }

    fn tag(&self) -> &str {
        &self.tag
    }

    fn checkout_path(&self) -> &Path {
        &self.checkout_path
    }

    fn retrieve(&mut self) -> Result<String> {
        let repo = self.open_or_clone()?;
        self.fetch_tags(&repo)?;
        self.checkout(&repo)
    }
}
