//! Pipeline error taxonomy.
//!
//! Every phase reports failures as a [`PipelineError`]. Whether a failure
//! stops anything is decided separately by `core::policy`.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::dependency::MissingDependencyError;

/// Error raised by one phase of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to retrieve `{url}` at tag `{tag}`: {message}")]
    Retrieval {
        url: String,
        tag: String,
        message: String,
    },

    #[error("failed to patch `{}`: {message}", file.display())]
    Patch { file: PathBuf, message: String },

    #[error(transparent)]
    MissingDependency(#[from] MissingDependencyError),

    #[error("failed to write toolchain file `{}`: {message}", path.display())]
    Toolchain { path: PathBuf, message: String },

    #[error("generator invocation failed for `{configuration}`: {message}")]
    GeneratorInvocation {
        configuration: String,
        message: String,
    },

    #[error("build failed for `{configuration}`: {message}")]
    Build {
        configuration: String,
        message: String,
    },

    #[error("install failed for `{configuration}`: {message}")]
    Install {
        configuration: String,
        message: String,
    },

    #[error("artifact collection failed for `{configuration}`: {message}")]
    Collect {
        configuration: String,
        message: String,
    },

    #[error("package merge failed: {message}")]
    Merge { message: String },
}

/// Discriminant of [`PipelineError`], used as the key of the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Retrieval,
    Patch,
    MissingDependency,
    Toolchain,
    GeneratorInvocation,
    Build,
    Install,
    Collect,
    Merge,
}

impl PipelineError {
    /// The error's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Retrieval { .. } => ErrorKind::Retrieval,
            PipelineError::Patch { .. } => ErrorKind::Patch,
            PipelineError::MissingDependency(_) => ErrorKind::MissingDependency,
            PipelineError::Toolchain { .. } => ErrorKind::Toolchain,
            PipelineError::GeneratorInvocation { .. } => ErrorKind::GeneratorInvocation,
            PipelineError::Build { .. } => ErrorKind::Build,
            PipelineError::Install { .. } => ErrorKind::Install,
            PipelineError::Collect { .. } => ErrorKind::Collect,
            PipelineError::Merge { .. } => ErrorKind::Merge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_configuration() {
        let err = PipelineError::Build {
            configuration: "Debug".into(),
            message: "ninja: build stopped".into(),
        };
        assert_eq!(err.to_string(), "build failed for `Debug`: ninja: build stopped");
        assert_eq!(err.kind(), ErrorKind::Build);
    }

    #[test]
    fn test_missing_dependency_is_transparent() {
        let err: PipelineError = MissingDependencyError::new(vec!["xtl".into()]).into();
        assert_eq!(err.kind(), ErrorKind::MissingDependency);
        assert!(err.to_string().contains("xtl"));
    }
}
