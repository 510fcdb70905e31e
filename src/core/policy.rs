//! What each kind of pipeline error does to the run.
//!
//! Phases never swallow errors themselves. They return a [`PipelineError`]
//! and the orchestrator asks [`disposition`] whether to carry on.
//!
//! | error               | severity | disposition                                     |
//! |---------------------|----------|-------------------------------------------------|
//! | Retrieval           | warning  | continue with the existing tree                 |
//! | Patch               | fatal    | abort the run                                   |
//! | MissingDependency   | fatal    | abort the run                                   |
//! | Toolchain           | fatal    | abort the run                                   |
//! | GeneratorInvocation | warning  | continue if a prior configure left state behind |
//! | Build / Install     | fatal    | abort this configuration                        |
//! | Collect             | fatal    | abort this configuration                        |
//! | Merge               | fatal    | abort the merge                                 |
//!
//! [`PipelineError`]: crate::core::errors::PipelineError

use serde::Serialize;

use crate::core::errors::ErrorKind;

/// How bad an error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Fatal,
}

/// What the orchestrator does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    /// Log a warning and proceed with the next phase
    Continue,
    /// Skip the remaining phases of this configuration only
    AbortConfiguration,
    /// Skip packaging; configuration results still stand
    AbortMerge,
    /// Stop the whole run
    AbortRun,
}

/// Severity of an error kind.
pub fn severity(kind: ErrorKind) -> Severity {
    match kind {
        ErrorKind::Retrieval | ErrorKind::GeneratorInvocation => Severity::Warning,
        ErrorKind::Patch
        | ErrorKind::MissingDependency
        | ErrorKind::Toolchain
        | ErrorKind::Build
        | ErrorKind::Install
        | ErrorKind::Collect
        | ErrorKind::Merge => Severity::Fatal,
    }
}

/// Decide what happens after an error.
///
/// `prior_configure_state` only matters for generator invocation failures: a
/// build tree left by an earlier successful configure may still be valid.
pub fn disposition(kind: ErrorKind, prior_configure_state: bool) -> Disposition {
    match kind {
        ErrorKind::Retrieval => Disposition::Continue,
        ErrorKind::GeneratorInvocation if prior_configure_state => Disposition::Continue,
        ErrorKind::GeneratorInvocation => Disposition::AbortConfiguration,
        ErrorKind::Build | ErrorKind::Install | ErrorKind::Collect => {
            Disposition::AbortConfiguration
        }
        ErrorKind::Merge => Disposition::AbortMerge,
        ErrorKind::Patch | ErrorKind::MissingDependency | ErrorKind::Toolchain => {
            Disposition::AbortRun
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_continue() {
        assert_eq!(severity(ErrorKind::Retrieval), Severity::Warning);
        assert_eq!(disposition(ErrorKind::Retrieval, false), Disposition::Continue);
    }

    #[test]
    fn test_generator_failure_depends_on_prior_state() {
        assert_eq!(severity(ErrorKind::GeneratorInvocation), Severity::Warning);
        assert_eq!(
            disposition(ErrorKind::GeneratorInvocation, true),
            Disposition::Continue
        );
        assert_eq!(
            disposition(ErrorKind::GeneratorInvocation, false),
            Disposition::AbortConfiguration
        );
    }

    #[test]
    fn test_per_configuration_failures_do_not_abort_run() {
        for kind in [ErrorKind::Build, ErrorKind::Install, ErrorKind::Collect] {
            assert_eq!(severity(kind), Severity::Fatal);
            assert_eq!(disposition(kind, true), Disposition::AbortConfiguration);
        }
    }

    #[test]
    fn test_run_level_failures() {
        assert_eq!(disposition(ErrorKind::MissingDependency, false), Disposition::AbortRun);
        assert_eq!(disposition(ErrorKind::Patch, false), Disposition::AbortRun);
        assert_eq!(severity(ErrorKind::Toolchain), Severity::Fatal);
        assert_eq!(disposition(ErrorKind::Toolchain, true), Disposition::AbortRun);
        assert_eq!(disposition(ErrorKind::Merge, false), Disposition::AbortMerge);
    }
}
