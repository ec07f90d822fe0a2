//! Base error types for buildstack
//!
//! Every crate in the workspace reports failures through this one error type so
//! the CLI can classify them with [`Error::kind`] without downcasting.

use std::path::PathBuf;
use thiserror::Error;

/// Classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Zero or several plugins match the working tree
    Resolution,
    /// The target is unknown, or a plugin (or the VCS) declares it unreachable
    Unsupported,
    /// No handler and the default policy is to fail
    Unhandled,
    /// A handler reported a failure directive
    Failure,
    /// A child process is missing or exited unsuccessfully
    Execution,
    /// A plugin broke the handler contract
    Internal,
    /// Configuration could not be read or parsed
    Config,
    /// Filesystem error outside of command execution
    Io,
}

/// Base error type shared by all buildstack crates
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// No registered plugin matches the location
    #[error("{}: no supported build stack detected", dir.display())]
    NoBuildStack { dir: PathBuf },

    /// Several plugins match the location
    #[error("{}: multiple build stacks detected, use --file to disambiguate", names.join(", "))]
    MultipleBuildStacks { names: Vec<String> },

    /// An explicitly given manifest does not exist
    #[error("{}: no such file", path.display())]
    ManifestNotFound { path: PathBuf },

    /// The name does not denote a lifecycle target
    #[error("{name}: unknown target")]
    UnknownTarget { name: String },

    /// The plugin declares the target unsupported
    #[error("{plugin}: {target}: unsupported target")]
    UnsupportedTarget { plugin: String, target: String },

    /// The plugin has no handler and the target cannot be queued
    #[error("{plugin}: {target}: unhandled target")]
    UnhandledTarget { plugin: String, target: String },

    /// A handler yielded a failure directive
    #[error("{plugin}: {target}: {message}")]
    HandlerFailure {
        plugin: String,
        target: String,
        message: String,
    },

    /// The executable could not be located
    #[error("{program} is unavailable, please install it")]
    ExecutableNotFound { program: String },

    /// The child process could not be spawned or exited unsuccessfully
    #[error("{program}: {reason}")]
    CommandFailed { program: String, reason: String },

    /// A command failed while a plugin target was being processed
    ///
    /// The cause is rendered inline rather than chained.
    #[error("{plugin}: {target}: {cause}")]
    Target {
        plugin: String,
        target: String,
        cause: Box<Error>,
    },

    /// The detected VCS has no mapping for the operation
    #[error("{vcs}: {operation}: unsupported VCS operation")]
    UnsupportedVcsOperation { vcs: String, operation: String },

    /// A plugin broke the handler contract
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::NoBuildStack { .. }
            | Error::MultipleBuildStacks { .. }
            | Error::ManifestNotFound { .. } => ErrorKind::Resolution,
            Error::UnknownTarget { .. }
            | Error::UnsupportedTarget { .. }
            | Error::UnsupportedVcsOperation { .. } => ErrorKind::Unsupported,
            Error::UnhandledTarget { .. } => ErrorKind::Unhandled,
            Error::HandlerFailure { .. } => ErrorKind::Failure,
            Error::ExecutableNotFound { .. } | Error::CommandFailed { .. } => ErrorKind::Execution,
            Error::Target { cause, .. } => cause.kind(),
            Error::Internal(_) => ErrorKind::Internal,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether this error signals a plugin defect rather than a user error
    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }

    /// Attach the plugin and target that were being processed
    ///
    /// Errors that already name their plugin are returned unchanged.
    #[must_use]
    pub fn in_target(self, plugin: &str, target: &str) -> Self {
        match self {
            Error::ExecutableNotFound { .. }
            | Error::CommandFailed { .. }
            | Error::UnsupportedVcsOperation { .. }
            | Error::Io(_) => Error::Target {
                plugin: plugin.to_string(),
                target: target.to_string(),
                cause: Box::new(self),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_multiple_build_stacks_lists_names() {
        let err = Error::MultipleBuildStacks {
            names: vec!["make".to_string(), "maven".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "make, maven: multiple build stacks detected, use --file to disambiguate"
        );
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn test_in_target_wraps_execution_errors() {
        let err = Error::CommandFailed {
            program: "make".to_string(),
            reason: "exited with status 2".to_string(),
        }
        .in_target("make", "flush");

        assert_eq!(err.to_string(), "make: flush: make: exited with status 2");
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn test_in_target_keeps_errors_naming_their_plugin() {
        let err = Error::UnsupportedTarget {
            plugin: "make".to_string(),
            target: "get".to_string(),
        }
        .in_target("make", "flush");

        assert!(matches!(err, Error::UnsupportedTarget { .. }));
    }

    #[test]
    fn test_internal_errors_are_flagged() {
        assert!(Error::Internal("lingering".to_string()).is_internal());
        assert!(!Error::Config("bad".to_string()).is_internal());
    }
}
