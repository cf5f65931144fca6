//! Error types for depshift.
//!
//! Setup failures (unusable root, bad configuration, invalid overrides) abort
//! a run and surface as [`DepshiftError`]. Per-file problems found while
//! scanning or rewriting never abort; they are collected as
//! [`FileFailure`]s and reported with the run summary.

pub mod collection;
pub mod reporting;
pub mod summary;

pub use collection::{FileFailure, FileResults, OperationType};
pub use reporting::{report_brief_summary, report_failures};
pub use summary::ErrorSummary;

use std::path::PathBuf;
use thiserror::Error;

/// Failures that prevent a run from starting.
#[derive(Debug, Error)]
pub enum DepshiftError {
    #[error("project root {} does not exist", .0.display())]
    RootMissing(PathBuf),

    #[error("project root {} is not a directory", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("invalid override '{assignment}': {message}")]
    InvalidOverride { assignment: String, message: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build module graph: {0:#}")]
    Graph(anyhow::Error),

    #[error(transparent)]
    State(#[from] crate::pipeline::state::InvalidTransition),
}

impl DepshiftError {
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RootMissing(_) | Self::RootNotDirectory(_) => 2,
            Self::Config { .. } | Self::InvalidOverride { .. } => 3,
            Self::Write { .. } | Self::Graph(_) | Self::State(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = DepshiftError::config("/p/depshift.toml", "bad bound");
        assert_eq!(
            err.to_string(),
            "invalid configuration in /p/depshift.toml: bad bound"
        );
        assert_eq!(err.exit_code(), 3);
        assert_eq!(DepshiftError::RootMissing(PathBuf::from("/nope")).exit_code(), 2);
    }
}
