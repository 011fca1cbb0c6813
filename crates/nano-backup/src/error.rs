//! Error types for backup operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring or writing backups.
#[derive(Debug, Error)]
pub enum BackupError {
    /// `keep_every` must be at least 1.
    #[error("keep_every must be at least 1")]
    InvalidKeepEvery,

    /// A backup directory could not be created.
    #[error("failed to create backup directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backup copy failed for a reason other than a missing source file.
    #[error("failed to write backup {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
