//! Error types for the replication driver.

use docsync_core::CoreError;
use std::io;
use thiserror::Error;

/// Result type for replication operations.
pub type ReplicationResult<T> = Result<T, ReplicationError>;

/// Errors that can occur while pulling revisions.
#[derive(Error, Debug)]
pub enum ReplicationError {
    /// Ordering, staging or commit failed in the core.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The attachment source could not provide a stream.
    #[error("attachment source error: {message}")]
    Source {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The revision tree store rejected an insert.
    #[error("store error: {message}")]
    Store {
        /// Error message.
        message: String,
    },

    /// Processing was cancelled.
    #[error("pull cancelled")]
    Cancelled,
}

impl ReplicationError {
    /// Creates a retryable source error.
    pub fn source_retryable(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable source error.
    pub fn source_fatal(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Classifies a failure to open an attachment stream.
    ///
    /// Missing or forbidden content will not appear on retry; anything else
    /// might.
    pub fn from_source_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidData => Self::source_fatal(err.to_string()),
            _ => Self::source_retryable(err.to_string()),
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReplicationError::Source { retryable, .. } => *retryable,
            ReplicationError::Core(err) => err.is_transient(),
            ReplicationError::Store { .. } | ReplicationError::Cancelled => false,
        }
    }
}
