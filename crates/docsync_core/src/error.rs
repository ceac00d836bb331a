//! Error types for docsync core.

use crate::attachment::Encoding;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while ordering revisions or staging attachments.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A caller precondition was violated.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the violated precondition.
        message: String,
    },

    /// The attachment encoding name is not recognized.
    #[error("unsupported attachment encoding: {name:?}")]
    InvalidEncoding {
        /// The encoding name as received.
        name: String,
    },

    /// Reading the attachment stream failed.
    #[error("attachment I/O failure: {source}")]
    AttachmentIo {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Stored byte count disagrees with the declared length.
    #[error(
        "attachment length mismatch ({encoding}): declared {expected} bytes, stored {actual}"
    )]
    LengthMismatch {
        /// Length implied by the declared metadata.
        expected: u64,
        /// Bytes actually held in temporary storage.
        actual: u64,
        /// Encoding that selected which declared length applies.
        encoding: Encoding,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] docsync_storage::StorageError),

    /// Malformed wire-form JSON.
    #[error("malformed document revisions: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an invalid encoding error.
    pub fn invalid_encoding(name: impl Into<String>) -> Self {
        Self::InvalidEncoding { name: name.into() }
    }

    /// Wraps a stream read failure.
    pub fn attachment_io(source: io::Error) -> Self {
        Self::AttachmentIo { source }
    }

    /// Returns true if retrying the same operation with a fresh stream could
    /// succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::AttachmentIo { .. } | CoreError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        let io = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(CoreError::attachment_io(io).is_transient());
        assert!(!CoreError::invalid_input("mixed ids").is_transient());
        assert!(!CoreError::invalid_encoding("br").is_transient());
    }

    #[test]
    fn error_display() {
        let err = CoreError::LengthMismatch {
            expected: 10,
            actual: 7,
            encoding: Encoding::Gzip,
        };
        let text = err.to_string();
        assert!(text.contains("gzip"));
        assert!(text.contains("10"));
        assert!(text.contains("7"));

        let err = CoreError::invalid_encoding("br");
        assert_eq!(err.to_string(), "unsupported attachment encoding: \"br\"");
    }
}
