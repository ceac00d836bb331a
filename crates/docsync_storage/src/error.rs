//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of storage.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// Temporary storage could not be allocated.
    #[error("cannot allocate temporary storage in {dir}: {source}")]
    TempAllocation {
        /// Directory the temporary file was requested in.
        dir: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl From<StorageError> for io::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => e,
            StorageError::TempAllocation { source, .. } => source,
            other => io::Error::new(io::ErrorKind::UnexpectedEof, other.to_string()),
        }
    }
}
