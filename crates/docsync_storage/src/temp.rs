//! Scoped temporary file storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::{Builder, TempPath};

/// A file-backed store whose file is removed when the backend is dropped.
///
/// Every instance owns a freshly created file; two backends never share
/// one. Release happens on every exit path, including unwinding, because
/// removal is tied to `Drop`.
///
/// # Example
///
/// ```rust
/// use docsync_storage::{StorageBackend, TempFileBackend};
///
/// let dir = std::env::temp_dir();
/// let mut backend = TempFileBackend::create_in(&dir).unwrap();
/// backend.append(b"scratch").unwrap();
/// let path = backend.path().to_path_buf();
/// drop(backend);
/// assert!(!path.exists());
/// ```
#[derive(Debug)]
pub struct TempFileBackend {
    // Field order matters: the handle closes before the path is removed.
    file: Mutex<File>,
    len: u64,
    path: TempPath,
}

impl TempFileBackend {
    /// Creates a new temporary file inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TempAllocation`] if the file cannot be created.
    pub fn create_in(dir: &Path) -> StorageResult<Self> {
        let named = Builder::new()
            .prefix("docsync-staging-")
            .suffix(".blob")
            .tempfile_in(dir)
            .map_err(|source| StorageError::TempAllocation {
                dir: dir.display().to_string(),
                source,
            })?;
        let (file, path) = named.into_parts();
        Ok(Self {
            file: Mutex::new(file),
            len: 0,
            path,
        })
    }

    /// Returns the path of the temporary file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for TempFileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let end = offset.saturating_add(len as u64);
        if end > self.len {
            return Err(StorageError::ReadPastEnd {
                offset,
                len,
                size: self.len,
            });
        }

        let mut buffer = vec![0u8; len];
        if len > 0 {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buffer)?;
        }
        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.len;
        if !data.is_empty() {
            let file = self.file.get_mut();
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(data)?;
            self.len += data.len() as u64;
        }
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.get_mut().flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.len)
    }
}
