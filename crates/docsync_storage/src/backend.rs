//! Storage backend trait definition.

use crate::error::StorageResult;
use std::io::{self, Read};

/// Chunk size used when streaming bytes out of a backend.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A low-level byte store.
///
/// Backends are **opaque byte stores**. They provide simple operations for
/// appending, reading and flushing data; callers own all interpretation of
/// the bytes.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `size` equals the total number of bytes appended so far
/// - Backends must be `Send + Sync` so staging can run on worker threads
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing and memory-only staging
/// - [`super::TempFileBackend`] - For scoped temporary storage
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Flushes all pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Returns a reader that streams the whole backend from offset zero.
    fn reader(&self) -> BackendReader<'_>
    where
        Self: Sized,
    {
        BackendReader::new(self)
    }
}

/// Streams the contents of a backend through [`std::io::Read`].
///
/// The reader fetches [`DEFAULT_CHUNK_SIZE`] bytes at a time, so large
/// attachments are never loaded into memory at once.
pub struct BackendReader<'a> {
    backend: &'a dyn StorageBackend,
    position: u64,
    buffer: Vec<u8>,
    cursor: usize,
}

impl<'a> BackendReader<'a> {
    /// Creates a reader positioned at the start of `backend`.
    pub fn new(backend: &'a dyn StorageBackend) -> Self {
        Self {
            backend,
            position: 0,
            buffer: Vec::new(),
            cursor: 0,
        }
    }

    fn refill(&mut self) -> io::Result<()> {
        let size = self.backend.size()?;
        let remaining = size.saturating_sub(self.position);
        let len = remaining.min(DEFAULT_CHUNK_SIZE as u64) as usize;
        self.buffer = self.backend.read_at(self.position, len)?;
        self.position += len as u64;
        self.cursor = 0;
        Ok(())
    }
}

impl Read for BackendReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.cursor >= self.buffer.len() {
            self.refill()?;
            if self.buffer.is_empty() {
                return Ok(0);
            }
        }
        let available = &self.buffer[self.cursor..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.cursor += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBackend;

    #[test]
    fn reader_streams_across_chunks() {
        let payload: Vec<u8> = (0..(DEFAULT_CHUNK_SIZE * 2 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        let backend = InMemoryBackend::with_data(payload.clone());

        let mut out = Vec::new();
        backend.reader().read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn reader_on_empty_backend() {
        let backend = InMemoryBackend::new();
        let mut out = Vec::new();
        assert_eq!(backend.reader().read_to_end(&mut out).unwrap(), 0);
    }

    #[test]
    fn reader_small_buffer() {
        let backend = InMemoryBackend::with_data(b"abcdef".to_vec());
        let mut reader = BackendReader::new(&backend);
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
