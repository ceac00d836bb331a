//! Staged and committed attachments.

use super::metadata::AttachmentMetadata;
use crate::error::{CoreError, CoreResult};
use docsync_storage::{BackendReader, StorageBackend, DEFAULT_CHUNK_SIZE};
use serde::Serialize;
use std::fmt;
use std::io::Read;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Attachment content held in temporary storage, pending commit.
///
/// The staged attachment owns its temporary storage. Dropping it, whether
/// after a successful [`commit`](Self::commit) or without committing,
/// releases that storage.
pub struct StagedAttachment {
    staging_id: Uuid,
    metadata: AttachmentMetadata,
    storage: Box<dyn StorageBackend>,
    stored_length: u64,
    digest: [u8; 32],
}

impl StagedAttachment {
    pub(super) fn new(
        metadata: AttachmentMetadata,
        storage: Box<dyn StorageBackend>,
        stored_length: u64,
        digest: [u8; 32],
    ) -> Self {
        Self {
            staging_id: Uuid::new_v4(),
            metadata,
            storage,
            stored_length,
            digest,
        }
    }

    /// Returns the id of this staging, unique per staged attachment.
    #[must_use]
    pub fn staging_id(&self) -> Uuid {
        self.staging_id
    }

    /// Returns the declared metadata.
    #[must_use]
    pub fn metadata(&self) -> &AttachmentMetadata {
        &self.metadata
    }

    /// Returns the number of bytes held in temporary storage.
    #[must_use]
    pub fn stored_length(&self) -> u64 {
        self.stored_length
    }

    /// Returns the SHA-256 digest of the stored bytes.
    #[must_use]
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Returns the SHA-256 digest as lowercase hex.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        to_hex(&self.digest)
    }

    /// Streams the stored bytes.
    pub fn reader(&self) -> BackendReader<'_> {
        BackendReader::new(self.storage.as_ref())
    }

    /// Reads all stored bytes into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if temporary storage cannot be read.
    pub fn read_all(&self) -> CoreResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.stored_length as usize);
        self.reader()
            .read_to_end(&mut out)
            .map_err(CoreError::attachment_io)?;
        Ok(out)
    }

    /// Checks the stored byte count against the declared length.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LengthMismatch`] if they disagree.
    pub fn verify(&self) -> CoreResult<()> {
        let expected = self.metadata.expected_stored_length();
        if self.stored_length != expected {
            return Err(CoreError::LengthMismatch {
                expected,
                actual: self.stored_length,
                encoding: self.metadata.encoding(),
            });
        }
        Ok(())
    }

    /// Moves the staged bytes into `blobs`, the durable attachment area.
    ///
    /// The length check runs first; a mismatching attachment is dropped
    /// without touching `blobs`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LengthMismatch`] on a length mismatch, or a
    /// storage error if copying fails.
    pub fn commit(self, blobs: &mut dyn StorageBackend) -> CoreResult<CommittedAttachment> {
        if let Err(err) = self.verify() {
            warn!(staging_id = %self.staging_id, error = %err, "rejecting staged attachment");
            return Err(err);
        }

        let offset = blobs.size()?;
        let mut copied = 0u64;
        while copied < self.stored_length {
            let len = (self.stored_length - copied).min(DEFAULT_CHUNK_SIZE as u64) as usize;
            let chunk = self.storage.read_at(copied, len)?;
            blobs.append(&chunk)?;
            copied += len as u64;
        }
        blobs.flush()?;

        debug!(
            staging_id = %self.staging_id,
            offset,
            length = copied,
            "committed staged attachment"
        );

        Ok(CommittedAttachment {
            metadata: self.metadata.clone(),
            offset,
            length: copied,
            digest: self.digest_hex(),
        })
    }

    /// Drops the attachment without committing it.
    pub fn discard(self) {
        trace!(staging_id = %self.staging_id, "discarding staged attachment");
    }
}

impl fmt::Debug for StagedAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedAttachment")
            .field("staging_id", &self.staging_id)
            .field("metadata", &self.metadata)
            .field("stored_length", &self.stored_length)
            .field("digest", &self.digest_hex())
            .finish_non_exhaustive()
    }
}

impl Drop for StagedAttachment {
    fn drop(&mut self) {
        trace!(staging_id = %self.staging_id, "released temporary attachment storage");
    }
}

/// Location of a committed attachment inside the durable blob area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedAttachment {
    /// Declared metadata.
    pub metadata: AttachmentMetadata,
    /// Offset of the first byte in the blob area.
    pub offset: u64,
    /// Number of bytes written.
    pub length: u64,
    /// SHA-256 digest of the bytes, lowercase hex.
    pub digest: String,
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}
