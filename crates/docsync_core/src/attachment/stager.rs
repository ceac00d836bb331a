//! Copies attachment streams into temporary storage.

use super::encoding::Encoding;
use super::metadata::AttachmentMetadata;
use super::staged::StagedAttachment;
use crate::config::{StagingConfig, StagingLocation};
use crate::error::{CoreError, CoreResult};
use docsync_storage::{InMemoryBackend, StorageBackend, TempFileBackend};
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Read};
use tracing::{debug, warn};

/// Stages attachment streams for later commit.
///
/// Each call to [`stage`](Self::stage) allocates its own temporary storage,
/// so one stager can serve many threads at once. A failed staging releases
/// whatever storage it had allocated before returning. No retries happen
/// here; the replication driver decides whether to reopen the stream and
/// try again.
///
/// # Example
///
/// ```rust
/// use docsync_core::{AttachmentStager, StagingConfig};
///
/// let stager = AttachmentStager::new(StagingConfig::in_memory());
/// let staged = stager
///     .stage_named(&b"hello"[..], "text/plain", None, 5, 5)
///     .unwrap();
/// assert_eq!(staged.stored_length(), 5);
/// assert!(staged.verify().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttachmentStager {
    config: StagingConfig,
}

impl AttachmentStager {
    /// Creates a stager with the given configuration.
    #[must_use]
    pub fn new(config: StagingConfig) -> Self {
        Self { config }
    }

    /// Returns the staging configuration.
    #[must_use]
    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Stages an attachment whose encoding is given by name.
    ///
    /// The encoding name is resolved before anything else happens: an
    /// unrecognized name fails without allocating storage or reading from
    /// `stream`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidEncoding`] for an unrecognized encoding,
    /// otherwise the same errors as [`stage`](Self::stage).
    pub fn stage_named<R: Read>(
        &self,
        stream: R,
        content_type: &str,
        encoding: Option<&str>,
        length: u64,
        encoded_length: u64,
    ) -> CoreResult<StagedAttachment> {
        let encoding = Encoding::from_name(encoding)?;
        let metadata = AttachmentMetadata::new(content_type, encoding, length, encoded_length);
        self.stage(stream, metadata)
    }

    /// Copies `stream` to the end into fresh temporary storage.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AttachmentIo`] if reading the stream fails, or a
    /// storage error if temporary storage cannot be allocated or written.
    pub fn stage<R: Read>(
        &self,
        mut stream: R,
        metadata: AttachmentMetadata,
    ) -> CoreResult<StagedAttachment> {
        let mut storage = self.allocate()?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.config.buffer_size.max(1)];
        let mut stored = 0u64;

        loop {
            let n = match stream.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(
                        content_type = metadata.content_type(),
                        bytes_read = stored,
                        error = %e,
                        "attachment stream failed; releasing temporary storage"
                    );
                    return Err(CoreError::attachment_io(e));
                }
            };
            hasher.update(&buffer[..n]);
            storage.append(&buffer[..n])?;
            stored += n as u64;
        }
        storage.flush()?;

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());

        debug!(
            content_type = metadata.content_type(),
            encoding = %metadata.encoding(),
            stored,
            declared = metadata.expected_stored_length(),
            "staged attachment"
        );

        Ok(StagedAttachment::new(metadata, storage, stored, digest))
    }

    fn allocate(&self) -> CoreResult<Box<dyn StorageBackend>> {
        Ok(match &self.config.location {
            StagingLocation::Memory => Box::new(InMemoryBackend::new()),
            StagingLocation::Directory(dir) => Box::new(TempFileBackend::create_in(dir)?),
        })
    }
}
