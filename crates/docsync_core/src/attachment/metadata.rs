//! Declared attachment metadata.

use super::encoding::Encoding;
use serde::{Deserialize, Serialize};

/// Metadata declared by the remote peer for one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    content_type: String,
    encoding: Encoding,
    length: u64,
    encoded_length: u64,
}

impl AttachmentMetadata {
    /// Creates attachment metadata.
    pub fn new(
        content_type: impl Into<String>,
        encoding: Encoding,
        length: u64,
        encoded_length: u64,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            encoding,
            length,
            encoded_length,
        }
    }

    /// Creates metadata for identity-encoded content of `length` bytes.
    pub fn identity(content_type: impl Into<String>, length: u64) -> Self {
        Self::new(content_type, Encoding::Identity, length, length)
    }

    /// Returns the MIME type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the encoding.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the declared decoded length.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Returns the declared encoded length.
    #[must_use]
    pub fn encoded_length(&self) -> u64 {
        self.encoded_length
    }

    /// Number of bytes the staged content must hold: the decoded length for
    /// identity content, the encoded length for content-coded content.
    #[must_use]
    pub fn expected_stored_length(&self) -> u64 {
        if self.encoding.is_content_coded() {
            self.encoded_length
        } else {
            self.length
        }
    }
}
