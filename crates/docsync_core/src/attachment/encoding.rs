//! Attachment transfer encodings.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How attachment bytes are encoded in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Bytes are stored as-is.
    #[default]
    Identity,
    /// Bytes are gzip-compressed.
    Gzip,
}

impl Encoding {
    /// Resolves an encoding name as sent by the remote peer.
    ///
    /// An absent or empty name, or `"identity"`, is [`Encoding::Identity`];
    /// `"gzip"` in any case is [`Encoding::Gzip`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidEncoding`] for any other name.
    pub fn from_name(name: Option<&str>) -> CoreResult<Self> {
        match name.map(str::trim) {
            None | Some("") => Ok(Encoding::Identity),
            Some(n) if n.eq_ignore_ascii_case("identity") => Ok(Encoding::Identity),
            Some(n) if n.eq_ignore_ascii_case("gzip") => Ok(Encoding::Gzip),
            Some(n) => Err(CoreError::invalid_encoding(n)),
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Encoding::Identity => "identity",
            Encoding::Gzip => "gzip",
        }
    }

    /// Returns true if stored bytes differ from the decoded content.
    #[must_use]
    pub const fn is_content_coded(&self) -> bool {
        !matches!(self, Encoding::Identity)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
