//! Attachment staging pipeline.
//!
//! Attachment content arrives as a byte stream next to the revision that
//! references it. The [`AttachmentStager`] copies the stream into
//! temporary storage and returns a [`StagedAttachment`]. The durable store
//! later commits it together with its owning revision, or drops it, which
//! releases the temporary storage.
//!
//! The stager does not compare the stream length with the declared
//! lengths. That check runs at commit time: [`StagedAttachment::commit`]
//! refuses content whose stored byte count disagrees with
//! [`AttachmentMetadata::expected_stored_length`].

mod encoding;
mod metadata;
mod staged;
mod stager;

pub use encoding::Encoding;
pub use metadata::AttachmentMetadata;
pub use staged::{CommittedAttachment, StagedAttachment};
pub use stager::AttachmentStager;
