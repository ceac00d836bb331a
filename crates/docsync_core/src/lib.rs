//! # docsync core
//!
//! The ingestion core of docsync: everything that happens to a remote
//! document change between the network layer and the durable revision
//! tree store.
//!
//! This crate provides:
//! - Revision identifiers and revision history fragments
//! - Batch ordering that inserts ancestors before descendants
//! - The attachment staging pipeline (temporary storage, digesting,
//!   commit-time length verification)
//!
//! ## Key Invariants
//!
//! - An ordered batch is non-decreasing in minimum generation
//! - A staged attachment owns its temporary storage exclusively and
//!   releases it when dropped
//! - A staged attachment whose stored length disagrees with its declared
//!   length never commits

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod attachment;
mod config;
mod error;
pub mod revision;

pub use attachment::{
    AttachmentMetadata, AttachmentStager, CommittedAttachment, Encoding, StagedAttachment,
};
pub use config::{StagingConfig, StagingLocation};
pub use error::{CoreError, CoreResult};
pub use revision::{order, AttachmentRef, RevisionBatch, RevisionHistoryFragment, RevisionId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
