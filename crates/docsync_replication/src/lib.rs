//! # docsync replication
//!
//! Pull-side replication driver.
//!
//! This crate provides:
//! - [`AttachmentSource`] - where attachment streams come from
//! - [`RevisionTreeStore`] - where ordered revisions and staged
//!   attachments go
//! - [`PullProcessor`] - orders each document's fragments, stages
//!   attachments concurrently with per-attachment retry, and inserts
//! - [`MemoryAttachmentSource`] and [`MemoryRevisionStore`] for tests
//!
//! ## Key Invariants
//!
//! - Ancestors are inserted before descendants
//! - A revision is inserted only after all its attachments are staged
//! - A failed attachment releases the temporary storage of its siblings
//! - Retries reopen the stream from the start

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod puller;
mod source;
mod store;

pub use config::{PullConfig, RetryConfig};
pub use error::{ReplicationError, ReplicationResult};
pub use puller::{DocumentPull, PullProcessor, PullStats};
pub use source::{AttachmentSource, MemoryAttachmentSource};
pub use store::{InsertedRevision, MemoryRevisionStore, RevisionTreeStore};
