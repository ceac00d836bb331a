//! Revision model and batch ordering.
//!
//! A remote peer delivers a document's history as one or more
//! [`RevisionHistoryFragment`]s. They may come from diverging branches of
//! one revision tree or from separate trees that happen to share a
//! document id. [`RevisionBatch`] orders them so that a revision tree store
//! inserting them one after another never sees a descendant before its
//! ancestor.
//!
//! ```text
//! same tree, two branches        two trees, same document id
//!   1 -> 2 -> 3                    1 -> 2 -> 3
//!     \                            1* -> 2* -> 3*
//!      -> 2 -> 3*
//! ```

mod batch;
mod fragment;
mod id;

pub use batch::{order, RevisionBatch};
pub use fragment::{AttachmentRef, RevisionHistoryFragment};
pub use id::RevisionId;
