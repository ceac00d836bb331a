//! Revision tree store boundary.

use crate::error::{ReplicationError, ReplicationResult};
use docsync_core::{
    CommittedAttachment, CoreError, RevisionHistoryFragment, RevisionId, StagedAttachment,
};
use docsync_storage::{InMemoryBackend, StorageBackend};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Durable storage for revision trees.
///
/// The processor calls [`insert_revisions`](Self::insert_revisions) once
/// per fragment, in insertion order, with every staged attachment of the
/// fragment's leaf revision. The store is responsible for committing the
/// revisions and attachments atomically; a rejected insert must leave no
/// trace.
pub trait RevisionTreeStore: Send + Sync {
    /// Inserts the revisions of `fragment` with their attachments.
    fn insert_revisions(
        &self,
        fragment: &RevisionHistoryFragment,
        attachments: Vec<(String, StagedAttachment)>,
    ) -> ReplicationResult<()>;
}

/// One accepted insert, as recorded by [`MemoryRevisionStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedRevision {
    /// Document id.
    pub doc_id: String,
    /// Leaf revision of the fragment.
    pub leaf: RevisionId,
    /// Minimum generation of the fragment.
    pub min_generation: u64,
    /// Names of the attachments committed with it.
    pub attachments: Vec<String>,
}

#[derive(Default)]
struct StoreState {
    revisions: BTreeMap<String, BTreeSet<RevisionId>>,
    log: Vec<InsertedRevision>,
    attachments: BTreeMap<(String, RevisionId, String), CommittedAttachment>,
    blobs: InMemoryBackend,
}

/// In-memory revision tree store for tests and tools.
///
/// Records insertion order and commits attachments into an in-memory blob
/// area. With strict ancestry enabled, a fragment is accepted only if it
/// starts at generation 1, overlaps a known revision, or some known
/// revision of the document sits one generation below its oldest revision.
/// With a blob capacity set, an insert whose attachments would not fit is
/// rejected and the blob area is rolled back to where it was.
#[derive(Default)]
pub struct MemoryRevisionStore {
    strict_ancestry: bool,
    blob_capacity: Option<u64>,
    state: RwLock<StoreState>,
}

impl MemoryRevisionStore {
    /// Creates a store that accepts any insertion order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects fragments whose parent generation is unknown.
    pub fn with_strict_ancestry(mut self, strict: bool) -> Self {
        self.strict_ancestry = strict;
        self
    }

    /// Limits the blob area to `bytes`.
    pub fn with_blob_capacity(mut self, bytes: u64) -> Self {
        self.blob_capacity = Some(bytes);
        self
    }

    /// Returns the number of bytes in the blob area.
    pub fn blob_size(&self) -> u64 {
        self.state.read().blobs.size().unwrap_or_default()
    }

    /// Returns accepted inserts in order.
    pub fn inserted(&self) -> Vec<InsertedRevision> {
        self.state.read().log.clone()
    }

    /// Returns true if `revision` of `doc_id` is stored.
    pub fn contains(&self, doc_id: &str, revision: &RevisionId) -> bool {
        self.state
            .read()
            .revisions
            .get(doc_id)
            .is_some_and(|known| known.contains(revision))
    }

    /// Returns the committed attachment `name` of `doc_id` at `revision`.
    pub fn attachment(
        &self,
        doc_id: &str,
        revision: &RevisionId,
        name: &str,
    ) -> Option<CommittedAttachment> {
        self.state
            .read()
            .attachments
            .get(&(doc_id.to_string(), revision.clone(), name.to_string()))
            .cloned()
    }

    /// Returns the bytes of a committed attachment.
    pub fn attachment_bytes(&self, committed: &CommittedAttachment) -> ReplicationResult<Vec<u8>> {
        let len = usize::try_from(committed.length)
            .map_err(|_| ReplicationError::store("attachment too large for memory"))?;
        let bytes = self
            .state
            .read()
            .blobs
            .read_at(committed.offset, len)
            .map_err(CoreError::from)?;
        Ok(bytes)
    }

    fn check_ancestry(
        known: Option<&BTreeSet<RevisionId>>,
        fragment: &RevisionHistoryFragment,
    ) -> ReplicationResult<()> {
        let min_generation = fragment.min_generation();
        if min_generation == 1 {
            return Ok(());
        }
        let oldest = fragment.oldest_revision();
        let anchored = known.is_some_and(|known| {
            known.contains(&oldest)
                || known.iter().any(|rev| rev.generation() == min_generation - 1)
        });
        if anchored {
            Ok(())
        } else {
            Err(ReplicationError::store(format!(
                "no parent at generation {} for {} of {}",
                min_generation - 1,
                oldest,
                fragment.doc_id()
            )))
        }
    }
}

impl MemoryRevisionStore {
    fn commit_all(
        &self,
        blobs: &mut InMemoryBackend,
        attachments: Vec<(String, StagedAttachment)>,
    ) -> ReplicationResult<Vec<(String, CommittedAttachment)>> {
        let mut committed = Vec::with_capacity(attachments.len());
        for (name, staged) in attachments {
            if let Some(capacity) = self.blob_capacity {
                let used = blobs.size().map_err(CoreError::from)?;
                if used.saturating_add(staged.stored_length()) > capacity {
                    return Err(ReplicationError::store(format!(
                        "blob area full: {name} needs {} bytes, {} of {capacity} used",
                        staged.stored_length(),
                        used
                    )));
                }
            }
            let attachment = staged.commit(&mut *blobs)?;
            committed.push((name, attachment));
        }
        Ok(committed)
    }
}

impl RevisionTreeStore for MemoryRevisionStore {
    fn insert_revisions(
        &self,
        fragment: &RevisionHistoryFragment,
        attachments: Vec<(String, StagedAttachment)>,
    ) -> ReplicationResult<()> {
        let mut state = self.state.write();
        let doc_id = fragment.doc_id();

        if self.strict_ancestry {
            Self::check_ancestry(state.revisions.get(doc_id), fragment)?;
        }

        // Validate everything before the first write.
        for (name, staged) in &attachments {
            if let Err(err) = staged.verify() {
                warn!(doc_id, attachment = %name, error = %err, "rejecting revision");
                return Err(err.into());
            }
        }

        let leaf = fragment.leaf_revision();
        let names: Vec<String> = attachments.iter().map(|(name, _)| name.clone()).collect();
        let mark = state.blobs.size().map_err(CoreError::from)?;
        let committed = match self.commit_all(&mut state.blobs, attachments) {
            Ok(committed) => committed,
            Err(err) => {
                state.blobs.truncate(mark);
                warn!(doc_id, leaf = %leaf, error = %err, "rolled back attachment commit");
                return Err(err);
            }
        };
        for (name, attachment) in committed {
            state
                .attachments
                .insert((doc_id.to_string(), leaf.clone(), name), attachment);
        }

        state
            .revisions
            .entry(doc_id.to_string())
            .or_default()
            .extend(fragment.revisions());
        state.log.push(InsertedRevision {
            doc_id: doc_id.to_string(),
            leaf: leaf.clone(),
            min_generation: fragment.min_generation(),
            attachments: names,
        });

        debug!(doc_id, leaf = %leaf, "inserted revisions");
        Ok(())
    }
}
