//! Pull processing: order, stage, insert.

use crate::config::PullConfig;
use crate::error::{ReplicationError, ReplicationResult};
use crate::source::AttachmentSource;
use crate::store::RevisionTreeStore;
use docsync_core::{
    AttachmentRef, AttachmentStager, RevisionBatch, RevisionHistoryFragment, RevisionId,
    StagedAttachment,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Counters accumulated across [`PullProcessor::process`] calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullStats {
    /// Documents fully processed.
    pub documents: u64,
    /// Fragments inserted into the store.
    pub revisions_inserted: u64,
    /// Attachments staged and handed to the store.
    pub attachments_staged: u64,
    /// Bytes staged across those attachments.
    pub bytes_staged: u64,
    /// Staging attempts repeated after a retryable failure.
    pub retries: u64,
    /// Documents abandoned because of an error.
    pub failed_documents: u64,
}

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPull {
    /// Document id.
    pub doc_id: String,
    /// Leaf revisions inserted, in insertion order.
    pub inserted: Vec<RevisionId>,
    /// Attachments staged for this document.
    pub attachments: u64,
    /// Time spent.
    pub duration: Duration,
}

struct Staged {
    name: String,
    attachment: StagedAttachment,
    retries: u32,
}

/// Applies pulled revisions of one document at a time.
///
/// For each document the processor orders the fragments so every ancestor
/// is inserted before its descendants, then, fragment by fragment, stages
/// all non-stub attachments of the leaf revision and hands the fragment
/// and its staged attachments to the store. Attachments of one revision
/// are staged concurrently, up to
/// [`PullConfig::max_concurrent_attachments`] at a time, and each is
/// retried on its own according to [`PullConfig::retry`].
///
/// If any attachment of a revision fails, the revision is not inserted,
/// every sibling's temporary storage is released, and the document is
/// abandoned with that error. Fragments inserted before the failure stay
/// inserted.
pub struct PullProcessor<S: AttachmentSource, T: RevisionTreeStore> {
    config: PullConfig,
    stager: AttachmentStager,
    source: S,
    store: T,
    stats: RwLock<PullStats>,
    cancelled: AtomicBool,
}

impl<S: AttachmentSource, T: RevisionTreeStore> PullProcessor<S, T> {
    /// Creates a processor.
    pub fn new(config: PullConfig, source: S, store: T) -> Self {
        Self {
            stager: AttachmentStager::new(config.staging.clone()),
            config,
            source,
            store,
            stats: RwLock::new(PullStats::default()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PullConfig {
        &self.config
    }

    /// Returns the attachment source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the revision tree store.
    pub fn store(&self) -> &T {
        &self.store
    }

    /// Gets the current stats.
    pub fn stats(&self) -> PullStats {
        self.stats.read().clone()
    }

    /// Cancels processing at the next check point.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Resets the cancelled flag.
    pub fn reset_cancel(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    fn check_cancelled(&self) -> ReplicationResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(ReplicationError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Processes every fragment received for one document.
    ///
    /// # Errors
    ///
    /// Returns the first ordering, staging or store error; see the type
    /// docs for what has been applied by then.
    pub fn process(
        &self,
        fragments: Vec<RevisionHistoryFragment>,
    ) -> ReplicationResult<DocumentPull> {
        let start = Instant::now();
        let result = self.process_document(fragments, start);
        match &result {
            Ok(pull) => {
                self.stats.write().documents += 1;
                info!(
                    doc_id = %pull.doc_id,
                    revisions = pull.inserted.len(),
                    attachments = pull.attachments,
                    elapsed_ms = pull.duration.as_millis() as u64,
                    "pulled document"
                );
            }
            Err(err) => {
                self.stats.write().failed_documents += 1;
                warn!(error = %err, "abandoned document");
            }
        }
        result
    }

    /// Processes several documents in turn, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Same as [`process`](Self::process).
    pub fn process_all<I>(&self, documents: I) -> ReplicationResult<Vec<DocumentPull>>
    where
        I: IntoIterator<Item = Vec<RevisionHistoryFragment>>,
    {
        documents
            .into_iter()
            .map(|fragments| self.process(fragments))
            .collect()
    }

    fn process_document(
        &self,
        fragments: Vec<RevisionHistoryFragment>,
        start: Instant,
    ) -> ReplicationResult<DocumentPull> {
        self.check_cancelled()?;
        let batch = RevisionBatch::new(fragments)?;
        let doc_id = batch.doc_id().to_string();
        let mut inserted = Vec::with_capacity(batch.len());
        let mut attachments = 0u64;

        for fragment in &batch {
            self.check_cancelled()?;
            let staged = self.stage_attachments(fragment)?;

            let count = staged.len() as u64;
            let bytes: u64 = staged.iter().map(|s| s.attachment.stored_length()).sum();
            let retries: u64 = staged.iter().map(|s| u64::from(s.retries)).sum();

            self.store.insert_revisions(
                fragment,
                staged.into_iter().map(|s| (s.name, s.attachment)).collect(),
            )?;

            {
                let mut stats = self.stats.write();
                stats.revisions_inserted += 1;
                stats.attachments_staged += count;
                stats.bytes_staged += bytes;
                stats.retries += retries;
            }
            attachments += count;
            inserted.push(fragment.leaf_revision());
        }

        Ok(DocumentPull {
            doc_id,
            inserted,
            attachments,
            duration: start.elapsed(),
        })
    }

    /// Stages every attachment of the fragment's leaf that needs content.
    ///
    /// Waits for every started staging to finish before returning. On error
    /// the successful siblings are dropped, which releases their storage.
    fn stage_attachments(
        &self,
        fragment: &RevisionHistoryFragment,
    ) -> ReplicationResult<Vec<Staged>> {
        let pending: Vec<(&String, &AttachmentRef)> = fragment
            .attachments()
            .iter()
            .filter(|(_, reference)| reference.needs_download())
            .collect();
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let revision = fragment.leaf_revision();
        let doc_id = fragment.doc_id();
        let limit = self.config.max_concurrent_attachments.max(1);
        let mut staged = Vec::with_capacity(pending.len());

        debug!(
            doc_id,
            revision = %revision,
            attachments = pending.len(),
            limit,
            "staging attachments"
        );

        for group in pending.chunks(limit) {
            let results: Vec<ReplicationResult<Staged>> = std::thread::scope(|s| {
                let handles: Vec<_> = group
                    .iter()
                    .map(|&(name, reference)| {
                        let revision = &revision;
                        s.spawn(move || self.stage_one(doc_id, revision, name, reference))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(ReplicationError::source_fatal("attachment worker panicked"))
                        })
                    })
                    .collect()
            });

            for result in results {
                match result {
                    Ok(one) => staged.push(one),
                    Err(err) => {
                        warn!(
                            doc_id,
                            revision = %revision,
                            released = staged.len(),
                            error = %err,
                            "attachment staging failed; releasing siblings"
                        );
                        return Err(err);
                    }
                }
            }
        }
        Ok(staged)
    }

    fn stage_one(
        &self,
        doc_id: &str,
        revision: &RevisionId,
        name: &str,
        reference: &AttachmentRef,
    ) -> ReplicationResult<Staged> {
        // An unknown encoding fails here, before the stream is opened.
        let metadata = reference.metadata()?;
        let retry = &self.config.retry;
        let mut retries = 0u32;

        loop {
            self.check_cancelled()?;
            let result = self
                .source
                .open(doc_id, revision, name)
                .map_err(|e| ReplicationError::from_source_io(&e))
                .and_then(|stream| {
                    self.stager
                        .stage(stream, metadata.clone())
                        .map_err(ReplicationError::from)
                });

            match result {
                Ok(attachment) => {
                    return Ok(Staged {
                        name: name.to_string(),
                        attachment,
                        retries,
                    })
                }
                Err(err) if err.is_retryable() => {
                    let Some(delay) = retry.backoff(retries + 1) else {
                        return Err(err);
                    };
                    retries += 1;
                    warn!(
                        doc_id,
                        attachment = name,
                        retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying attachment"
                    );
                    std::thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::source::MemoryAttachmentSource;
    use crate::store::MemoryRevisionStore;
    use docsync_core::StagingConfig;
    use std::io;

    fn config() -> PullConfig {
        PullConfig::new()
            .with_staging(StagingConfig::in_memory())
            .with_retry(
                RetryConfig::new(3)
                    .with_base_delay(Duration::ZERO)
                    .with_jitter(false),
            )
    }

    fn processor() -> PullProcessor<MemoryAttachmentSource, MemoryRevisionStore> {
        PullProcessor::new(
            config(),
            MemoryAttachmentSource::new(),
            MemoryRevisionStore::new().with_strict_ancestry(true),
        )
    }

    fn fragment(start: u64, ids: &[&str]) -> RevisionHistoryFragment {
        RevisionHistoryFragment::new("doc", start, ids.iter().copied()).unwrap()
    }

    #[test]
    fn inserts_in_ancestor_order() {
        let p = processor();
        let pull = p
            .process(vec![fragment(5, &["e", "d"]), fragment(3, &["c", "b", "a"])])
            .unwrap();

        let leaves: Vec<String> = pull.inserted.iter().map(ToString::to_string).collect();
        assert_eq!(leaves, vec!["3-c", "5-e"]);
        assert_eq!(p.stats().revisions_inserted, 2);
        assert_eq!(p.stats().documents, 1);
    }

    #[test]
    fn stubs_are_not_fetched() {
        let p = processor();
        let f = fragment(1, &["a"])
            .with_attachment("old", AttachmentRef::new("text/plain", 3).stub());
        p.process(vec![f]).unwrap();
        assert_eq!(p.source().open_count(), 0);
        assert_eq!(p.stats().attachments_staged, 0);
    }

    #[test]
    fn retries_transient_failures() {
        let p = processor();
        let f = fragment(1, &["a"]).with_attachment("x", AttachmentRef::new("text/plain", 4));
        let rev = f.leaf_revision();
        p.source().insert("doc", &rev, "x", b"data".to_vec());
        p.source().fail_mid_stream("doc", &rev, "x", 2, io::ErrorKind::ConnectionReset, 2);

        p.process(vec![f]).unwrap();
        assert_eq!(p.source().open_count(), 3);
        assert_eq!(p.stats().retries, 2);
        assert_eq!(p.stats().bytes_staged, 4);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let p = processor();
        let f = fragment(1, &["a"]).with_attachment("x", AttachmentRef::new("text/plain", 4));
        let rev = f.leaf_revision();
        p.source().insert("doc", &rev, "x", b"data".to_vec());
        p.source().fail_open("doc", &rev, "x", io::ErrorKind::TimedOut, 5);

        let err = p.process(vec![f]).unwrap_err();
        assert!(matches!(err, ReplicationError::Source { retryable: true, .. }));
        assert_eq!(p.source().open_count(), 3);
        assert!(p.store().inserted().is_empty());
        assert_eq!(p.stats().failed_documents, 1);
    }

    #[test]
    fn unknown_encoding_never_opens_stream() {
        let p = processor();
        let f = fragment(1, &["a"]).with_attachment(
            "x",
            AttachmentRef::new("text/plain", 4).with_encoding("brotli", 3),
        );
        let err = p.process(vec![f]).unwrap_err();
        assert!(matches!(
            err,
            ReplicationError::Core(docsync_core::CoreError::InvalidEncoding { .. })
        ));
        assert_eq!(p.source().open_count(), 0);
    }

    #[test]
    fn cancelled_processor_does_nothing() {
        let p = processor();
        p.cancel();
        assert!(matches!(
            p.process(vec![fragment(1, &["a"])]),
            Err(ReplicationError::Cancelled)
        ));
        p.reset_cancel();
        assert!(p.process(vec![fragment(1, &["a"])]).is_ok());
    }
}
