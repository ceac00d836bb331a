//! Attachment content sources.

use docsync_core::RevisionId;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Supplies attachment byte streams, typically from the remote server.
///
/// Each call must return a fresh stream positioned at the first byte; the
/// processor calls `open` again to retry a failed staging.
pub trait AttachmentSource: Send + Sync {
    /// Opens the content of attachment `name` on `doc_id` at `revision`.
    fn open(
        &self,
        doc_id: &str,
        revision: &RevisionId,
        name: &str,
    ) -> io::Result<Box<dyn Read + Send>>;
}

type AttachmentKey = (String, RevisionId, String);

fn key(doc_id: &str, revision: &RevisionId, name: &str) -> AttachmentKey {
    (doc_id.to_string(), revision.clone(), name.to_string())
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Open(io::ErrorKind),
    MidStream { after: usize, kind: io::ErrorKind },
}

/// In-memory attachment source with injectable failures, for tests.
#[derive(Default)]
pub struct MemoryAttachmentSource {
    contents: RwLock<HashMap<AttachmentKey, Vec<u8>>>,
    failures: Mutex<HashMap<AttachmentKey, VecDeque<Failure>>>,
    opens: AtomicUsize,
}

impl MemoryAttachmentSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores content for an attachment.
    pub fn insert(&self, doc_id: &str, revision: &RevisionId, name: &str, content: impl Into<Vec<u8>>) {
        self.contents
            .write()
            .insert(key(doc_id, revision, name), content.into());
    }

    /// Makes the next `times` opens of an attachment fail with `kind`.
    pub fn fail_open(
        &self,
        doc_id: &str,
        revision: &RevisionId,
        name: &str,
        kind: io::ErrorKind,
        times: usize,
    ) {
        self.push_failures(key(doc_id, revision, name), Failure::Open(kind), times);
    }

    /// Makes the next `times` streams of an attachment fail with `kind`
    /// after `after` bytes.
    pub fn fail_mid_stream(
        &self,
        doc_id: &str,
        revision: &RevisionId,
        name: &str,
        after: usize,
        kind: io::ErrorKind,
        times: usize,
    ) {
        self.push_failures(
            key(doc_id, revision, name),
            Failure::MidStream { after, kind },
            times,
        );
    }

    /// Returns the number of `open` calls so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn push_failures(&self, key: AttachmentKey, failure: Failure, times: usize) {
        let mut failures = self.failures.lock();
        let queue = failures.entry(key).or_default();
        queue.extend(std::iter::repeat(failure).take(times));
    }
}

impl AttachmentSource for MemoryAttachmentSource {
    fn open(
        &self,
        doc_id: &str,
        revision: &RevisionId,
        name: &str,
    ) -> io::Result<Box<dyn Read + Send>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let key = key(doc_id, revision, name);

        let failure = self
            .failures
            .lock()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        if let Some(Failure::Open(kind)) = failure {
            return Err(io::Error::new(kind, format!("injected open failure for {name}")));
        }

        let content = self.contents.read().get(&key).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no attachment {name} on {doc_id} at {revision}"),
            )
        })?;

        Ok(match failure {
            Some(Failure::MidStream { after, kind }) => Box::new(FailingReader {
                inner: Cursor::new(content),
                remaining: after,
                kind,
            }),
            _ => Box::new(Cursor::new(content)),
        })
    }
}

/// Yields `remaining` bytes, then fails.
struct FailingReader {
    inner: Cursor<Vec<u8>>,
    remaining: usize,
    kind: io::ErrorKind,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(self.kind, "injected stream failure"));
        }
        let limit = buf.len().min(self.remaining);
        let n = self.inner.read(&mut buf[..limit])?;
        if n == 0 {
            return Err(io::Error::new(self.kind, "injected stream failure"));
        }
        self.remaining -= n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rev() -> RevisionId {
        RevisionId::new(1, "abc").unwrap()
    }

    fn read(source: &MemoryAttachmentSource, name: &str) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        source.open("doc", &rev(), name)?.read_to_end(&mut out)?;
        Ok(out)
    }

    #[test]
    fn open_returns_content() {
        let source = MemoryAttachmentSource::new();
        source.insert("doc", &rev(), "a.txt", b"hello".to_vec());
        assert_eq!(read(&source, "a.txt").unwrap(), b"hello");
        assert_eq!(
            read(&source, "missing").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(source.open_count(), 2);
    }

    #[test]
    fn injected_failures_are_consumed() {
        let source = MemoryAttachmentSource::new();
        source.insert("doc", &rev(), "a", vec![1u8; 10]);
        source.fail_open("doc", &rev(), "a", io::ErrorKind::TimedOut, 1);
        source.fail_mid_stream("doc", &rev(), "a", 4, io::ErrorKind::ConnectionReset, 1);

        assert_eq!(read(&source, "a").unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert_eq!(
            read(&source, "a").unwrap_err().kind(),
            io::ErrorKind::ConnectionReset
        );
        assert_eq!(read(&source, "a").unwrap(), vec![1u8; 10]);
    }
}
