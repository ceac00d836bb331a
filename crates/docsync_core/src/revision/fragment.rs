//! Revision history fragments and their replication wire form.

use super::id::RevisionId;
use crate::attachment::{AttachmentMetadata, Encoding};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attachment reference carried by a fragment's leaf revision.
///
/// A reference marked `stub` names content the local store already holds;
/// every other reference needs its bytes streamed through the staging
/// pipeline before the revision can be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// MIME type of the attachment.
    pub content_type: String,
    /// Decoded length in bytes.
    #[serde(default)]
    pub length: u64,
    /// Encoded length in bytes, present when the content is content-coded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_length: Option<u64>,
    /// Transfer encoding name (`"gzip"`), absent for identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Digest reported by the remote peer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Generation at which this attachment was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revpos: Option<u64>,
    /// True when the content is not included and already known locally.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stub: bool,
}

impl AttachmentRef {
    /// Creates a reference for identity-encoded content.
    pub fn new(content_type: impl Into<String>, length: u64) -> Self {
        Self {
            content_type: content_type.into(),
            length,
            encoded_length: None,
            encoding: None,
            digest: None,
            revpos: None,
            stub: false,
        }
    }

    /// Marks the content as content-coded with the given encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>, encoded_length: u64) -> Self {
        self.encoding = Some(encoding.into());
        self.encoded_length = Some(encoded_length);
        self
    }

    /// Marks the reference as a stub.
    #[must_use]
    pub fn stub(mut self) -> Self {
        self.stub = true;
        self
    }

    /// Returns true if the content must be fetched and staged.
    #[must_use]
    pub fn needs_download(&self) -> bool {
        !self.stub
    }

    /// Resolves the declared metadata for staging.
    ///
    /// A missing encoded length defaults to the decoded length.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidEncoding`] for an unrecognized encoding.
    pub fn metadata(&self) -> CoreResult<AttachmentMetadata> {
        let encoding = Encoding::from_name(self.encoding.as_deref())?;
        Ok(AttachmentMetadata::new(
            self.content_type.clone(),
            encoding,
            self.length,
            self.encoded_length.unwrap_or(self.length),
        ))
    }
}

/// A contiguous run of one document's revision history.
///
/// `ids` run from the leaf (generation `start`) back toward the root, each
/// entry one generation older than the previous. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireDocumentRevs", into = "WireDocumentRevs")]
pub struct RevisionHistoryFragment {
    doc_id: String,
    start: u64,
    ids: Vec<String>,
    deleted: bool,
    attachments: BTreeMap<String, AttachmentRef>,
    body: Map<String, Value>,
}

impl RevisionHistoryFragment {
    /// Creates a fragment for `doc_id` whose leaf has generation `start`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if the document id is empty, the
    /// id list is empty or contains an empty id, or the fragment would
    /// reach below generation 1.
    pub fn new<I, S>(doc_id: impl Into<String>, start: u64, ids: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let doc_id = doc_id.into();
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();

        if doc_id.is_empty() {
            return Err(CoreError::invalid_input("fragment has an empty document id"));
        }
        if ids.is_empty() {
            return Err(CoreError::invalid_input(format!(
                "fragment for {doc_id:?} carries no revision ids"
            )));
        }
        if ids.iter().any(String::is_empty) {
            return Err(CoreError::invalid_input(format!(
                "fragment for {doc_id:?} contains an empty revision id"
            )));
        }
        if start < ids.len() as u64 {
            return Err(CoreError::invalid_input(format!(
                "fragment for {doc_id:?} has start {start} but {} ids",
                ids.len()
            )));
        }

        Ok(Self {
            doc_id,
            start,
            ids,
            deleted: false,
            attachments: BTreeMap::new(),
            body: Map::new(),
        })
    }

    /// Parses a fragment from its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if the JSON is malformed or violates the
    /// fragment invariants.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Marks the leaf revision as a deletion.
    #[must_use]
    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    /// Adds an attachment reference to the leaf revision.
    #[must_use]
    pub fn with_attachment(mut self, name: impl Into<String>, attachment: AttachmentRef) -> Self {
        self.attachments.insert(name.into(), attachment);
        self
    }

    fn with_attachments(mut self, attachments: BTreeMap<String, AttachmentRef>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Sets the leaf revision's document body.
    #[must_use]
    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    /// Returns the document id.
    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Returns the generation of the leaf revision.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Returns the raw revision hashes, leaf first.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Returns the generation of the oldest revision in this fragment.
    #[must_use]
    pub fn min_generation(&self) -> u64 {
        self.start - self.ids.len() as u64 + 1
    }

    /// Returns the leaf (most recent) revision.
    #[must_use]
    pub fn leaf_revision(&self) -> RevisionId {
        self.revision_at(0)
    }

    /// Returns the oldest revision carried by this fragment.
    #[must_use]
    pub fn oldest_revision(&self) -> RevisionId {
        self.revision_at(self.ids.len() - 1)
    }

    /// Iterates revisions from the leaf back to the oldest one.
    pub fn revisions(&self) -> impl Iterator<Item = RevisionId> + '_ {
        (0..self.ids.len()).map(move |i| self.revision_at(i))
    }

    /// Returns true if the leaf revision is a deletion.
    #[must_use]
    pub fn deleted(&self) -> bool {
        self.deleted
    }

    /// Returns the leaf revision's attachment references by name.
    #[must_use]
    pub fn attachments(&self) -> &BTreeMap<String, AttachmentRef> {
        &self.attachments
    }

    /// Returns the leaf revision's document body.
    #[must_use]
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    fn revision_at(&self, index: usize) -> RevisionId {
        // Construction guarantees start >= ids.len() and non-empty ids.
        RevisionId::from_parts(self.start - index as u64, self.ids[index].clone())
    }
}

#[derive(Serialize, Deserialize)]
struct WireRevisions {
    start: u64,
    ids: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct WireDocumentRevs {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    #[serde(rename = "_deleted", default, skip_serializing_if = "std::ops::Not::not")]
    deleted: bool,
    #[serde(rename = "_revisions")]
    revisions: WireRevisions,
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    attachments: BTreeMap<String, AttachmentRef>,
    #[serde(flatten)]
    body: Map<String, Value>,
}

impl TryFrom<WireDocumentRevs> for RevisionHistoryFragment {
    type Error = CoreError;

    fn try_from(wire: WireDocumentRevs) -> CoreResult<Self> {
        let fragment = RevisionHistoryFragment::new(wire.id, wire.revisions.start, wire.revisions.ids)?;

        if let Some(rev) = wire.rev {
            let declared: RevisionId = rev.parse()?;
            if declared != fragment.leaf_revision() {
                return Err(CoreError::invalid_input(format!(
                    "_rev {declared} disagrees with _revisions leaf {}",
                    fragment.leaf_revision()
                )));
            }
        }

        Ok(fragment
            .with_deleted(wire.deleted)
            .with_body(wire.body)
            .with_attachments(wire.attachments))
    }
}

impl From<RevisionHistoryFragment> for WireDocumentRevs {
    fn from(fragment: RevisionHistoryFragment) -> Self {
        let rev = Some(fragment.leaf_revision().to_string());
        WireDocumentRevs {
            id: fragment.doc_id,
            rev,
            deleted: fragment.deleted,
            revisions: WireRevisions {
                start: fragment.start,
                ids: fragment.ids,
            },
            attachments: fragment.attachments,
            body: fragment.body,
        }
    }
}
