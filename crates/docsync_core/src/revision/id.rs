//! Revision identifier.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one revision of a document: `"<generation>-<hash>"`.
///
/// The generation is the revision's depth in its tree (root = 1).
/// Ordering compares generation first, then hash.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId {
    generation: u64,
    hash: String,
}

impl RevisionId {
    /// Creates a revision id from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `generation` is zero or `hash`
    /// is empty.
    pub fn new(generation: u64, hash: impl Into<String>) -> CoreResult<Self> {
        let hash = hash.into();
        if generation == 0 {
            return Err(CoreError::invalid_input(format!(
                "revision {hash:?} has generation 0; generations start at 1"
            )));
        }
        if hash.is_empty() {
            return Err(CoreError::invalid_input(format!(
                "revision at generation {generation} has an empty hash"
            )));
        }
        Ok(Self { generation, hash })
    }

    pub(super) fn from_parts(generation: u64, hash: String) -> Self {
        Self { generation, hash }
    }

    /// Returns the generation number.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the hash part.
    #[inline]
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl FromStr for RevisionId {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let (generation, hash) = s
            .split_once('-')
            .ok_or_else(|| CoreError::invalid_input(format!("malformed revision id {s:?}")))?;
        let generation = generation.parse::<u64>().map_err(|_| {
            CoreError::invalid_input(format!("malformed generation in revision id {s:?}"))
        })?;
        Self::new(generation, hash)
    }
}

impl TryFrom<String> for RevisionId {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        value.parse()
    }
}

impl From<RevisionId> for String {
    fn from(id: RevisionId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.generation, self.hash)
    }
}

impl fmt::Debug for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let id: RevisionId = "3-917fa2381192822767f010b95b45325b".parse().unwrap();
        assert_eq!(id.generation(), 3);
        assert_eq!(id.hash(), "917fa2381192822767f010b95b45325b");
        assert_eq!(id.to_string(), "3-917fa2381192822767f010b95b45325b");
    }

    #[test]
    fn hash_may_contain_dashes() {
        let id: RevisionId = "2-abc-def".parse().unwrap();
        assert_eq!(id.generation(), 2);
        assert_eq!(id.hash(), "abc-def");
    }

    #[test]
    fn rejects_malformed() {
        assert!("abc".parse::<RevisionId>().is_err());
        assert!("x-abc".parse::<RevisionId>().is_err());
        assert!("0-abc".parse::<RevisionId>().is_err());
        assert!("4-".parse::<RevisionId>().is_err());
        assert!("-4-abc".parse::<RevisionId>().is_err());
    }

    #[test]
    fn ordering_is_generation_first() {
        let a = RevisionId::new(2, "zzz").unwrap();
        let b = RevisionId::new(10, "aaa").unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_as_string() {
        let id = RevisionId::new(7, "beef").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"7-beef\"");
        let back: RevisionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<RevisionId>("\"0-beef\"").is_err());
    }
}
