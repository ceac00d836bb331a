//! Insertion ordering for revision history fragments.

use super::fragment::RevisionHistoryFragment;
use crate::error::{CoreError, CoreResult};
use tracing::debug;

/// All history fragments received for one document, in insertion order.
///
/// Iteration yields fragments by ascending minimum generation, the
/// generation of the oldest revision each fragment introduces. Within one
/// fragment generations rise by one per revision, so inserting fragments in
/// this order places every ancestor before any of its descendants, across
/// any number of branches or disjoint trees.
///
/// Fragments with equal minimum generation have no defined relative order.
/// This happens when the same document id was created independently on two
/// replicas; such fragments share no ancestry, so either order is correct.
/// Callers must not depend on the order within such a group.
///
/// # Example
///
/// ```rust
/// use docsync_core::{RevisionBatch, RevisionHistoryFragment};
///
/// let newer = RevisionHistoryFragment::new("doc", 5, ["r5", "r4"]).unwrap();
/// let older = RevisionHistoryFragment::new("doc", 3, ["r3", "r2", "r1"]).unwrap();
///
/// let batch = RevisionBatch::new(vec![newer, older]).unwrap();
/// let starts: Vec<u64> = batch.iter().map(|f| f.start()).collect();
/// assert_eq!(starts, vec![3, 5]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionBatch {
    doc_id: String,
    fragments: Vec<RevisionHistoryFragment>,
}

impl RevisionBatch {
    /// Builds an ordered batch.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `fragments` is empty or the
    /// fragments name more than one document.
    pub fn new(mut fragments: Vec<RevisionHistoryFragment>) -> CoreResult<Self> {
        let doc_id = match fragments.first() {
            Some(first) => first.doc_id().to_string(),
            None => return Err(CoreError::invalid_input("revision batch is empty")),
        };

        if let Some(stray) = fragments.iter().find(|f| f.doc_id() != doc_id) {
            return Err(CoreError::invalid_input(format!(
                "revision batch mixes documents {doc_id:?} and {:?}",
                stray.doc_id()
            )));
        }

        fragments.sort_by_key(RevisionHistoryFragment::min_generation);

        debug!(
            doc_id = %doc_id,
            fragments = fragments.len(),
            "ordered revision batch"
        );

        Ok(Self { doc_id, fragments })
    }

    /// Returns the document id shared by every fragment.
    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Returns the number of fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns true if the batch holds no fragments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Returns the fragment at `index` in insertion order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RevisionHistoryFragment> {
        self.fragments.get(index)
    }

    /// Iterates fragments in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, RevisionHistoryFragment> {
        self.fragments.iter()
    }

    /// Consumes the batch, returning the ordered fragments.
    #[must_use]
    pub fn into_inner(self) -> Vec<RevisionHistoryFragment> {
        self.fragments
    }
}

impl IntoIterator for RevisionBatch {
    type Item = RevisionHistoryFragment;
    type IntoIter = std::vec::IntoIter<RevisionHistoryFragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.into_iter()
    }
}

impl<'a> IntoIterator for &'a RevisionBatch {
    type Item = &'a RevisionHistoryFragment;
    type IntoIter = std::slice::Iter<'a, RevisionHistoryFragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}

/// Orders fragments of one document for insertion.
///
/// Shorthand for [`RevisionBatch::new`] followed by
/// [`RevisionBatch::into_inner`].
///
/// # Errors
///
/// Same as [`RevisionBatch::new`].
pub fn order(fragments: Vec<RevisionHistoryFragment>) -> CoreResult<Vec<RevisionHistoryFragment>> {
    RevisionBatch::new(fragments).map(RevisionBatch::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn fragment(doc: &str, start: u64, ids: &[&str]) -> RevisionHistoryFragment {
        RevisionHistoryFragment::new(doc, start, ids.iter().copied()).unwrap()
    }

    #[test]
    fn older_fragment_first_regardless_of_input_order() {
        let a = fragment("doc", 3, &["r3", "r2", "r1"]);
        let b = fragment("doc", 5, &["r5", "r4"]);

        let ordered = order(vec![b.clone(), a.clone()]).unwrap();
        assert_eq!(ordered, vec![a.clone(), b.clone()]);

        let ordered = order(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(ordered, vec![a, b]);
    }

    #[test]
    fn branches_of_one_tree() {
        // 1 -> 2 -> 3 and 1 -> 2* -> 3*, the second branch delivered alone.
        let trunk = fragment("doc", 3, &["c", "b", "a"]);
        let branch = fragment("doc", 3, &["c2", "b2"]);

        let batch = RevisionBatch::new(vec![branch.clone(), trunk.clone()]).unwrap();
        assert_eq!(batch.get(0), Some(&trunk));
        assert_eq!(batch.get(1), Some(&branch));
    }

    #[test]
    fn equal_min_generation_is_unordered() {
        // Same document created independently on two replicas.
        let x = fragment("doc", 1, &["x"]);
        let y = fragment("doc", 1, &["y"]);
        let later = fragment("doc", 4, &["z4", "z3", "z2"]);

        let batch = RevisionBatch::new(vec![later.clone(), y.clone(), x.clone()]).unwrap();
        let head: HashSet<_> = batch.iter().take(2).map(|f| f.leaf_revision()).collect();
        let expected: HashSet<_> = [x.leaf_revision(), y.leaf_revision()].into_iter().collect();
        assert_eq!(head, expected);
        assert_eq!(batch.get(2), Some(&later));
    }

    #[test]
    fn empty_batch_is_invalid() {
        assert!(matches!(
            RevisionBatch::new(Vec::new()),
            Err(CoreError::InvalidInput { .. })
        ));
    }

    #[test]
    fn mixed_documents_are_invalid() {
        let result = order(vec![fragment("a", 1, &["x"]), fragment("b", 1, &["y"])]);
        assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
    }

    #[test]
    fn batch_accessors() {
        let batch = RevisionBatch::new(vec![fragment("doc", 2, &["b", "a"])]).unwrap();
        assert_eq!(batch.doc_id(), "doc");
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
        assert!(batch.get(1).is_none());
        assert_eq!((&batch).into_iter().count(), 1);
        assert_eq!(batch.into_iter().count(), 1);
    }

    fn fragment_strategy() -> impl Strategy<Value = RevisionHistoryFragment> {
        (1usize..6, 0u64..20).prop_map(|(len, extra)| {
            let start = len as u64 + extra;
            let ids: Vec<String> = (0..len).map(|i| format!("h{start}x{i}")).collect();
            RevisionHistoryFragment::new("doc", start, ids).unwrap()
        })
    }

    proptest! {
        #[test]
        fn output_is_non_decreasing(fragments in prop::collection::vec(fragment_strategy(), 1..16)) {
            let ordered = order(fragments.clone()).unwrap();
            prop_assert_eq!(ordered.len(), fragments.len());
            for pair in ordered.windows(2) {
                prop_assert!(pair[0].min_generation() <= pair[1].min_generation());
            }
        }

        #[test]
        fn order_is_insensitive_to_input_permutation(
            fragments in prop::collection::vec(fragment_strategy(), 1..16)
        ) {
            let mut reversed = fragments.clone();
            reversed.reverse();
            let keys = |v: Vec<RevisionHistoryFragment>| -> Vec<u64> {
                v.iter().map(RevisionHistoryFragment::min_generation).collect()
            };
            prop_assert_eq!(keys(order(fragments).unwrap()), keys(order(reversed).unwrap()));
        }
    }
}
