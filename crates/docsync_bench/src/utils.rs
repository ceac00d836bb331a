//! Benchmark utilities.

use docsync_core::RevisionHistoryFragment;
use rand::seq::SliceRandom;
use rand::Rng;

/// Generate random attachment content of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` shuffled fragments of one document.
///
/// Fragments are cut from `branches` linear branches that all fork off a
/// shared root, each fragment holding 1 to 4 revisions.
pub fn shuffled_fragments(count: usize, branches: usize) -> Vec<RevisionHistoryFragment> {
    let mut rng = rand::thread_rng();
    let branches = branches.max(1);
    let mut next_gen = vec![2u64; branches];
    let mut fragments: Vec<RevisionHistoryFragment> = (0..count)
        .filter_map(|i| {
            let branch = i % branches;
            let len: u64 = rng.gen_range(1..=4);
            let start = next_gen[branch] + len - 1;
            next_gen[branch] = start + 1;
            let ids: Vec<String> = (0..len)
                .map(|k| format!("b{branch}g{}", start - k))
                .collect();
            RevisionHistoryFragment::new("bench-doc", start, ids).ok()
        })
        .collect();
    fragments.shuffle(&mut rng);
    fragments
}

/// Generate a membership set of `count` text values.
pub fn text_values(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("value-{i}-o'brien")).collect()
}
