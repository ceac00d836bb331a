//! Order command implementation.

use docsync_core::{order, RevisionHistoryFragment};
use serde::Serialize;
use std::path::Path;

/// One fragment in insertion order.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OrderedFragment {
    /// Position in insertion order.
    pub position: usize,
    /// Leaf revision.
    pub leaf: String,
    /// Generation of the oldest revision in the fragment.
    pub min_generation: u64,
    /// Number of revisions in the fragment.
    pub revisions: usize,
}

/// Runs the order command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    let ordered = order_json(&json)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&ordered)?);
        }
        _ => {
            for fragment in &ordered {
                println!(
                    "{:>4}  {:<40} min_generation={} revisions={}",
                    fragment.position, fragment.leaf, fragment.min_generation, fragment.revisions
                );
            }
        }
    }

    Ok(())
}

/// Parses a JSON array of fragments and orders them for insertion.
pub fn order_json(json: &str) -> Result<Vec<OrderedFragment>, Box<dyn std::error::Error>> {
    let fragments: Vec<RevisionHistoryFragment> = serde_json::from_str(json)?;
    Ok(order(fragments)?
        .iter()
        .enumerate()
        .map(|(position, f)| OrderedFragment {
            position,
            leaf: f.leaf_revision().to_string(),
            min_generation: f.min_generation(),
            revisions: f.ids().len(),
        })
        .collect())
}
