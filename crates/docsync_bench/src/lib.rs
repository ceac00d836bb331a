//! Shared helpers for the docsync benchmarks.

#![warn(missing_docs)]

pub mod utils;
