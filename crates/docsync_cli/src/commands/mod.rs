//! CLI command implementations.

pub mod order;
pub mod query;
pub mod stage;
