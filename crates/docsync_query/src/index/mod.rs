//! Index types.
//!
//! An [`IndexType`] describes the value domain of one secondary index:
//! which criterion values are legal, how they map to the canonical form
//! stored in the index table, and how a canonical value is escaped.
//!
//! # Built-in Types
//!
//! - [`IntegerIndexType`]: 64-bit integers
//! - [`StringIndexType`]: UTF-8 text

mod integer;
mod registry;
mod string;
mod traits;

pub use integer::IntegerIndexType;
pub use registry::IndexTypeRegistry;
pub use string::StringIndexType;
pub use traits::IndexType;
