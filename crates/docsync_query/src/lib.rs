//! # docsync query
//!
//! Compiles ad-hoc lookups over secondary index tables into one SQL query.
//!
//! Every secondary index lives in its own table of `(docid, value)` rows.
//! A lookup is a conjunction of per-index criteria; the compiler joins one
//! table per criterion to the first table on `docid` and selects the
//! distinct document ids that satisfy all of them.
//!
//! This crate provides:
//! - [`IndexValue`] - application-level criterion values
//! - [`IndexType`] - per-index value domain, conversion and escaping, with
//!   [`IntegerIndexType`] and [`StringIndexType`] built in
//! - [`Criterion`] - equality, membership and strict range predicates
//! - [`IndexQueryPlan`] - the query AST builder and compiler
//! - [`IndexCatalog`] - resolves index names to tables and types
//!
//! ## Escaping
//!
//! Criterion values reach query text only as [`SqlLiteral`]s, which can
//! only be built through [`SqlLiteral::integer`] and
//! [`SqlLiteral::quoted`]. Table names are checked by [`Identifier::new`].
//!
//! ## Example
//!
//! ```rust
//! use docsync_query::{Criterion, IndexQueryPlan, IntegerIndexType, StringIndexType};
//!
//! let mut plan = IndexQueryPlan::new();
//! plan.add_criterion("color", &Criterion::eq("red"), &StringIndexType).unwrap();
//! plan.add_criterion("size", &Criterion::greater_than(1), &IntegerIndexType).unwrap();
//!
//! assert_eq!(
//!     plan.compile().unwrap(),
//!     "SELECT DISTINCT idx0.docid FROM color AS idx0 \
//!      JOIN size AS idx1 ON idx0.docid = idx1.docid \
//!      WHERE idx0.value = 'red' AND idx1.value > 1"
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod ast;
mod catalog;
mod criterion;
mod error;
mod index;
mod literal;
mod plan;
mod value;

pub use ast::{Alias, Comparison, Operand, Predicate, SelectQuery, TableRef};
pub use catalog::{IndexCatalog, IndexDefinition, INDEX_TABLE_PREFIX};
pub use criterion::{Criterion, MembershipPolicy};
pub use error::{QueryError, QueryResult};
pub use index::{IndexType, IndexTypeRegistry, IntegerIndexType, StringIndexType};
pub use literal::{Identifier, SqlLiteral};
pub use plan::IndexQueryPlan;
pub use value::IndexValue;
