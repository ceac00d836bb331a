//! Per-index criteria.

use crate::value::IndexValue;
use serde::{Deserialize, Serialize};

/// A predicate against one index table.
///
/// Constructors cover the common shapes; the variants are public so
/// callers decoding criteria from elsewhere can build them directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// `value = v`.
    Equality(IndexValue),
    /// `value IN (v1, v2, ...)`.
    Membership(Vec<IndexValue>),
    /// `value > min AND value < max`, both bounds exclusive and optional,
    /// at least one required.
    Range {
        /// Exclusive lower bound.
        min: Option<IndexValue>,
        /// Exclusive upper bound.
        max: Option<IndexValue>,
    },
}

impl Criterion {
    /// Equality with `value`.
    pub fn eq(value: impl Into<IndexValue>) -> Self {
        Self::Equality(value.into())
    }

    /// Membership in `values`.
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<IndexValue>,
    {
        Self::Membership(values.into_iter().map(Into::into).collect())
    }

    /// Strictly greater than `min`.
    pub fn greater_than(min: impl Into<IndexValue>) -> Self {
        Self::Range {
            min: Some(min.into()),
            max: None,
        }
    }

    /// Strictly less than `max`.
    pub fn less_than(max: impl Into<IndexValue>) -> Self {
        Self::Range {
            min: None,
            max: Some(max.into()),
        }
    }

    /// Strictly between `min` and `max`.
    pub fn between(min: impl Into<IndexValue>, max: impl Into<IndexValue>) -> Self {
        Self::Range {
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }

    /// A range with optional bounds.
    #[must_use]
    pub fn range(min: Option<IndexValue>, max: Option<IndexValue>) -> Self {
        Self::Range { min, max }
    }

    /// Short name of the criterion shape, for messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Equality(_) => "equality",
            Self::Membership(_) => "membership",
            Self::Range { .. } => "range",
        }
    }
}

/// How a membership criterion treats values its index type rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipPolicy {
    /// Any unsupported member fails the whole criterion.
    #[default]
    Strict,
    /// Unsupported members are dropped. The criterion still fails if
    /// nothing is left.
    Permissive,
}
