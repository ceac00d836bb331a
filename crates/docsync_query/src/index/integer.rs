//! Integer index type.

use super::traits::IndexType;
use crate::error::{QueryError, QueryResult};
use crate::literal::SqlLiteral;
use crate::value::IndexValue;

/// Index over 64-bit integers.
///
/// Accepts integers, booleans (`false` = 0, `true` = 1) and text that
/// parses as a decimal `i64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerIndexType;

impl IntegerIndexType {
    fn canonical(value: &IndexValue) -> Option<i64> {
        match value {
            IndexValue::Integer(i) => Some(*i),
            IndexValue::Bool(b) => Some(i64::from(*b)),
            IndexValue::Text(s) => s.parse().ok(),
        }
    }
}

impl IndexType for IntegerIndexType {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn column_type(&self) -> &'static str {
        "INTEGER"
    }

    fn value_supported(&self, value: &IndexValue) -> bool {
        Self::canonical(value).is_some()
    }

    fn convert(&self, value: &IndexValue) -> QueryResult<IndexValue> {
        Self::canonical(value).map(IndexValue::Integer).ok_or_else(|| {
            QueryError::invalid_criterion(format!(
                "{value} ({}) is not supported by index type {}",
                value.kind(),
                self.name()
            ))
        })
    }

    fn escape(&self, value: &IndexValue) -> QueryResult<SqlLiteral> {
        match value {
            IndexValue::Integer(i) => Ok(SqlLiteral::integer(*i)),
            other => Err(QueryError::invalid_criterion(format!(
                "index type {} cannot escape non-canonical value {other}",
                self.name()
            ))),
        }
    }
}
