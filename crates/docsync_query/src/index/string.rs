//! String index type.

use super::traits::IndexType;
use crate::error::{QueryError, QueryResult};
use crate::literal::SqlLiteral;
use crate::value::IndexValue;

/// Index over UTF-8 text.
///
/// Accepts text, integers and booleans; integers and booleans are indexed
/// by their decimal or `true`/`false` text form.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringIndexType;

impl IndexType for StringIndexType {
    fn name(&self) -> &'static str {
        "string"
    }

    fn column_type(&self) -> &'static str {
        "TEXT"
    }

    fn value_supported(&self, value: &IndexValue) -> bool {
        match value {
            IndexValue::Text(s) => !s.contains('\0'),
            IndexValue::Integer(_) | IndexValue::Bool(_) => true,
        }
    }

    fn convert(&self, value: &IndexValue) -> QueryResult<IndexValue> {
        if !self.value_supported(value) {
            return Err(QueryError::invalid_criterion(format!(
                "{value} ({}) is not supported by index type {}",
                value.kind(),
                self.name()
            )));
        }
        Ok(match value {
            IndexValue::Text(s) => IndexValue::Text(s.clone()),
            IndexValue::Integer(i) => IndexValue::Text(i.to_string()),
            IndexValue::Bool(b) => IndexValue::Text(b.to_string()),
        })
    }

    fn escape(&self, value: &IndexValue) -> QueryResult<SqlLiteral> {
        match value {
            IndexValue::Text(s) => SqlLiteral::quoted(s),
            other => Err(QueryError::invalid_criterion(format!(
                "index type {} cannot escape non-canonical value {other}",
                self.name()
            ))),
        }
    }
}
