//! Index type trait.

use crate::error::QueryResult;
use crate::literal::SqlLiteral;
use crate::value::IndexValue;
use std::fmt;

/// The value domain of one secondary index.
///
/// Implementations must be pure: the same input always yields the same
/// output, and no state is shared between calls.
pub trait IndexType: fmt::Debug + Send + Sync {
    /// Registry name, e.g. `"integer"`.
    fn name(&self) -> &'static str;

    /// Column type of the index table's `value` column.
    fn column_type(&self) -> &'static str;

    /// Returns true if `value` is a legal criterion value for this type.
    fn value_supported(&self, value: &IndexValue) -> bool;

    /// Converts a supported value to its canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueryError::InvalidCriterion`] for unsupported values.
    fn convert(&self, value: &IndexValue) -> QueryResult<IndexValue>;

    /// Escapes a canonical value for embedding in query text.
    ///
    /// This is the only path from a criterion value into query text; it
    /// must reject anything it cannot render as a [`SqlLiteral`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueryError::InvalidCriterion`] if `value` is not in
    /// canonical form or cannot be escaped.
    fn escape(&self, value: &IndexValue) -> QueryResult<SqlLiteral>;

    /// Converts then escapes.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`convert`](Self::convert) and
    /// [`escape`](Self::escape).
    fn convert_and_escape(&self, value: &IndexValue) -> QueryResult<(IndexValue, SqlLiteral)> {
        let canonical = self.convert(value)?;
        let literal = self.escape(&canonical)?;
        Ok((canonical, literal))
    }
}
