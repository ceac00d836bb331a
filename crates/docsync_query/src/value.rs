//! Criterion values.

use crate::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value supplied by the application as part of a criterion.
///
/// Index types decide which variants they accept and convert accepted
/// values to their canonical variant before escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexValue {
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// UTF-8 text.
    Text(String),
}

impl IndexValue {
    /// Returns a short name for the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            IndexValue::Bool(_) => "bool",
            IndexValue::Integer(_) => "integer",
            IndexValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::Bool(b) => write!(f, "{b}"),
            IndexValue::Integer(i) => write!(f, "{i}"),
            IndexValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for IndexValue {
    fn from(v: i64) -> Self {
        IndexValue::Integer(v)
    }
}

impl From<i32> for IndexValue {
    fn from(v: i32) -> Self {
        IndexValue::Integer(i64::from(v))
    }
}

impl From<u32> for IndexValue {
    fn from(v: u32) -> Self {
        IndexValue::Integer(i64::from(v))
    }
}

impl From<bool> for IndexValue {
    fn from(v: bool) -> Self {
        IndexValue::Bool(v)
    }
}

impl From<&str> for IndexValue {
    fn from(v: &str) -> Self {
        IndexValue::Text(v.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(v: String) -> Self {
        IndexValue::Text(v)
    }
}

impl TryFrom<&serde_json::Value> for IndexValue {
    type Error = QueryError;

    fn try_from(value: &serde_json::Value) -> QueryResult<Self> {
        use serde_json::Value;
        match value {
            Value::Bool(b) => Ok(IndexValue::Bool(*b)),
            Value::String(s) => Ok(IndexValue::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(IndexValue::Integer).ok_or_else(|| {
                QueryError::invalid_criterion(format!("{n} is not a 64-bit integer"))
            }),
            other => Err(QueryError::invalid_criterion(format!(
                "{other} cannot be used as an index value"
            ))),
        }
    }
}
