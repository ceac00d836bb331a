//! Error types for query compilation.

use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while building or compiling a query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A criterion value is not acceptable for its index type.
    #[error("invalid criterion: {message}")]
    InvalidCriterion {
        /// Description of the problem.
        message: String,
    },

    /// A caller precondition was violated.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    /// No index is registered under this name.
    #[error("unknown index: {name}")]
    UnknownIndex {
        /// The index name.
        name: String,
    },

    /// No index type is registered under this name.
    #[error("unknown index type: {name}")]
    UnknownIndexType {
        /// The index type name.
        name: String,
    },

    /// The plan has no criteria.
    #[error("cannot compile a query plan without criteria")]
    EmptyPlan,
}

impl QueryError {
    /// Creates an invalid criterion error.
    pub fn invalid_criterion(message: impl Into<String>) -> Self {
        Self::InvalidCriterion {
            message: message.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            QueryError::invalid_criterion("empty set").to_string(),
            "invalid criterion: empty set"
        );
        assert_eq!(
            QueryError::EmptyPlan.to_string(),
            "cannot compile a query plan without criteria"
        );
    }
}
