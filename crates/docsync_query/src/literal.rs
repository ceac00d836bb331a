//! Safe fragments of query text.
//!
//! Nothing supplied by a caller is written into query text except through
//! the two types in this module.

use crate::error::{QueryError, QueryResult};
use std::fmt;

/// An escaped SQL literal.
///
/// The only constructors are [`SqlLiteral::integer`] and
/// [`SqlLiteral::quoted`], so every literal is either a decimal integer or
/// a single-quoted string with embedded quotes doubled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlLiteral(String);

impl SqlLiteral {
    /// Renders an integer literal.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self(value.to_string())
    }

    /// Renders a single-quoted string literal.
    ///
    /// Single quotes are doubled. NUL characters are rejected because some
    /// SQL engines end the statement at the first NUL.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidCriterion`] if `text` contains NUL.
    pub fn quoted(text: &str) -> QueryResult<Self> {
        if text.contains('\0') {
            return Err(QueryError::invalid_criterion(
                "text values must not contain NUL characters",
            ));
        }
        let mut out = String::with_capacity(text.len() + 2);
        out.push('\'');
        for c in text.chars() {
            if c == '\'' {
                out.push('\'');
            }
            out.push(c);
        }
        out.push('\'');
        Ok(Self(out))
    }

    /// Returns the literal text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated table name: `[A-Za-z_][A-Za-z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validates `name` as a bare SQL identifier.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] if `name` is empty, starts with
    /// a digit, or contains anything other than ASCII letters, digits and
    /// underscores.
    pub fn new(name: impl Into<String>) -> QueryResult<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if !valid {
            return Err(QueryError::invalid_input(format!(
                "{name:?} is not a valid table name"
            )));
        }
        Ok(Self(name))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
