//! Registry of index types by name.

use super::integer::IntegerIndexType;
use super::string::StringIndexType;
use super::traits::IndexType;
use crate::error::{QueryError, QueryResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Index types available to a catalog, keyed by [`IndexType::name`].
#[derive(Debug, Clone, Default)]
pub struct IndexTypeRegistry {
    types: BTreeMap<&'static str, Arc<dyn IndexType>>,
}

impl IndexTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in types.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(IntegerIndexType));
        registry.register(Arc::new(StringIndexType));
        registry
    }

    /// Registers an index type, replacing any type with the same name.
    pub fn register(&mut self, index_type: Arc<dyn IndexType>) {
        self.types.insert(index_type.name(), index_type);
    }

    /// Looks up an index type by name.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownIndexType`] if no type has this name.
    pub fn get(&self, name: &str) -> QueryResult<Arc<dyn IndexType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::UnknownIndexType {
                name: name.to_string(),
            })
    }

    /// Returns the registered type names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_registered() {
        let registry = IndexTypeRegistry::with_defaults();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["integer", "string"]);
        assert_eq!(registry.get("integer").unwrap().column_type(), "INTEGER");
        assert_eq!(registry.get("string").unwrap().column_type(), "TEXT");
    }

    #[test]
    fn unknown_type() {
        let registry = IndexTypeRegistry::new();
        assert_eq!(
            registry.get("float").unwrap_err(),
            QueryError::UnknownIndexType {
                name: "float".into()
            }
        );
    }
}
