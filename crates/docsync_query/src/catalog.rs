//! Named secondary indexes.

use crate::criterion::{Criterion, MembershipPolicy};
use crate::error::{QueryError, QueryResult};
use crate::index::{IndexType, IndexTypeRegistry};
use crate::literal::Identifier;
use crate::plan::IndexQueryPlan;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Prefix of every index table name.
pub const INDEX_TABLE_PREFIX: &str = "_t_docsync_index_";

/// A registered secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDefinition {
    /// Index name as used by callers.
    pub name: String,
    /// Backing table, `INDEX_TABLE_PREFIX` + name.
    pub table: String,
    /// Registry name of the index type.
    pub type_name: String,
}

/// Maps index names to their tables and types.
///
/// # Example
///
/// ```rust
/// use docsync_query::{Criterion, IndexCatalog};
///
/// let mut catalog = IndexCatalog::new();
/// catalog.register_index("age", "integer").unwrap();
///
/// let sql = catalog.compile(&[("age", Criterion::greater_than(30))]).unwrap();
/// assert_eq!(
///     sql,
///     "SELECT DISTINCT idx0.docid FROM _t_docsync_index_age AS idx0 WHERE idx0.value > 30"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct IndexCatalog {
    registry: IndexTypeRegistry,
    indexes: BTreeMap<String, IndexDefinition>,
    policy: MembershipPolicy,
}

impl Default for IndexCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexCatalog {
    /// Creates a catalog with the built-in index types.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(IndexTypeRegistry::with_defaults())
    }

    /// Creates a catalog resolving types through `registry`.
    #[must_use]
    pub fn with_registry(registry: IndexTypeRegistry) -> Self {
        Self {
            registry,
            indexes: BTreeMap::new(),
            policy: MembershipPolicy::default(),
        }
    }

    /// Sets the membership policy for plans built by this catalog.
    #[must_use]
    pub fn with_policy(mut self, policy: MembershipPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registers an index named `name` of type `type_name`.
    ///
    /// Re-registering a name replaces the previous definition.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownIndexType`] for an unregistered type, or
    /// [`QueryError::InvalidInput`] if the derived table name is not a valid
    /// identifier.
    pub fn register_index(&mut self, name: &str, type_name: &str) -> QueryResult<&IndexDefinition> {
        let index_type = self.registry.get(type_name)?;
        let table = Identifier::new(format!("{INDEX_TABLE_PREFIX}{name}"))?;

        info!(index = name, table = %table, index_type = type_name, "registered index");

        let definition = IndexDefinition {
            name: name.to_string(),
            table: table.as_str().to_string(),
            type_name: index_type.name().to_string(),
        };
        self.indexes.insert(name.to_string(), definition);
        self.index(name)
    }

    /// Looks up an index by name.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownIndex`] if none is registered.
    pub fn index(&self, name: &str) -> QueryResult<&IndexDefinition> {
        self.indexes.get(name).ok_or_else(|| QueryError::UnknownIndex {
            name: name.to_string(),
        })
    }

    /// Iterates registered indexes by name.
    pub fn indexes(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.indexes.values()
    }

    /// Builds a plan from `(index name, criterion)` pairs, in order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownIndex`] for an unregistered index name,
    /// or any error from [`IndexQueryPlan::add_criterion`].
    pub fn plan<S: AsRef<str>>(&self, criteria: &[(S, Criterion)]) -> QueryResult<IndexQueryPlan> {
        let mut plan = IndexQueryPlan::new().with_policy(self.policy);
        for (name, criterion) in criteria {
            let (definition, index_type) = self.resolve(name.as_ref())?;
            plan.add_criterion(&definition.table, criterion, index_type.as_ref())?;
        }
        Ok(plan)
    }

    /// Builds and compiles a plan.
    ///
    /// # Errors
    ///
    /// Same as [`plan`](Self::plan), plus [`QueryError::EmptyPlan`] if
    /// `criteria` is empty.
    pub fn compile<S: AsRef<str>>(&self, criteria: &[(S, Criterion)]) -> QueryResult<String> {
        self.plan(criteria)?.compile()
    }

    fn resolve(&self, name: &str) -> QueryResult<(&IndexDefinition, Arc<dyn IndexType>)> {
        let definition = self.index(name)?;
        let index_type = self.registry.get(&definition.type_name)?;
        Ok((definition, index_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::IndexValue;

    fn catalog() -> IndexCatalog {
        let mut catalog = IndexCatalog::new();
        catalog.register_index("color", "string").unwrap();
        catalog.register_index("size", "integer").unwrap();
        catalog
    }

    #[test]
    fn register_derives_table() {
        let catalog = catalog();
        let color = catalog.index("color").unwrap();
        assert_eq!(color.table, "_t_docsync_index_color");
        assert_eq!(color.type_name, "string");
        assert_eq!(catalog.indexes().count(), 2);
    }

    #[test]
    fn unknown_names() {
        let mut catalog = catalog();
        assert!(matches!(
            catalog.register_index("x", "float"),
            Err(QueryError::UnknownIndexType { .. })
        ));
        assert!(matches!(
            catalog.register_index("bad-name", "string"),
            Err(QueryError::InvalidInput { .. })
        ));
        assert!(matches!(
            catalog.compile(&[("weight", Criterion::eq(1))]),
            Err(QueryError::UnknownIndex { .. })
        ));
    }

    #[test]
    fn compiles_in_criterion_order() {
        let sql = catalog()
            .compile(&[
                ("size", Criterion::between(2, 10)),
                ("color", Criterion::one_of(["red", "blue"])),
            ])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT DISTINCT idx0.docid FROM _t_docsync_index_size AS idx0 \
             JOIN _t_docsync_index_color AS idx1 ON idx0.docid = idx1.docid \
             WHERE idx0.value < 10 AND idx0.value > 2 AND idx1.value IN ('red', 'blue')"
        );
    }

    #[test]
    fn policy_applies_to_plans() {
        let criteria = [(
            "size",
            Criterion::Membership(vec![IndexValue::Integer(1), IndexValue::from("big")]),
        )];
        assert!(catalog().compile(&criteria).is_err());
        assert!(catalog()
            .with_policy(MembershipPolicy::Permissive)
            .compile(&criteria)
            .is_ok());
    }

    #[test]
    fn empty_criteria() {
        let none: [(&str, Criterion); 0] = [];
        assert_eq!(catalog().compile(&none), Err(QueryError::EmptyPlan));
    }
}
