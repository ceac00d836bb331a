//! Query plan builder and compiler.

use crate::ast::{Alias, Comparison, Operand, Predicate, SelectQuery, TableRef};
use crate::criterion::{Criterion, MembershipPolicy};
use crate::error::{QueryError, QueryResult};
use crate::index::IndexType;
use crate::literal::Identifier;
use crate::value::IndexValue;
use tracing::{debug, trace};

/// A conjunction of per-index criteria under construction.
///
/// The first criterion's table becomes the primary table `idx0`; each
/// later criterion's table is joined to it on `docid` as `idx1`, `idx2`,
/// and so on. Every criterion contributes its predicates to one WHERE
/// clause joined by `AND`.
///
/// [`add_criterion`](Self::add_criterion) either succeeds or leaves the
/// plan exactly as it was, so a caller may correct a rejected criterion
/// and try again.
///
/// # Example
///
/// ```rust
/// use docsync_query::{Criterion, IndexQueryPlan, StringIndexType};
///
/// let mut plan = IndexQueryPlan::new();
/// plan.add_criterion("tags", &Criterion::one_of(["a", "b"]), &StringIndexType).unwrap();
/// assert_eq!(
///     plan.compile().unwrap(),
///     "SELECT DISTINCT idx0.docid FROM tags AS idx0 WHERE idx0.value IN ('a', 'b')"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct IndexQueryPlan {
    query: Option<SelectQuery>,
    criteria: usize,
    policy: MembershipPolicy,
}

impl IndexQueryPlan {
    /// Creates an empty plan with the strict membership policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how membership criteria treat unsupported values.
    #[must_use]
    pub fn with_policy(mut self, policy: MembershipPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the membership policy.
    #[must_use]
    pub fn policy(&self) -> MembershipPolicy {
        self.policy
    }

    /// Returns the number of criteria added.
    #[must_use]
    pub fn len(&self) -> usize {
        self.criteria
    }

    /// Returns true if no criterion has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria == 0
    }

    /// Adds a criterion against `table`, interpreted by `index_type`.
    ///
    /// # Errors
    ///
    /// - [`QueryError::InvalidInput`] if `table` is not a valid identifier
    /// - [`QueryError::InvalidCriterion`] if a value is not supported by
    ///   `index_type`, a membership set is empty (after filtering, under
    ///   [`MembershipPolicy::Permissive`]), or a range has no bound
    ///
    /// The plan is unchanged on error.
    pub fn add_criterion(
        &mut self,
        table: &str,
        criterion: &Criterion,
        index_type: &dyn IndexType,
    ) -> QueryResult<()> {
        let alias = Alias::new(self.criteria);
        let table = TableRef::new(Identifier::new(table)?, alias);
        let predicates = self.render(alias, criterion, index_type)?;

        trace!(
            table = %table.table,
            alias = %alias,
            kind = criterion.kind(),
            index_type = index_type.name(),
            "added criterion"
        );

        let query = match self.query.take() {
            Some(mut query) => {
                query.join(table);
                query
            }
            None => SelectQuery::new(table),
        };
        let query = self.query.insert(query);
        for predicate in predicates {
            query.filter(predicate);
        }
        self.criteria += 1;
        Ok(())
    }

    /// Returns the syntax tree built so far.
    #[must_use]
    pub fn query(&self) -> Option<&SelectQuery> {
        self.query.as_ref()
    }

    /// Renders the plan as query text with escaped literals.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyPlan`] if no criterion was added.
    pub fn compile(&self) -> QueryResult<String> {
        let sql = self.query.as_ref().ok_or(QueryError::EmptyPlan)?.to_sql();
        debug!(criteria = self.criteria, sql = %sql, "compiled index query");
        Ok(sql)
    }

    /// Renders the plan with `?` placeholders and the values to bind.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyPlan`] if no criterion was added.
    pub fn compile_parameterized(&self) -> QueryResult<(String, Vec<IndexValue>)> {
        let (sql, params) = self
            .query
            .as_ref()
            .ok_or(QueryError::EmptyPlan)?
            .to_parameterized_sql();
        debug!(
            criteria = self.criteria,
            params = params.len(),
            sql = %sql,
            "compiled parameterized index query"
        );
        Ok((sql, params))
    }

    /// Consumes the plan, returning its syntax tree.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyPlan`] if no criterion was added.
    pub fn build(self) -> QueryResult<SelectQuery> {
        self.query.ok_or(QueryError::EmptyPlan)
    }

    fn render(
        &self,
        alias: Alias,
        criterion: &Criterion,
        index_type: &dyn IndexType,
    ) -> QueryResult<Vec<Predicate>> {
        let compare = |op, value: &IndexValue| -> QueryResult<Predicate> {
            Ok(Predicate::Compare {
                alias,
                op,
                operand: operand(value, index_type)?,
            })
        };

        match criterion {
            Criterion::Equality(value) => Ok(vec![compare(Comparison::Eq, value)?]),
            Criterion::Membership(values) => {
                let mut operands = Vec::with_capacity(values.len());
                for value in values {
                    if index_type.value_supported(value) {
                        operands.push(operand(value, index_type)?);
                    } else if self.policy == MembershipPolicy::Strict {
                        return Err(unsupported(value, index_type));
                    } else {
                        debug!(
                            value = %value,
                            index_type = index_type.name(),
                            "dropping unsupported membership value"
                        );
                    }
                }
                if operands.is_empty() {
                    return Err(QueryError::invalid_criterion(format!(
                        "membership criterion for index type {} has no supported values",
                        index_type.name()
                    )));
                }
                Ok(vec![Predicate::In { alias, operands }])
            }
            Criterion::Range { min, max } => {
                let mut predicates = Vec::with_capacity(2);
                if let Some(max) = max {
                    predicates.push(compare(Comparison::Lt, max)?);
                }
                if let Some(min) = min {
                    predicates.push(compare(Comparison::Gt, min)?);
                }
                if predicates.is_empty() {
                    return Err(QueryError::invalid_criterion(
                        "range criterion needs a min or a max bound",
                    ));
                }
                Ok(predicates)
            }
        }
    }
}

fn operand(value: &IndexValue, index_type: &dyn IndexType) -> QueryResult<Operand> {
    if !index_type.value_supported(value) {
        return Err(unsupported(value, index_type));
    }
    let (value, literal) = index_type.convert_and_escape(value)?;
    Ok(Operand { literal, value })
}

fn unsupported(value: &IndexValue, index_type: &dyn IndexType) -> QueryError {
    QueryError::invalid_criterion(format!(
        "value {value} ({}) is not supported by index type {}",
        value.kind(),
        index_type.name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IntegerIndexType, StringIndexType};

    #[test]
    fn single_equality() {
        let mut plan = IndexQueryPlan::new();
        plan.add_criterion("T", &Criterion::eq("x"), &StringIndexType).unwrap();
        assert_eq!(
            plan.compile().unwrap(),
            "SELECT DISTINCT idx0.docid FROM T AS idx0 WHERE idx0.value = 'x'"
        );
    }

    #[test]
    fn equality_and_open_range() {
        let mut plan = IndexQueryPlan::new();
        plan.add_criterion("A", &Criterion::eq("x"), &StringIndexType).unwrap();
        plan.add_criterion("B", &Criterion::greater_than(1), &IntegerIndexType).unwrap();

        let sql = plan.compile().unwrap();
        assert_eq!(sql.matches(" JOIN ").count(), 1);
        assert_eq!(
            sql,
            "SELECT DISTINCT idx0.docid FROM A AS idx0 \
             JOIN B AS idx1 ON idx0.docid = idx1.docid \
             WHERE idx0.value = 'x' AND idx1.value > 1"
        );
        assert!(!sql.contains(">="));
    }

    #[test]
    fn range_shapes() {
        let mut plan = IndexQueryPlan::new();
        plan.add_criterion("a", &Criterion::between(1, 10), &IntegerIndexType).unwrap();
        plan.add_criterion("b", &Criterion::less_than(5), &IntegerIndexType).unwrap();
        assert_eq!(
            plan.compile().unwrap(),
            "SELECT DISTINCT idx0.docid FROM a AS idx0 \
             JOIN b AS idx1 ON idx0.docid = idx1.docid \
             WHERE idx0.value < 10 AND idx0.value > 1 AND idx1.value < 5"
        );
    }

    #[test]
    fn three_tables_join_primary() {
        let mut plan = IndexQueryPlan::new();
        for table in ["a", "b", "c"] {
            plan.add_criterion(table, &Criterion::eq(1), &IntegerIndexType).unwrap();
        }
        let sql = plan.compile().unwrap();
        assert!(sql.contains("JOIN b AS idx1 ON idx0.docid = idx1.docid"));
        assert!(sql.contains("JOIN c AS idx2 ON idx0.docid = idx2.docid"));
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn empty_membership_fails() {
        let mut plan = IndexQueryPlan::new();
        let err = plan
            .add_criterion("t", &Criterion::Membership(Vec::new()), &StringIndexType)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidCriterion { .. }));
        assert!(plan.is_empty());
        assert_eq!(plan.compile(), Err(QueryError::EmptyPlan));
    }

    #[test]
    fn membership_policies() {
        let criterion = Criterion::Membership(vec![
            IndexValue::Integer(1),
            IndexValue::from("nope"),
            IndexValue::Integer(3),
        ]);

        let mut strict = IndexQueryPlan::new();
        assert!(strict.add_criterion("t", &criterion, &IntegerIndexType).is_err());

        let mut permissive = IndexQueryPlan::new().with_policy(MembershipPolicy::Permissive);
        permissive.add_criterion("t", &criterion, &IntegerIndexType).unwrap();
        assert_eq!(
            permissive.compile().unwrap(),
            "SELECT DISTINCT idx0.docid FROM t AS idx0 WHERE idx0.value IN (1, 3)"
        );

        // Filtering down to nothing still fails.
        let all_bad = Criterion::one_of(["x", "y"]);
        assert!(permissive.add_criterion("u", &all_bad, &IntegerIndexType).is_err());
        assert_eq!(permissive.len(), 1);
    }

    #[test]
    fn unsupported_equality_names_value_and_type() {
        let mut plan = IndexQueryPlan::new();
        let err = plan
            .add_criterion("t", &Criterion::eq("abc"), &IntegerIndexType)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("\"abc\""));
        assert!(message.contains("integer"));
    }

    #[test]
    fn range_without_bounds_fails() {
        let mut plan = IndexQueryPlan::new();
        let err = plan
            .add_criterion("t", &Criterion::range(None, None), &IntegerIndexType)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidCriterion { .. }));
    }

    #[test]
    fn failed_criterion_leaves_plan_unchanged() {
        let mut plan = IndexQueryPlan::new();
        plan.add_criterion("a", &Criterion::eq("x"), &StringIndexType).unwrap();
        let before = plan.compile().unwrap();

        assert!(plan
            .add_criterion("b", &Criterion::between(1, "z"), &IntegerIndexType)
            .is_err());
        assert!(plan.add_criterion("bad name", &Criterion::eq(1), &IntegerIndexType).is_err());
        assert_eq!(plan.compile().unwrap(), before);

        // The next criterion still gets idx1.
        plan.add_criterion("b", &Criterion::eq(2), &IntegerIndexType).unwrap();
        assert!(plan.compile().unwrap().contains("JOIN b AS idx1"));
    }

    #[test]
    fn hostile_text_stays_inside_literal() {
        let mut plan = IndexQueryPlan::new();
        plan.add_criterion(
            "t",
            &Criterion::eq("x'; DROP TABLE docs; --"),
            &StringIndexType,
        )
        .unwrap();
        assert_eq!(
            plan.compile().unwrap(),
            "SELECT DISTINCT idx0.docid FROM t AS idx0 WHERE idx0.value = 'x''; DROP TABLE docs; --'"
        );
    }

    #[test]
    fn parameterized_matches_structure() {
        let mut plan = IndexQueryPlan::new();
        plan.add_criterion("a", &Criterion::eq(true), &StringIndexType).unwrap();
        plan.add_criterion("b", &Criterion::between("2", 8), &IntegerIndexType).unwrap();

        let (sql, params) = plan.compile_parameterized().unwrap();
        assert_eq!(
            sql,
            "SELECT DISTINCT idx0.docid FROM a AS idx0 \
             JOIN b AS idx1 ON idx0.docid = idx1.docid \
             WHERE idx0.value = ? AND idx1.value < ? AND idx1.value > ?"
        );
        assert_eq!(
            params,
            vec![
                IndexValue::from("true"),
                IndexValue::Integer(8),
                IndexValue::Integer(2)
            ]
        );
    }

    #[test]
    fn build_returns_tree() {
        let mut plan = IndexQueryPlan::new();
        plan.add_criterion("a", &Criterion::eq(1), &IntegerIndexType).unwrap();
        let query = plan.build().unwrap();
        assert_eq!(query.primary().alias, Alias::PRIMARY);
        assert_eq!(query.predicates().len(), 1);
        assert!(IndexQueryPlan::new().build().is_err());
    }
}
