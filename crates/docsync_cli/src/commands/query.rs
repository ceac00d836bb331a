//! Query command implementation.

use docsync_query::{
    Criterion, IndexQueryPlan, IndexTypeRegistry, IndexValue, MembershipPolicy, QueryError,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// One criterion as read from the input file.
///
/// Exactly one of `eq`, `in`, or a `min`/`max` pair must be present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriterionSpec {
    /// Index table.
    pub table: String,
    /// Index type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Equality value.
    #[serde(default)]
    pub eq: Option<Value>,
    /// Membership values.
    #[serde(default, rename = "in")]
    pub one_of: Option<Vec<Value>>,
    /// Exclusive lower bound.
    #[serde(default)]
    pub min: Option<Value>,
    /// Exclusive upper bound.
    #[serde(default)]
    pub max: Option<Value>,
}

impl CriterionSpec {
    /// Resolves the criterion shape.
    pub fn criterion(&self) -> Result<Criterion, QueryError> {
        let value = |v: &Value| IndexValue::try_from(v);
        let bounded = self.min.is_some() || self.max.is_some();
        match (&self.eq, &self.one_of, bounded) {
            (Some(eq), None, false) => Ok(Criterion::Equality(value(eq)?)),
            (None, Some(values), false) => Ok(Criterion::Membership(
                values.iter().map(value).collect::<Result<_, _>>()?,
            )),
            (None, None, _) => Ok(Criterion::range(
                self.min.as_ref().map(value).transpose()?,
                self.max.as_ref().map(value).transpose()?,
            )),
            _ => Err(QueryError::invalid_input(format!(
                "criterion on {} must use exactly one of eq, in, or min/max",
                self.table
            ))),
        }
    }
}

/// Runs the query command.
pub fn run(
    path: &Path,
    parameterized: bool,
    permissive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    let specs: Vec<CriterionSpec> = serde_json::from_str(&json)?;
    let policy = if permissive {
        MembershipPolicy::Permissive
    } else {
        MembershipPolicy::Strict
    };
    let plan = build_plan(&specs, policy)?;

    if parameterized {
        let (sql, params) = plan.compile_parameterized()?;
        println!("{sql}");
        println!("{}", serde_json::to_string(&params)?);
    } else {
        println!("{}", plan.compile()?);
    }
    Ok(())
}

/// Builds a plan from parsed criteria, resolving types through the
/// default registry.
pub fn build_plan(
    specs: &[CriterionSpec],
    policy: MembershipPolicy,
) -> Result<IndexQueryPlan, QueryError> {
    let registry = IndexTypeRegistry::with_defaults();
    let mut plan = IndexQueryPlan::new().with_policy(policy);
    for spec in specs {
        let index_type = registry.get(&spec.type_name)?;
        plan.add_criterion(&spec.table, &spec.criterion()?, index_type.as_ref())?;
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(json: &str) -> Vec<CriterionSpec> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn compiles_mixed_criteria() {
        let specs = specs(
            r#"[
                {"table": "color", "type": "string", "eq": "red"},
                {"table": "size", "type": "integer", "min": 1},
                {"table": "tag", "type": "string", "in": ["a", "b"]}
            ]"#,
        );
        let plan = build_plan(&specs, MembershipPolicy::Strict).unwrap();
        assert_eq!(
            plan.compile().unwrap(),
            "SELECT DISTINCT idx0.docid FROM color AS idx0 \
             JOIN size AS idx1 ON idx0.docid = idx1.docid \
             JOIN tag AS idx2 ON idx0.docid = idx2.docid \
             WHERE idx0.value = 'red' AND idx1.value > 1 AND idx2.value IN ('a', 'b')"
        );
    }

    #[test]
    fn ambiguous_shape_is_rejected() {
        let specs = specs(r#"[{"table": "t", "type": "integer", "eq": 1, "max": 3}]"#);
        assert!(matches!(
            specs[0].criterion(),
            Err(QueryError::InvalidInput { .. })
        ));
    }

    #[test]
    fn bare_criterion_is_empty_range() {
        let specs = specs(r#"[{"table": "t", "type": "integer"}]"#);
        assert!(matches!(
            build_plan(&specs, MembershipPolicy::Strict),
            Err(QueryError::InvalidCriterion { .. })
        ));
    }

    #[test]
    fn unknown_type() {
        let specs = specs(r#"[{"table": "t", "type": "float", "eq": 1}]"#);
        assert!(matches!(
            build_plan(&specs, MembershipPolicy::Strict),
            Err(QueryError::UnknownIndexType { .. })
        ));
    }

    #[test]
    fn permissive_drops_bad_members() {
        let specs = specs(r#"[{"table": "t", "type": "integer", "in": [1, "x", 2]}]"#);
        assert!(build_plan(&specs, MembershipPolicy::Strict).is_err());
        let plan = build_plan(&specs, MembershipPolicy::Permissive).unwrap();
        let (sql, params) = plan.compile_parameterized().unwrap();
        assert!(sql.ends_with("IN (?, ?)"));
        assert_eq!(params, vec![IndexValue::Integer(1), IndexValue::Integer(2)]);
    }
}
