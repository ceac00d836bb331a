//! Query syntax tree.
//!
//! A [`SelectQuery`] is assembled node by node and rendered in one place,
//! [`SelectQuery::to_sql`] (or its parameterized sibling). Values enter the
//! tree only as [`Operand`]s, whose text is an already escaped
//! [`SqlLiteral`]; table names only as [`Identifier`]s.

use crate::literal::{Identifier, SqlLiteral};
use crate::value::IndexValue;
use std::fmt::{self, Write};

/// Table alias `idxN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alias(usize);

impl Alias {
    /// Alias of the primary table.
    pub const PRIMARY: Alias = Alias(0);

    /// Alias for the `index`-th criterion.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns N.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "idx{}", self.0)
    }
}

/// A table with its alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Table name.
    pub table: Identifier,
    /// Alias used in every clause.
    pub alias: Alias,
}

impl TableRef {
    /// Creates a table reference.
    #[must_use]
    pub fn new(table: Identifier, alias: Alias) -> Self {
        Self { table, alias }
    }
}

/// Comparison operator on an index value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
}

impl Comparison {
    /// Operator text.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
        }
    }
}

/// A converted value together with its escaped literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    /// Escaped form, embedded by [`SelectQuery::to_sql`].
    pub literal: SqlLiteral,
    /// Canonical value, bound by [`SelectQuery::to_parameterized_sql`].
    pub value: IndexValue,
}

/// One conjunct of the WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `alias.value <op> operand`
    Compare {
        /// Table the predicate applies to.
        alias: Alias,
        /// Operator.
        op: Comparison,
        /// Right-hand side.
        operand: Operand,
    },
    /// `alias.value IN (operands)`; never empty.
    In {
        /// Table the predicate applies to.
        alias: Alias,
        /// Set members.
        operands: Vec<Operand>,
    },
}

impl Predicate {
    /// Returns the alias this predicate constrains.
    #[must_use]
    pub fn alias(&self) -> Alias {
        match self {
            Predicate::Compare { alias, .. } | Predicate::In { alias, .. } => *alias,
        }
    }
}

/// `SELECT DISTINCT` over document ids of the primary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    from: TableRef,
    joins: Vec<TableRef>,
    predicates: Vec<Predicate>,
}

enum Render<'a> {
    Inline,
    Parameterized(&'a mut Vec<IndexValue>),
}

impl Render<'_> {
    fn operand(&mut self, out: &mut String, operand: &Operand) {
        match self {
            Render::Inline => out.push_str(operand.literal.as_str()),
            Render::Parameterized(params) => {
                out.push('?');
                params.push(operand.value.clone());
            }
        }
    }
}

impl SelectQuery {
    /// Starts a query over `from`.
    #[must_use]
    pub fn new(from: TableRef) -> Self {
        Self {
            from,
            joins: Vec::new(),
            predicates: Vec::new(),
        }
    }

    /// Joins `table` to the primary table on document id.
    pub fn join(&mut self, table: TableRef) {
        self.joins.push(table);
    }

    /// Adds a conjunct.
    pub fn filter(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    /// The primary table.
    #[must_use]
    pub fn primary(&self) -> &TableRef {
        &self.from
    }

    /// Joined tables in addition order.
    #[must_use]
    pub fn joins(&self) -> &[TableRef] {
        &self.joins
    }

    /// WHERE conjuncts in addition order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Renders the query with values embedded as escaped literals.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.render(Render::Inline)
    }

    /// Renders the query with `?` placeholders, returning the canonical
    /// values in placeholder order.
    #[must_use]
    pub fn to_parameterized_sql(&self) -> (String, Vec<IndexValue>) {
        let mut params = Vec::new();
        let sql = self.render(Render::Parameterized(&mut params));
        (sql, params)
    }

    fn render(&self, mut mode: Render<'_>) -> String {
        let primary = self.from.alias;
        let mut out = String::with_capacity(64 + 48 * self.joins.len());

        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "SELECT DISTINCT {primary}.docid FROM {} AS {primary}",
            self.from.table
        );
        for join in &self.joins {
            let _ = write!(
                out,
                " JOIN {} AS {alias} ON {primary}.docid = {alias}.docid",
                join.table,
                alias = join.alias
            );
        }

        for (i, predicate) in self.predicates.iter().enumerate() {
            out.push_str(if i == 0 { " WHERE " } else { " AND " });
            match predicate {
                Predicate::Compare { alias, op, operand } => {
                    let _ = write!(out, "{alias}.value {} ", op.symbol());
                    mode.operand(&mut out, operand);
                }
                Predicate::In { alias, operands } => {
                    let _ = write!(out, "{alias}.value IN (");
                    for (j, operand) in operands.iter().enumerate() {
                        if j > 0 {
                            out.push_str(", ");
                        }
                        mode.operand(&mut out, operand);
                    }
                    out.push(')');
                }
            }
        }
        out
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, n: usize) -> TableRef {
        TableRef::new(Identifier::new(name).unwrap(), Alias::new(n))
    }

    fn int(i: i64) -> Operand {
        Operand {
            literal: SqlLiteral::integer(i),
            value: IndexValue::Integer(i),
        }
    }

    #[test]
    fn alias_display() {
        assert_eq!(Alias::PRIMARY.to_string(), "idx0");
        assert_eq!(Alias::new(12).to_string(), "idx12");
    }

    #[test]
    fn renders_joins_and_predicates() {
        let mut query = SelectQuery::new(table("a", 0));
        query.join(table("b", 1));
        query.filter(Predicate::In {
            alias: Alias::new(0),
            operands: vec![int(1), int(2)],
        });
        query.filter(Predicate::Compare {
            alias: Alias::new(1),
            op: Comparison::Lt,
            operand: int(9),
        });

        assert_eq!(
            query.to_sql(),
            "SELECT DISTINCT idx0.docid FROM a AS idx0 \
             JOIN b AS idx1 ON idx0.docid = idx1.docid \
             WHERE idx0.value IN (1, 2) AND idx1.value < 9"
        );

        let (sql, params) = query.to_parameterized_sql();
        assert_eq!(
            sql,
            "SELECT DISTINCT idx0.docid FROM a AS idx0 \
             JOIN b AS idx1 ON idx0.docid = idx1.docid \
             WHERE idx0.value IN (?, ?) AND idx1.value < ?"
        );
        assert_eq!(
            params,
            vec![IndexValue::Integer(1), IndexValue::Integer(2), IndexValue::Integer(9)]
        );
    }

    #[test]
    fn no_predicates_no_where() {
        let query = SelectQuery::new(table("t", 0));
        assert_eq!(query.to_string(), "SELECT DISTINCT idx0.docid FROM t AS idx0");
        assert!(query.predicates().is_empty());
    }
}
