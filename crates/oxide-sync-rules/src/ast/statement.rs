//! Statement AST types.
//!
//! Sync rules only ever contain `SELECT` statements, so this is the only
//! statement shape. Clauses that bucket queries reject (`LIMIT`, `GROUP BY`,
//! ...) are still parsed so the compiler can report them with a location.

use super::expression::Expr;
use crate::lexer::Span;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// An ORDER BY clause entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// The expression to order by.
    pub expr: Expr,
    /// The direction (ASC or DESC).
    pub direction: OrderDirection,
}

/// Row-locking strength of a `SELECT ... FOR` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrength {
    /// FOR UPDATE
    Update,
    /// FOR SHARE
    Share,
}

/// A `FOR UPDATE` / `FOR SHARE` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockingClause {
    pub strength: LockStrength,
    pub span: Span,
}

/// A table in the FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// Alias.
    pub alias: Option<String>,
    /// Source location.
    pub span: Span,
}

impl TableRef {
    /// The name other clauses use to refer to this table.
    #[must_use]
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A column in the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    /// The expression.
    pub expr: Expr,
    /// Column alias.
    pub alias: Option<String>,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Location of the DISTINCT keyword, if present.
    pub distinct: Option<Span>,
    /// The columns to select.
    pub columns: Vec<SelectColumn>,
    /// The FROM clause.
    pub from: Option<TableRef>,
    /// The WHERE clause.
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING clause.
    pub having: Option<Expr>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT clause.
    pub limit: Option<Expr>,
    /// OFFSET clause.
    pub offset: Option<Expr>,
    /// FOR UPDATE / FOR SHARE.
    pub locking: Option<LockingClause>,
    /// Location of the whole statement.
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_name_prefers_alias() {
        let mut table = TableRef {
            schema: None,
            name: String::from("assets"),
            alias: None,
            span: Span::default(),
        };
        assert_eq!(table.effective_name(), "assets");
        table.alias = Some(String::from("a"));
        assert_eq!(table.effective_name(), "a");
    }
}
