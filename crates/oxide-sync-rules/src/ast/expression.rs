//! Expression AST types.

use crate::lexer::Span;

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// String literal.
    String(String),
    /// Blob literal.
    Blob(Vec<u8>),
    /// Boolean literal.
    Boolean(bool),
    /// NULL literal.
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Is,
    IsNot,

    // Logical
    And,
    Or,

    // String
    Concat,
    Like,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::Like => "LIKE",
        }
    }

    /// True for operators whose result is a SQL boolean.
    #[must_use]
    pub const fn is_predicate(&self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::NotEq
                | Self::Lt
                | Self::LtEq
                | Self::Gt
                | Self::GtEq
                | Self::Is
                | Self::IsNot
                | Self::And
                | Self::Or
                | Self::Like
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT
    Not,
    /// Bitwise NOT (~)
    BitNot,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT",
            Self::BitNot => "~",
        }
    }
}

/// Target storage class of a `CAST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Text,
    Integer,
    Real,
    Numeric,
    Blob,
}

impl CastType {
    /// Resolves a declared type name using SQLite's affinity rules.
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        let name = name.to_ascii_uppercase();
        if name.contains("INT") {
            Self::Integer
        } else if name.contains("CHAR") || name.contains("CLOB") || name.contains("TEXT") {
            Self::Text
        } else if name.contains("BLOB") || name.is_empty() {
            Self::Blob
        } else if name.contains("REAL") || name.contains("FLOA") || name.contains("DOUB") {
            Self::Real
        } else {
            Self::Numeric
        }
    }
}

/// Right-hand side of an `IN` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum InTarget {
    /// `x IN (a, b, c)`
    List(Vec<Expr>),
    /// `x IN expr`, where `expr` evaluates to a JSON array.
    Array(Box<Expr>),
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The function name, as written.
    pub name: String,
    /// The arguments.
    pub args: Vec<Expr>,
}

/// An SQL expression with its location in the rule text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// What the expression is.
    pub kind: ExprKind,
    /// Where it was written.
    pub span: Span,
}

/// The shape of an [`Expr`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal value.
    Literal(Literal),

    /// A column reference, optionally qualified with a table name.
    Column {
        /// Table name or alias.
        table: Option<String>,
        /// Column name.
        name: String,
    },

    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// A function call.
    Function(FunctionCall),

    /// IS NULL expression.
    IsNull {
        /// The expression to check.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },

    /// IN expression.
    In {
        /// The expression to check.
        expr: Box<Expr>,
        /// The values to check against.
        target: InTarget,
        /// Whether this is NOT IN.
        negated: bool,
    },

    /// BETWEEN expression.
    Between {
        /// The expression to check.
        expr: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
        /// Whether this is NOT BETWEEN.
        negated: bool,
    },

    /// CAST expression.
    Cast {
        /// Expression to cast.
        expr: Box<Expr>,
        /// Target type.
        cast_as: CastType,
    },

    /// Wildcard (`*` or `table.*`) in a select list.
    Wildcard {
        /// Table qualifier.
        table: Option<String>,
    },
}

impl Expr {
    /// Creates an expression node.
    #[must_use]
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns `(table, column)` if this is a column reference.
    #[must_use]
    pub fn as_column(&self) -> Option<(Option<&str>, &str)> {
        match &self.kind {
            ExprKind::Column { table, name } => Some((table.as_deref(), name.as_str())),
            _ => None,
        }
    }

    /// Builds a binary expression spanning both operands.
    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Self) -> Self {
        let span = self.span.merge(right.span);
        Self::new(
            ExprKind::Binary {
                left: Box::new(self),
                op,
                right: Box::new(right),
            },
            span,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_type_affinity() {
        assert_eq!(CastType::from_type_name("BIGINT"), CastType::Integer);
        assert_eq!(CastType::from_type_name("varchar"), CastType::Text);
        assert_eq!(CastType::from_type_name("text"), CastType::Text);
        assert_eq!(CastType::from_type_name("BLOB"), CastType::Blob);
        assert_eq!(CastType::from_type_name("double"), CastType::Real);
        assert_eq!(CastType::from_type_name("decimal"), CastType::Numeric);
    }

    #[test]
    fn test_binary_builder_merges_spans() {
        let left = Expr::new(
            ExprKind::Column {
                table: Some(String::from("bucket")),
                name: String::from("id"),
            },
            Span::new(6, 15),
        );
        let right = Expr::new(ExprKind::Literal(Literal::Integer(1)), Span::new(18, 19));
        let expr = left.binary(BinaryOp::Eq, right);
        assert_eq!(expr.span, Span::new(6, 19));
        assert!(matches!(
            expr.kind,
            ExprKind::Binary {
                op: BinaryOp::Eq,
                ..
            }
        ));
    }

    #[test]
    fn test_predicate_operators() {
        assert!(BinaryOp::Eq.is_predicate());
        assert!(BinaryOp::Like.is_predicate());
        assert!(!BinaryOp::Add.is_predicate());
        assert!(!BinaryOp::Concat.is_predicate());
    }
}
