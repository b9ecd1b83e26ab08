//! Abstract Syntax Tree (AST) types for sync rule queries.

mod expression;
mod statement;

pub use expression::{BinaryOp, CastType, Expr, ExprKind, FunctionCall, InTarget, Literal, UnaryOp};
pub use statement::{
    LockStrength, LockingClause, OrderBy, OrderDirection, SelectColumn, SelectStatement, TableRef,
};
