//! Operator precedence tables for the Pratt expression parser.

use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{Keyword, TokenKind};

/// Binding power of `NOT` as a prefix operator. It binds looser than
/// comparisons and tighter than `AND`, so `NOT a = b AND c` is
/// `(NOT (a = b)) AND c`.
pub const NOT_BINDING_POWER: u8 = 6;

/// Binding power of unary `-` and `~`.
pub const UNARY_BINDING_POWER: u8 = 17;

/// Returns the infix binding power for a token.
///
/// Returns `(left_bp, right_bp)` where:
/// - Higher binding power = binds tighter
/// - Left associative: `left_bp < right_bp`
///
/// `NOT` is included because it introduces `NOT IN`, `NOT LIKE` and
/// `NOT BETWEEN` in infix position.
///
/// Returns `None` if the token is not an infix operator.
#[must_use]
pub const fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Keyword(Keyword::Or) => Some((1, 2)),
        TokenKind::Keyword(Keyword::And) => Some((4, 5)),

        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Keyword(
            Keyword::Is | Keyword::In | Keyword::Between | Keyword::Like | Keyword::Not,
        ) => Some((6, 7)),

        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => Some((8, 9)),

        TokenKind::Plus | TokenKind::Minus => Some((10, 11)),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((12, 13)),
        TokenKind::Concat => Some((14, 15)),

        _ => None,
    }
}

/// Converts a token to a plain binary operator.
#[must_use]
pub const fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
        TokenKind::Keyword(Keyword::Like) => Some(BinaryOp::Like),
        TokenKind::Concat => Some(BinaryOp::Concat),
        _ => None,
    }
}

/// Converts a token to a unary operator, with its binding power.
#[must_use]
pub const fn token_to_unary_op(kind: &TokenKind) -> Option<(UnaryOp, u8)> {
    match kind {
        TokenKind::Minus => Some((UnaryOp::Neg, UNARY_BINDING_POWER)),
        TokenKind::BitNot => Some((UnaryOp::BitNot, UNARY_BINDING_POWER)),
        TokenKind::Keyword(Keyword::Not) => Some((UnaryOp::Not, NOT_BINDING_POWER)),
        _ => None,
    }
}
