//! Parser error types.

use thiserror::Error;

use crate::lexer::{Span, TokenKind};

/// A parse error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at position {}..{}", span.start, span.end)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// Expected tokens (if applicable).
    pub expected: Option<String>,
    /// The actual token found.
    pub found: Option<TokenKind>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
        }
    }

    /// Creates an "unexpected token" error.
    ///
    /// Lexer errors are reported with their own message rather than as an
    /// unexpected token.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        let expected: String = expected.into();
        let message = match &found {
            TokenKind::Error(message) => message.clone(),
            TokenKind::Eof => format!("Unexpected end of input: expected {expected}"),
            other => format!("Unexpected token: expected {expected}, found {}", other.describe()),
        };
        Self {
            message,
            span,
            expected: Some(expected),
            found: Some(found),
        }
    }
}
