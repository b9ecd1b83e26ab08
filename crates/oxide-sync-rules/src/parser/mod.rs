//! SQL Parser
//!
//! A hand-written recursive descent parser with Pratt expression parsing,
//! restricted to the single `SELECT` statements sync rules are written in.

mod error;
mod parser;
mod pratt;

pub use error::ParseError;
pub use parser::Parser;

use crate::ast::SelectStatement;

/// Parses one `SELECT` statement.
///
/// # Errors
///
/// Returns a `ParseError` if `sql` is not a single valid `SELECT`.
pub fn parse_select(sql: &str) -> Result<SelectStatement, ParseError> {
    Parser::new(sql).parse_select()
}
