//! Error types for rule compilation and evaluation.

use std::fmt;

use crate::lexer::Span;
use crate::parser::ParseError;

/// A compilation diagnostic for one rule query.
///
/// These are accumulated rather than returned early: a query with
/// diagnostics is still built so every problem can be reported at once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SqlRuleError {
    /// What is wrong.
    pub message: String,
    /// The full SQL text of the query.
    pub sql: String,
    /// Where in `sql` the problem is, when known.
    pub location: Option<Span>,
}

impl SqlRuleError {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(message: impl Into<String>, sql: impl Into<String>, location: Option<Span>) -> Self {
        Self {
            message: message.into(),
            sql: sql.into(),
            location,
        }
    }

    /// Returns the 1-based `(line, column)` of the location, if any.
    #[must_use]
    pub fn line_column(&self) -> Option<(usize, usize)> {
        self.location.map(|span| span.line_column(&self.sql))
    }

    /// Returns the SQL text at the location, if any.
    #[must_use]
    pub fn snippet(&self) -> Option<&str> {
        self.location.and_then(|span| span.slice(&self.sql))
    }

    /// Wraps a parse error of `sql`.
    #[must_use]
    pub fn from_parse_error(error: &ParseError, sql: &str) -> Self {
        Self::new(error.message.clone(), sql, Some(error.span))
    }
}

/// Failure to combine two compiled clauses.
///
/// These mean the rule is structurally invalid and must be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombineError {
    /// Both operands of an AND can produce several assignments.
    #[error("cannot combine multiple unbounded expressions")]
    MultipleUnbounded,

    /// The operands of an OR constrain different bucket parameters.
    #[error(
        "Left and right sides of OR must use the same parameters, or split into separate queries. {} != {}",
        ParameterList(.left),
        ParameterList(.right)
    )]
    MismatchedParameters {
        /// Parameters of the left operand.
        left: Vec<String>,
        /// Parameters of the right operand.
        right: Vec<String>,
    },
}

/// Renders a parameter list as a JSON array of names.
struct ParameterList<'a>(&'a [String]);

impl fmt::Display for ParameterList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{name:?}")?;
        }
        write!(f, "]")
    }
}

/// Errors returned by the public API.
#[derive(Debug, thiserror::Error)]
pub enum SyncRulesError {
    /// The rule SQL could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Two clauses could not be combined.
    #[error(transparent)]
    Combine(#[from] CombineError),

    /// A clause that failed to compile was evaluated.
    #[error("Cannot evaluate a clause that failed to compile")]
    InvalidClause,

    /// A blob cannot be part of a bucket id.
    #[error("Cannot encode a blob value for bucket parameter '{0}'")]
    UnencodableValue(String),
}

/// Result type for rule operations.
pub type Result<T> = std::result::Result<T, SyncRulesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let sql = "SELECT 1\nWHERE x LIMIT 10";
        let error = SqlRuleError::new("LIMIT is not supported", sql, Some(Span::new(23, 25)));
        assert_eq!(error.line_column(), Some((2, 15)));
        assert_eq!(error.snippet(), Some("10"));
        assert_eq!(error.to_string(), "LIMIT is not supported");
    }

    #[test]
    fn test_mismatched_parameters_message() {
        let error = CombineError::MismatchedParameters {
            left: vec![String::from("bucket.a")],
            right: vec![String::from("bucket.a"), String::from("bucket.b")],
        };
        assert_eq!(
            error.to_string(),
            "Left and right sides of OR must use the same parameters, or split into separate \
             queries. [\"bucket.a\"] != [\"bucket.a\",\"bucket.b\"]"
        );
    }

    #[test]
    fn test_unbounded_message() {
        assert_eq!(
            CombineError::MultipleUnbounded.to_string(),
            "cannot combine multiple unbounded expressions"
        );
    }
}
