//! Rendering compilation diagnostics.

use std::fmt::Write as _;

use oxide_sync_rules::SqlRuleError;

/// Formats one diagnostic as `line:column: message`, followed by the
/// offending source line and a caret under the location.
#[must_use]
pub fn format_diagnostic(error: &SqlRuleError) -> String {
    let Some((line, column)) = error.line_column() else {
        return error.message.clone();
    };
    let mut out = format!("{line}:{column}: {}", error.message);
    if let Some(source_line) = error.sql.lines().nth(line - 1) {
        let width = error
            .snippet()
            .map_or(1, |snippet| snippet.lines().next().unwrap_or("").chars().count().max(1));
        let _ = write!(
            out,
            "\n  {source_line}\n  {}{}",
            " ".repeat(column - 1),
            "^".repeat(width)
        );
    }
    out
}

/// Formats every diagnostic, separated by blank lines.
#[must_use]
pub fn format_diagnostics(errors: &[SqlRuleError]) -> String {
    errors
        .iter()
        .map(format_diagnostic)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_sync_rules::Span;

    #[test]
    fn test_diagnostic_with_location() {
        let sql = "SELECT token_parameters.a AS a\nLIMIT 10";
        let error = SqlRuleError::new("LIMIT is not supported", sql, Some(Span::new(37, 39)));
        assert_eq!(
            format_diagnostic(&error),
            "2:7: LIMIT is not supported\n  LIMIT 10\n        ^^"
        );
    }

    #[test]
    fn test_diagnostic_without_location() {
        let error = SqlRuleError::new("Something failed", "SELECT 1", None);
        assert_eq!(format_diagnostic(&error), "Something failed");
    }

    #[test]
    fn test_diagnostics_are_separated() {
        let errors = [
            SqlRuleError::new("first", "SELECT 1", None),
            SqlRuleError::new("second", "SELECT 1", None),
        ];
        assert_eq!(format_diagnostics(&errors), "first\n\nsecond");
    }
}
