//! Source locations for tokens, AST nodes and rule diagnostics.

/// A half-open byte range into the rule SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the span is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the smallest span covering both `self` and `other`.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Returns the text covered by this span, if it lies on character
    /// boundaries of `source`.
    #[must_use]
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start..self.end)
    }

    /// Returns the 1-based `(line, column)` of the span start in `source`.
    ///
    /// Columns count characters, not bytes.
    #[must_use]
    pub fn line_column(&self, source: &str) -> (usize, usize) {
        let start = self.start.min(source.len());
        let prefix = source.get(..start).unwrap_or(source);
        let line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map_or(0, |i| i + 1);
        let column = prefix[line_start..].chars().count() + 1;
        (line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len_and_empty() {
        assert_eq!(Span::new(5, 10).len(), 5);
        assert!(Span::new(5, 5).is_empty());
        assert!(!Span::new(5, 10).is_empty());
    }

    #[test]
    fn test_span_merge_is_order_independent() {
        let a = Span::new(5, 10);
        let b = Span::new(8, 15);
        assert_eq!(a.merge(b), Span::new(5, 15));
        assert_eq!(b.merge(a), Span::new(5, 15));
    }

    #[test]
    fn test_span_slice() {
        let sql = "SELECT token_parameters.user_id";
        assert_eq!(Span::new(7, 23).slice(sql), Some("token_parameters"));
        assert_eq!(Span::new(7, 100).slice(sql), None);
    }

    #[test]
    fn test_line_column() {
        let sql = "SELECT 1\nFROM users\n  LIMIT 10";
        assert_eq!(Span::new(0, 6).line_column(sql), (1, 1));
        assert_eq!(Span::new(9, 13).line_column(sql), (2, 1));
        let limit = sql.find("LIMIT").unwrap();
        assert_eq!(Span::new(limit, limit + 5).line_column(sql), (3, 3));
    }
}
