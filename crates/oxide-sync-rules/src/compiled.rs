//! A compiled value together with the diagnostics produced while compiling it.

use crate::error::SqlRuleError;

/// The result of a compilation step that may report problems without
/// failing.
#[derive(Debug, Clone)]
pub struct Compiled<T> {
    /// The compiled value. May be a placeholder when `errors` is non-empty.
    pub value: T,
    /// Diagnostics, in source order.
    pub errors: Vec<SqlRuleError>,
}

impl<T> Compiled<T> {
    /// A value compiled without diagnostics.
    #[must_use]
    pub const fn ok(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    /// A value with one diagnostic.
    #[must_use]
    pub fn with_error(value: T, error: SqlRuleError) -> Self {
        Self {
            value,
            errors: vec![error],
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn push_error(&mut self, error: SqlRuleError) {
        self.errors.push(error);
    }

    /// Transforms the value, keeping the diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Compiled<U> {
        Compiled {
            value: f(self.value),
            errors: self.errors,
        }
    }

    /// Chains another compilation step, appending its diagnostics.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Compiled<U>) -> Compiled<U> {
        let mut next = f(self.value);
        let mut errors = self.errors;
        errors.append(&mut next.errors);
        Compiled {
            value: next.value,
            errors,
        }
    }

    /// Transforms the value with a step that can fail outright.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`; accumulated diagnostics are dropped.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Compiled<U>, E> {
        Ok(Compiled {
            value: f(self.value)?,
            errors: self.errors,
        })
    }

    /// Pairs two compiled values, concatenating their diagnostics.
    pub fn zip<U>(self, other: Compiled<U>) -> Compiled<(T, U)> {
        let mut errors = self.errors;
        errors.extend(other.errors);
        Compiled {
            value: (self.value, other.value),
            errors,
        }
    }

    #[must_use]
    pub fn into_parts(self) -> (T, Vec<SqlRuleError>) {
        (self.value, self.errors)
    }
}

impl<T> Compiled<Vec<T>> {
    /// Collects compiled items, concatenating diagnostics in order.
    pub fn collect(items: impl IntoIterator<Item = Compiled<T>>) -> Self {
        let mut result = Self::ok(Vec::new());
        for item in items {
            result.value.push(item.value);
            result.errors.extend(item.errors);
        }
        result
    }
}
