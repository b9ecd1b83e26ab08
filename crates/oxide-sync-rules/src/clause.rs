//! Compiled clauses.
//!
//! Every expression in a rule compiles to one of four shapes:
//!
//! - [`StaticRowValueClause`]: a value computed from the row or the
//!   session parameters, such as `token_parameters.is_admin`.
//! - [`ParameterValueClause`]: a bare bucket parameter, such as
//!   `bucket.user_id`.
//! - [`ParameterMatchClause`]: the set of bucket parameter assignments
//!   under which the input qualifies.
//! - [`ClauseError`]: compilation failed; the diagnostic has already been
//!   recorded.
//!
//! Clauses are immutable once built and cheap to clone; combined clauses
//! share their operands through `Arc`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SyncRulesError};
use crate::schema::{ExpressionType, QuerySchema};
use crate::value::{QueryParameters, SqliteValue};

/// One assignment of values to bucket parameters, keyed by the full
/// parameter name (`bucket.user_id`).
pub type FilterParameters = BTreeMap<String, SqliteValue>;

type EvaluateFn = dyn Fn(&QueryParameters) -> SqliteValue + Send + Sync;
type TypeFn = dyn Fn(&dyn QuerySchema) -> ExpressionType + Send + Sync;
type FilterFn = dyn Fn(&QueryParameters) -> Result<Vec<FilterParameters>> + Send + Sync;

/// An expression that does not depend on bucket parameters.
#[derive(Clone)]
pub struct StaticRowValueClause {
    evaluate: Arc<EvaluateFn>,
    get_type: Arc<TypeFn>,
}

impl StaticRowValueClause {
    pub fn new<E, T>(evaluate: E, get_type: T) -> Self
    where
        E: Fn(&QueryParameters) -> SqliteValue + Send + Sync + 'static,
        T: Fn(&dyn QuerySchema) -> ExpressionType + Send + Sync + 'static,
    {
        Self {
            evaluate: Arc::new(evaluate),
            get_type: Arc::new(get_type),
        }
    }

    /// A clause that always evaluates to `value`.
    #[must_use]
    pub fn constant(value: SqliteValue) -> Self {
        let value_type = ExpressionType::of(&value);
        Self::new(move |_| value.clone(), move |_| value_type)
    }

    #[must_use]
    pub fn evaluate(&self, parameters: &QueryParameters) -> SqliteValue {
        (self.evaluate)(parameters)
    }

    /// The statically inferred result type.
    #[must_use]
    pub fn result_type(&self, schema: &dyn QuerySchema) -> ExpressionType {
        (self.get_type)(schema)
    }
}

impl fmt::Debug for StaticRowValueClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticRowValueClause").finish_non_exhaustive()
    }
}

/// A bare reference to one bucket parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterValueClause {
    /// Full parameter name, such as `bucket.user_id`.
    pub bucket_parameter: String,
}

/// The set of bucket parameter assignments under which an input qualifies.
#[derive(Clone)]
pub struct ParameterMatchClause {
    bucket_parameters: Vec<String>,
    unbounded: bool,
    error: bool,
    filter: Arc<FilterFn>,
}

impl ParameterMatchClause {
    /// Creates a match clause. Duplicate parameter names are dropped,
    /// keeping the first occurrence.
    pub fn new<F>(bucket_parameters: Vec<String>, unbounded: bool, filter: F) -> Self
    where
        F: Fn(&QueryParameters) -> Result<Vec<FilterParameters>> + Send + Sync + 'static,
    {
        Self {
            bucket_parameters: dedup(bucket_parameters),
            unbounded,
            error: false,
            filter: Arc::new(filter),
        }
    }

    /// The match clause standing in for an expression that failed to
    /// compile. Filtering it fails.
    #[must_use]
    pub fn error() -> Self {
        Self {
            bucket_parameters: vec![],
            unbounded: false,
            error: true,
            filter: Arc::new(|_| Err(SyncRulesError::InvalidClause)),
        }
    }

    /// Marks the clause as built from an erroneous operand.
    #[must_use]
    pub(crate) fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    /// Parameter names this clause constrains, in first-use order.
    #[must_use]
    pub fn bucket_parameters(&self) -> &[String] {
        &self.bucket_parameters
    }

    /// True if one input can produce more than one assignment.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.unbounded
    }

    /// True if the clause was built from an expression that failed to compile.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error
    }

    /// Returns every assignment under which `parameters` qualifies. The
    /// result may contain duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`SyncRulesError::InvalidClause`] if the clause, or one it
    /// was combined from, failed to compile.
    pub fn filter(&self, parameters: &QueryParameters) -> Result<Vec<FilterParameters>> {
        (self.filter)(parameters)
    }
}

impl fmt::Debug for ParameterMatchClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterMatchClause")
            .field("bucket_parameters", &self.bucket_parameters)
            .field("unbounded", &self.unbounded)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Marker for an expression that failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClauseError;

/// A compiled expression.
#[derive(Debug, Clone)]
pub enum CompiledClause {
    StaticValue(StaticRowValueClause),
    ParameterValue(ParameterValueClause),
    ParameterMatch(ParameterMatchClause),
    Error(ClauseError),
}

impl CompiledClause {
    #[must_use]
    pub const fn is_static_value(&self) -> bool {
        matches!(self, Self::StaticValue(_))
    }

    #[must_use]
    pub const fn is_parameter_value(&self) -> bool {
        matches!(self, Self::ParameterValue(_))
    }

    #[must_use]
    pub const fn is_parameter_match(&self) -> bool {
        matches!(self, Self::ParameterMatch(_))
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the static clause, if this is one.
    #[must_use]
    pub const fn as_static_value(&self) -> Option<&StaticRowValueClause> {
        match self {
            Self::StaticValue(clause) => Some(clause),
            _ => None,
        }
    }
}

impl From<StaticRowValueClause> for CompiledClause {
    fn from(clause: StaticRowValueClause) -> Self {
        Self::StaticValue(clause)
    }
}

impl From<ParameterValueClause> for CompiledClause {
    fn from(clause: ParameterValueClause) -> Self {
        Self::ParameterValue(clause)
    }
}

impl From<ParameterMatchClause> for CompiledClause {
    fn from(clause: ParameterMatchClause) -> Self {
        Self::ParameterMatch(clause)
    }
}

impl From<ClauseError> for CompiledClause {
    fn from(clause: ClauseError) -> Self {
        Self::Error(clause)
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}
