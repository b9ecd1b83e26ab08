//! Static typing of rule expressions.
//!
//! Types are sets of SQLite storage classes: an expression whose type is
//! `INTEGER | REAL` may produce either at runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;

use crate::value::SqliteValue;

/// A set of storage classes an expression may evaluate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExpressionType(u8);

impl ExpressionType {
    /// No known type (NULL only).
    pub const NONE: Self = Self(0);
    pub const TEXT: Self = Self(1);
    pub const INTEGER: Self = Self(1 << 1);
    pub const REAL: Self = Self(1 << 2);
    pub const BLOB: Self = Self(1 << 3);
    /// `INTEGER | REAL`.
    pub const NUMERIC: Self = Self(Self::INTEGER.0 | Self::REAL.0);
    /// Every storage class.
    pub const ANY: Self = Self(Self::TEXT.0 | Self::NUMERIC.0 | Self::BLOB.0);

    /// Returns true if every class in `other` is also in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if `self` and `other` share a class.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the type is non-empty and only numeric.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !self.is_none() && Self::NUMERIC.contains(self)
    }

    /// The type of a concrete value.
    #[must_use]
    pub const fn of(value: &SqliteValue) -> Self {
        match value {
            SqliteValue::Null => Self::NONE,
            SqliteValue::Integer(_) => Self::INTEGER,
            SqliteValue::Real(_) => Self::REAL,
            SqliteValue::Text(_) => Self::TEXT,
            SqliteValue::Blob(_) => Self::BLOB,
        }
    }
}

impl BitOr for ExpressionType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ExpressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }
        let names = [
            (Self::TEXT, "text"),
            (Self::INTEGER, "integer"),
            (Self::REAL, "real"),
            (Self::BLOB, "blob"),
        ];
        let mut first = true;
        for (class, name) in names {
            if self.contains(class) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Resolves column types for static type inference.
pub trait QuerySchema {
    /// Returns the type of `table.column`, or `None` if unknown.
    fn column_type(&self, table: &str, column: &str) -> Option<ExpressionType>;

    /// Returns the type of `table.column`, treating unknown columns as
    /// possibly anything.
    fn column_type_or_any(&self, table: &str, column: &str) -> ExpressionType {
        self.column_type(table, column)
            .unwrap_or(ExpressionType::ANY)
    }
}

/// In-memory schema: declared column types per table.
///
/// Parameter tables are typically not declared, so their columns resolve to
/// [`ExpressionType::ANY`].
#[derive(Debug, Clone, Default)]
pub struct SourceSchema {
    tables: BTreeMap<String, BTreeMap<String, ExpressionType>>,
}

impl SourceSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a column type.
    #[must_use]
    pub fn column(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        column_type: ExpressionType,
    ) -> Self {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(column.into(), column_type);
        self
    }
}

impl QuerySchema for SourceSchema {
    fn column_type(&self, table: &str, column: &str) -> Option<ExpressionType> {
        self.tables.get(table)?.get(column).copied()
    }
}
