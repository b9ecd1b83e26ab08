//! Operator and scalar function evaluation with SQLite semantics, and the
//! matching static type inference.

use std::cmp::Ordering;

use crate::ast::{BinaryOp, CastType, UnaryOp};
use crate::schema::ExpressionType;
use crate::value::{is_truthy, sqlite_not, SqliteValue, SQLITE_FALSE, SQLITE_TRUE};

/// Evaluates `left op right`.
#[must_use]
pub fn evaluate_operator(op: BinaryOp, left: &SqliteValue, right: &SqliteValue) -> SqliteValue {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            arithmetic(op, left, right)
        }
        BinaryOp::Mod => remainder(left, right),
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq => {
            if left.is_null() || right.is_null() {
                return SqliteValue::Null;
            }
            compare(left, right).map_or(SqliteValue::Null, |ordering| {
                let result = match op {
                    BinaryOp::Eq => ordering == Ordering::Equal,
                    BinaryOp::NotEq => ordering != Ordering::Equal,
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::LtEq => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                SqliteValue::from(result)
            })
        }
        BinaryOp::Is => SqliteValue::from(is_same(left, right)),
        BinaryOp::IsNot => SqliteValue::from(!is_same(left, right)),
        BinaryOp::And => {
            if is_false(left) || is_false(right) {
                SqliteValue::Integer(SQLITE_FALSE)
            } else if left.is_null() || right.is_null() {
                SqliteValue::Null
            } else {
                SqliteValue::Integer(SQLITE_TRUE)
            }
        }
        BinaryOp::Or => {
            if is_truthy(left) || is_truthy(right) {
                SqliteValue::Integer(SQLITE_TRUE)
            } else if left.is_null() || right.is_null() {
                SqliteValue::Null
            } else {
                SqliteValue::Integer(SQLITE_FALSE)
            }
        }
        BinaryOp::Concat => match (left.to_text(), right.to_text()) {
            (Some(mut a), Some(b)) => {
                a.push_str(&b);
                SqliteValue::Text(a)
            }
            _ => SqliteValue::Null,
        },
        BinaryOp::Like => match (left.to_text(), right.to_text()) {
            (Some(text), Some(pattern)) => SqliteValue::from(like(&pattern, &text)),
            _ => SqliteValue::Null,
        },
    }
}

/// Infers the static type of `left op right`.
#[must_use]
pub fn operator_return_type(
    op: BinaryOp,
    left: ExpressionType,
    right: ExpressionType,
) -> ExpressionType {
    match op {
        BinaryOp::Concat => ExpressionType::TEXT,
        BinaryOp::Mod => ExpressionType::INTEGER,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            if left == ExpressionType::INTEGER && right == ExpressionType::INTEGER {
                ExpressionType::INTEGER
            } else if left.is_numeric()
                && right.is_numeric()
                && (left == ExpressionType::REAL || right == ExpressionType::REAL)
            {
                ExpressionType::REAL
            } else {
                ExpressionType::NUMERIC
            }
        }
        _ => ExpressionType::INTEGER,
    }
}

/// Evaluates a unary operator.
#[must_use]
pub fn evaluate_unary(op: UnaryOp, value: &SqliteValue) -> SqliteValue {
    match op {
        UnaryOp::Not if value.is_null() => SqliteValue::Null,
        UnaryOp::Not => SqliteValue::Integer(sqlite_not(value)),
        UnaryOp::Neg => match value.to_numeric() {
            None => SqliteValue::Null,
            Some(SqliteValue::Integer(n)) => n.checked_neg().map_or_else(
                || SqliteValue::Real(-as_real(n)),
                SqliteValue::Integer,
            ),
            Some(SqliteValue::Real(f)) => SqliteValue::Real(-f),
            Some(_) => SqliteValue::Integer(0),
        },
        UnaryOp::BitNot => match value.to_numeric() {
            None => SqliteValue::Null,
            Some(numeric) => SqliteValue::Integer(!truncate(&numeric)),
        },
    }
}

/// Infers the static type of a unary operator application.
#[must_use]
pub fn unary_return_type(op: UnaryOp, operand: ExpressionType) -> ExpressionType {
    match op {
        UnaryOp::Neg if operand.is_numeric() => operand,
        UnaryOp::Neg => ExpressionType::NUMERIC,
        UnaryOp::Not | UnaryOp::BitNot => ExpressionType::INTEGER,
    }
}

/// Converts `value` to the storage class of a `CAST`.
#[must_use]
pub fn cast_value(value: &SqliteValue, cast_as: CastType) -> SqliteValue {
    if value.is_null() {
        return SqliteValue::Null;
    }
    match cast_as {
        CastType::Text => value.to_text().map_or(SqliteValue::Null, SqliteValue::Text),
        CastType::Integer => value
            .to_numeric()
            .map_or(SqliteValue::Null, |n| SqliteValue::Integer(truncate(&n))),
        CastType::Real => match value.to_numeric() {
            Some(SqliteValue::Integer(n)) => SqliteValue::Real(as_real(n)),
            Some(real @ SqliteValue::Real(_)) => real,
            _ => SqliteValue::Null,
        },
        CastType::Numeric => match value.to_numeric() {
            #[allow(clippy::cast_possible_truncation)]
            Some(SqliteValue::Real(f))
                if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 =>
            {
                SqliteValue::Integer(f as i64)
            }
            Some(numeric) => numeric,
            None => SqliteValue::Null,
        },
        CastType::Blob => match value {
            SqliteValue::Blob(_) => value.clone(),
            other => other
                .to_text()
                .map_or(SqliteValue::Null, |text| SqliteValue::Blob(text.into_bytes())),
        },
    }
}

/// Static type of a `CAST`.
#[must_use]
pub const fn cast_return_type(cast_as: CastType) -> ExpressionType {
    match cast_as {
        CastType::Text => ExpressionType::TEXT,
        CastType::Integer => ExpressionType::INTEGER,
        CastType::Real => ExpressionType::REAL,
        CastType::Numeric => ExpressionType::NUMERIC,
        CastType::Blob => ExpressionType::BLOB,
    }
}

/// Scalar functions available in rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunction {
    Upper,
    Lower,
    Length,
    TypeOf,
    IfNull,
    Coalesce,
}

impl ScalarFunction {
    /// Looks up a function by name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "upper" => Some(Self::Upper),
            "lower" => Some(Self::Lower),
            "length" => Some(Self::Length),
            "typeof" => Some(Self::TypeOf),
            "ifnull" => Some(Self::IfNull),
            "coalesce" => Some(Self::Coalesce),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Length => "length",
            Self::TypeOf => "typeof",
            Self::IfNull => "ifnull",
            Self::Coalesce => "coalesce",
        }
    }

    /// Checks the argument count.
    ///
    /// # Errors
    ///
    /// Returns a message describing the expected arity.
    pub fn check_arity(self, count: usize) -> Result<(), String> {
        let ok = match self {
            Self::Upper | Self::Lower | Self::Length | Self::TypeOf => count == 1,
            Self::IfNull => count == 2,
            Self::Coalesce => count >= 2,
        };
        if ok {
            return Ok(());
        }
        let expected = match self {
            Self::IfNull => "2 arguments",
            Self::Coalesce => "at least 2 arguments",
            _ => "1 argument",
        };
        Err(format!(
            "{}() expects {expected}, got {count}",
            self.name()
        ))
    }

    /// Calls the function. The arity must already have been checked.
    #[must_use]
    pub fn evaluate(self, args: &[SqliteValue]) -> SqliteValue {
        let first = args.first().unwrap_or(&SqliteValue::Null);
        match self {
            Self::Upper => first
                .to_text()
                .map_or(SqliteValue::Null, |s| SqliteValue::Text(s.to_ascii_uppercase())),
            Self::Lower => first
                .to_text()
                .map_or(SqliteValue::Null, |s| SqliteValue::Text(s.to_ascii_lowercase())),
            Self::Length => match first {
                SqliteValue::Null => SqliteValue::Null,
                SqliteValue::Blob(b) => SqliteValue::Integer(count_to_i64(b.len())),
                other => other.to_text().map_or(SqliteValue::Null, |s| {
                    SqliteValue::Integer(count_to_i64(s.chars().count()))
                }),
            },
            Self::TypeOf => SqliteValue::from(first.type_name()),
            Self::IfNull | Self::Coalesce => args
                .iter()
                .find(|value| !value.is_null())
                .cloned()
                .unwrap_or(SqliteValue::Null),
        }
    }

    /// Infers the static return type from the argument types.
    #[must_use]
    pub fn return_type(self, args: &[ExpressionType]) -> ExpressionType {
        match self {
            Self::Upper | Self::Lower | Self::TypeOf => ExpressionType::TEXT,
            Self::Length => ExpressionType::INTEGER,
            Self::IfNull | Self::Coalesce => args
                .iter()
                .fold(ExpressionType::NONE, |acc, arg| acc | *arg),
        }
    }
}

fn is_false(value: &SqliteValue) -> bool {
    !value.is_null() && !is_truthy(value)
}

/// `IS` comparison: NULL is the same as NULL.
fn is_same(left: &SqliteValue, right: &SqliteValue) -> bool {
    match (left.is_null(), right.is_null()) {
        (true, true) => true,
        (false, false) => compare(left, right) == Some(Ordering::Equal),
        _ => false,
    }
}

const fn storage_rank(value: &SqliteValue) -> u8 {
    match value {
        SqliteValue::Null => 0,
        SqliteValue::Integer(_) | SqliteValue::Real(_) => 1,
        SqliteValue::Text(_) => 2,
        SqliteValue::Blob(_) => 3,
    }
}

/// Orders two values: NULL, then numbers, then text, then blobs.
fn compare(left: &SqliteValue, right: &SqliteValue) -> Option<Ordering> {
    match (left, right) {
        (SqliteValue::Integer(a), SqliteValue::Integer(b)) => Some(a.cmp(b)),
        (SqliteValue::Integer(a), SqliteValue::Real(b)) => as_real(*a).partial_cmp(b),
        (SqliteValue::Real(a), SqliteValue::Integer(b)) => a.partial_cmp(&as_real(*b)),
        (SqliteValue::Real(a), SqliteValue::Real(b)) => a.partial_cmp(b),
        (SqliteValue::Text(a), SqliteValue::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
        (SqliteValue::Blob(a), SqliteValue::Blob(b)) => Some(a.cmp(b)),
        _ => Some(storage_rank(left).cmp(&storage_rank(right))),
    }
}

fn arithmetic(op: BinaryOp, left: &SqliteValue, right: &SqliteValue) -> SqliteValue {
    let (Some(a), Some(b)) = (left.to_numeric(), right.to_numeric()) else {
        return SqliteValue::Null;
    };

    if let (SqliteValue::Integer(x), SqliteValue::Integer(y)) = (&a, &b) {
        let (x, y) = (*x, *y);
        if op == BinaryOp::Div && y == 0 {
            return SqliteValue::Null;
        }
        let checked = match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Sub => x.checked_sub(y),
            BinaryOp::Mul => x.checked_mul(y),
            _ => x.checked_div(y),
        };
        if let Some(n) = checked {
            return SqliteValue::Integer(n);
        }
    }

    let (x, y) = (to_real(&a), to_real(&b));
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        _ => {
            if y == 0.0 {
                return SqliteValue::Null;
            }
            x / y
        }
    };
    SqliteValue::Real(result)
}

fn remainder(left: &SqliteValue, right: &SqliteValue) -> SqliteValue {
    let (Some(a), Some(b)) = (left.to_numeric(), right.to_numeric()) else {
        return SqliteValue::Null;
    };
    let (x, y) = (truncate(&a), truncate(&b));
    if y == 0 {
        return SqliteValue::Null;
    }
    SqliteValue::Integer(x.wrapping_rem(y))
}

#[allow(clippy::cast_precision_loss)]
const fn as_real(n: i64) -> f64 {
    n as f64
}

fn to_real(value: &SqliteValue) -> f64 {
    match value {
        SqliteValue::Integer(n) => as_real(*n),
        SqliteValue::Real(f) => *f,
        _ => 0.0,
    }
}

/// Truncates a numeric value towards zero, saturating at the i64 range.
#[allow(clippy::cast_possible_truncation)]
fn truncate(value: &SqliteValue) -> i64 {
    match value {
        SqliteValue::Integer(n) => *n,
        SqliteValue::Real(f) => *f as i64,
        _ => 0,
    }
}

fn count_to_i64(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// SQL `LIKE`: `%` matches any run of characters, `_` any single character,
/// ASCII letters compare case-insensitively.
fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len()
            && (pattern[p] == '_' || pattern[p].eq_ignore_ascii_case(&text[t]))
        {
            p += 1;
            t += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}
