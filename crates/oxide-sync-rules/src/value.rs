//! SQLite-typed values and the rows and parameter sets they live in.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// SQL boolean `true`.
pub const SQLITE_TRUE: i64 = 1;
/// SQL boolean `false`.
pub const SQLITE_FALSE: i64 = 0;

/// A dynamically typed SQLite value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SqliteValue {
    /// NULL value.
    #[default]
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Binary blob.
    Blob(Vec<u8>),
}

impl SqliteValue {
    /// Returns true for NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if the value can be represented as JSON.
    ///
    /// Blobs are the only storage class that cannot.
    #[must_use]
    pub const fn is_json_value(&self) -> bool {
        !matches!(self, Self::Blob(_))
    }

    /// The name SQLite's `typeof()` returns for this value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }

    /// Equality that treats integers and reals with the same numeric value
    /// as equal.
    #[must_use]
    pub fn loosely_equals(&self, other: &Self) -> bool {
        match (self, other) {
            #[allow(clippy::cast_precision_loss)]
            (Self::Integer(a), Self::Real(b)) | (Self::Real(b), Self::Integer(a)) => {
                (*a as f64) == *b
            }
            _ => self == other,
        }
    }

    /// Converts the value to JSON. Returns `None` for blobs.
    ///
    /// Non-finite reals have no JSON representation and become `null`.
    #[must_use]
    pub fn to_json(&self) -> Option<JsonValue> {
        match self {
            Self::Null => Some(JsonValue::Null),
            Self::Integer(n) => Some(JsonValue::from(*n)),
            Self::Real(f) => Some(
                serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            ),
            Self::Text(s) => Some(JsonValue::String(s.clone())),
            Self::Blob(_) => None,
        }
    }

    /// Text rendering used by `||` and `CAST(.. AS TEXT)`.
    ///
    /// Returns `None` for NULL.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(n) => Some(n.to_string()),
            Self::Real(f) => Some(format_real(*f)),
            Self::Text(s) => Some(s.clone()),
            Self::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// Numeric value used by arithmetic.
    ///
    /// Text and blobs are converted using their longest numeric prefix, so
    /// `'12abc'` is `12` and `'abc'` is `0`. Returns `None` for NULL.
    #[must_use]
    pub fn to_numeric(&self) -> Option<Self> {
        match self {
            Self::Null => None,
            Self::Integer(_) | Self::Real(_) => Some(self.clone()),
            Self::Text(s) => Some(parse_numeric_prefix(s)),
            Self::Blob(b) => Some(parse_numeric_prefix(&String::from_utf8_lossy(b))),
        }
    }
}

impl fmt::Display for SqliteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(r) => write!(f, "{}", format_real(*r)),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Blob(b) => {
                write!(f, "X'")?;
                for byte in b {
                    write!(f, "{byte:02X}")?;
                }
                write!(f, "'")
            }
        }
    }
}

impl Serialize for SqliteValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Real(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Blob(b) => serializer.serialize_bytes(b),
        }
    }
}

impl From<bool> for SqliteValue {
    fn from(value: bool) -> Self {
        Self::Integer(if value { SQLITE_TRUE } else { SQLITE_FALSE })
    }
}

impl From<i64> for SqliteValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqliteValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for SqliteValue {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<String> for SqliteValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for SqliteValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for SqliteValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<&JsonValue> for SqliteValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::from(*b),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Real))
                .unwrap_or(Self::Null),
            JsonValue::String(s) => Self::Text(s.clone()),
            // Nested structures are kept as their JSON text.
            JsonValue::Array(_) | JsonValue::Object(_) => Self::Text(value.to_string()),
        }
    }
}

impl From<JsonValue> for SqliteValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::String(s) => Self::Text(s),
            other => Self::from(&other),
        }
    }
}

/// Coerces a value to a SQL boolean, returning [`SQLITE_TRUE`] or
/// [`SQLITE_FALSE`].
///
/// NULL is false, numbers are false iff zero, text is true iff its integer
/// prefix is non-zero, and blobs are false.
#[must_use]
pub fn sqlite_bool(value: &SqliteValue) -> i64 {
    let truthy = match value {
        SqliteValue::Null | SqliteValue::Blob(_) => false,
        SqliteValue::Integer(n) => *n != 0,
        SqliteValue::Real(f) => !f.is_nan() && *f != 0.0,
        SqliteValue::Text(s) => integer_prefix_is_nonzero(s),
    };
    if truthy {
        SQLITE_TRUE
    } else {
        SQLITE_FALSE
    }
}

/// Logical negation of [`sqlite_bool`].
#[must_use]
pub fn sqlite_not(value: &SqliteValue) -> i64 {
    SQLITE_TRUE - sqlite_bool(value)
}

/// Returns true if `value` coerces to SQL `true`.
#[must_use]
pub fn is_truthy(value: &SqliteValue) -> bool {
    sqlite_bool(value) == SQLITE_TRUE
}

/// Integer-prefix parse of `s`: optional leading whitespace and sign, then
/// either `0x` and hex digits or decimal digits. A string with no digits
/// parses as nothing and is false.
fn integer_prefix_is_nonzero(s: &str) -> bool {
    let s = s.trim_start();
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);

    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"));
    match hex {
        Some(digits) => digits
            .chars()
            .take_while(char::is_ascii_hexdigit)
            .any(|c| c != '0'),
        None => s
            .chars()
            .take_while(char::is_ascii_digit)
            .any(|c| c != '0'),
    }
}

/// Parses the longest numeric prefix of `s`, as SQLite does when text is
/// used in arithmetic.
fn parse_numeric_prefix(s: &str) -> SqliteValue {
    let trimmed = s.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    let mut is_real = false;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let fraction_start = end + 1;
        let mut fraction_end = fraction_start;
        while fraction_end < bytes.len() && bytes[fraction_end].is_ascii_digit() {
            fraction_end += 1;
        }
        if has_digits || fraction_end > fraction_start {
            is_real = true;
            has_digits = true;
            end = fraction_end;
        }
    }

    if has_digits && end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            is_real = true;
            end = exp_end;
        }
    }

    if !has_digits {
        return SqliteValue::Integer(0);
    }

    let prefix = &trimmed[..end];
    if !is_real {
        if let Ok(n) = prefix.parse::<i64>() {
            return SqliteValue::Integer(n);
        }
    }
    prefix
        .parse::<f64>()
        .map_or(SqliteValue::Integer(0), SqliteValue::Real)
}

/// Formats a real the way SQLite renders it as text: whole numbers keep a
/// trailing `.0`.
fn format_real(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// One row: column name to value.
pub type SqliteRow = BTreeMap<String, SqliteValue>;

/// Builds a row from JSON object fields.
#[must_use]
pub fn row_from_json(object: &serde_json::Map<String, JsonValue>) -> SqliteRow {
    object
        .iter()
        .map(|(key, value)| (key.clone(), SqliteValue::from(value)))
        .collect()
}

static NULL: SqliteValue = SqliteValue::Null;

/// The evaluation context of a compiled clause: rows keyed by the table
/// name expressions refer to them by.
///
/// Missing tables and columns read as NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParameters {
    tables: BTreeMap<String, SqliteRow>,
}

impl QueryParameters {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a table's row.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>, row: SqliteRow) -> Self {
        self.insert(table, row);
        self
    }

    /// Adds (or replaces) a table's row.
    pub fn insert(&mut self, table: impl Into<String>, row: SqliteRow) {
        self.tables.insert(table.into(), row);
    }

    /// Returns the row for `table`, if present.
    #[must_use]
    pub fn row(&self, table: &str) -> Option<&SqliteRow> {
        self.tables.get(table)
    }

    /// Reads `table.column`.
    #[must_use]
    pub fn get(&self, table: &str, column: &str) -> &SqliteValue {
        self.tables
            .get(table)
            .and_then(|row| row.get(column))
            .unwrap_or(&NULL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> SqliteValue {
        SqliteValue::from(s)
    }

    #[test]
    fn test_sqlite_bool_scalars() {
        assert_eq!(sqlite_bool(&SqliteValue::Null), SQLITE_FALSE);
        assert_eq!(sqlite_bool(&SqliteValue::Integer(0)), SQLITE_FALSE);
        assert_eq!(sqlite_bool(&SqliteValue::Integer(-4)), SQLITE_TRUE);
        assert_eq!(sqlite_bool(&SqliteValue::Real(0.0)), SQLITE_FALSE);
        assert_eq!(sqlite_bool(&SqliteValue::Real(f64::NAN)), SQLITE_FALSE);
        assert_eq!(sqlite_bool(&SqliteValue::Real(0.5)), SQLITE_TRUE);
        assert_eq!(sqlite_bool(&SqliteValue::from(true)), SQLITE_TRUE);
        assert_eq!(sqlite_bool(&SqliteValue::Blob(vec![1])), SQLITE_FALSE);
    }

    #[test]
    fn test_sqlite_bool_text() {
        assert_eq!(sqlite_bool(&text("0")), SQLITE_FALSE);
        assert_eq!(sqlite_bool(&text("abc")), SQLITE_FALSE);
        assert_eq!(sqlite_bool(&text("3")), SQLITE_TRUE);
        assert_eq!(sqlite_bool(&text("  -12px")), SQLITE_TRUE);
        assert_eq!(sqlite_bool(&text("0.9")), SQLITE_FALSE);
        assert_eq!(sqlite_bool(&text("0x1f")), SQLITE_TRUE);
        assert_eq!(sqlite_bool(&text("0x")), SQLITE_FALSE);
        assert_eq!(sqlite_bool(&text("")), SQLITE_FALSE);
        assert_eq!(sqlite_bool(&text("99999999999999999999999")), SQLITE_TRUE);
    }

    #[test]
    fn test_sqlite_not() {
        assert_eq!(sqlite_not(&SqliteValue::Null), SQLITE_TRUE);
        assert_eq!(sqlite_not(&text("3")), SQLITE_FALSE);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(SqliteValue::from(json!(null)), SqliteValue::Null);
        assert_eq!(SqliteValue::from(json!(true)), SqliteValue::Integer(1));
        assert_eq!(SqliteValue::from(json!(12)), SqliteValue::Integer(12));
        assert_eq!(SqliteValue::from(json!(1.5)), SqliteValue::Real(1.5));
        assert_eq!(SqliteValue::from(json!("u1")), text("u1"));
        assert_eq!(SqliteValue::from(json!(["a", 1])), text(r#"["a",1]"#));
    }

    #[test]
    fn test_loose_equality() {
        assert!(SqliteValue::Integer(1).loosely_equals(&SqliteValue::Real(1.0)));
        assert!(!SqliteValue::Integer(1).loosely_equals(&text("1")));
        assert!(text("a").loosely_equals(&text("a")));
    }

    #[test]
    fn test_numeric_prefix() {
        assert_eq!(text("12abc").to_numeric(), Some(SqliteValue::Integer(12)));
        assert_eq!(text(" 1.5e2x").to_numeric(), Some(SqliteValue::Real(150.0)));
        assert_eq!(text("abc").to_numeric(), Some(SqliteValue::Integer(0)));
        assert_eq!(text(".5").to_numeric(), Some(SqliteValue::Real(0.5)));
        assert_eq!(SqliteValue::Null.to_numeric(), None);
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(SqliteValue::Real(2.0).to_text().as_deref(), Some("2.0"));
        assert_eq!(SqliteValue::Real(0.25).to_text().as_deref(), Some("0.25"));
        assert_eq!(SqliteValue::Integer(-3).to_text().as_deref(), Some("-3"));
        assert_eq!(SqliteValue::Null.to_text(), None);
    }

    #[test]
    fn test_query_parameters_missing_reads_null() {
        let mut row = SqliteRow::new();
        row.insert(String::from("user_id"), text("u1"));
        let params = QueryParameters::new().with_table("token_parameters", row);
        assert_eq!(params.get("token_parameters", "user_id"), &text("u1"));
        assert!(params.get("token_parameters", "other").is_null());
        assert!(params.get("user_parameters", "user_id").is_null());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(SqliteValue::Real(f64::INFINITY).to_json(), Some(json!(null)));
        assert_eq!(SqliteValue::Blob(vec![0]).to_json(), None);
        assert_eq!(text("x").to_json(), Some(json!("x")));
    }
}
