//! Bucket id encoding.
//!
//! A bucket id is the descriptor name followed by a JSON array of the
//! bucket parameter values, in declaration order:
//!
//! ```text
//! global["u1"]
//! by_org[4,"admin"]
//! ```
//!
//! Numbers are written the way JavaScript's `JSON.stringify` writes them,
//! so ids agree with other implementations of the same rules.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::{Result, SyncRulesError};
use crate::value::SqliteValue;

/// Version of the bucket id format produced by [`get_bucket_id`].
pub const BUCKET_ID_ENCODING_VERSION: u32 = 1;

/// Encodes a bucket id.
///
/// `values` is keyed by the names in `bucket_parameters`; a missing name
/// encodes as `null`.
///
/// # Errors
///
/// Returns [`SyncRulesError::UnencodableValue`] if a value is a blob.
pub fn get_bucket_id<S: AsRef<str>>(
    descriptor: &str,
    bucket_parameters: &[S],
    values: &BTreeMap<String, SqliteValue>,
) -> Result<String> {
    let mut id = String::with_capacity(descriptor.len() + 2 + bucket_parameters.len() * 8);
    id.push_str(descriptor);
    id.push('[');
    for (i, name) in bucket_parameters.iter().enumerate() {
        let name = name.as_ref();
        if i > 0 {
            id.push(',');
        }
        match values.get(name).unwrap_or(&SqliteValue::Null) {
            SqliteValue::Null => id.push_str("null"),
            SqliteValue::Integer(n) => {
                let _ = write!(id, "{n}");
            }
            SqliteValue::Real(f) => id.push_str(&format_number(*f)),
            SqliteValue::Text(s) => id.push_str(&quote(s)),
            SqliteValue::Blob(_) => return Err(SyncRulesError::UnencodableValue(name.to_string())),
        }
    }
    id.push(']');
    Ok(id)
}

fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Formats a float as JavaScript's `Number.prototype.toString` does.
fn format_number(value: f64) -> String {
    if !value.is_finite() {
        // JSON has no representation for these.
        return String::from("null");
    }
    if value == 0.0 {
        return String::from("0");
    }

    let abs = value.abs();
    if (1e-6..1e21).contains(&abs) {
        // Rust's shortest round-trip output matches JavaScript in this range.
        return format!("{value}");
    }

    // Exponent form: `{mantissa}e{sign}{exponent}`.
    let formatted = format!("{value:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if exponent.starts_with('-') => {
            format!("{mantissa}e{exponent}")
        }
        Some((mantissa, exponent)) => format!("{mantissa}e+{exponent}"),
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, SqliteValue)]) -> BTreeMap<String, SqliteValue> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_single_text_parameter() {
        let id = get_bucket_id("global", &["user_id"], &values(&[("user_id", "u1".into())]));
        assert_eq!(id.unwrap(), r#"global["u1"]"#);
    }

    #[test]
    fn test_parameter_order_is_declaration_order() {
        let vals = values(&[("a", SqliteValue::Integer(1)), ("b", "x".into())]);
        assert_eq!(get_bucket_id("q", &["b", "a"], &vals).unwrap(), r#"q["x",1]"#);
    }

    #[test]
    fn test_no_parameters() {
        let id = get_bucket_id::<&str>("global", &[], &BTreeMap::new()).unwrap();
        assert_eq!(id, "global[]");
    }

    #[test]
    fn test_missing_and_null_values() {
        let vals = values(&[("a", SqliteValue::Null)]);
        assert_eq!(get_bucket_id("q", &["a", "b"], &vals).unwrap(), "q[null,null]");
    }

    #[test]
    fn test_text_is_json_escaped() {
        let vals = values(&[("a", "say \"hi\"\n".into())]);
        assert_eq!(
            get_bucket_id("q", &["a"], &vals).unwrap(),
            r#"q["say \"hi\"\n"]"#
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.000_001), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.5e-9), "1.5e-9");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(123_456_789_012.0), "123456789012");
        assert_eq!(format_number(f64::NAN), "null");
    }

    #[test]
    fn test_blob_cannot_be_encoded() {
        let vals = values(&[("a", SqliteValue::Blob(vec![1, 2]))]);
        assert!(matches!(
            get_bucket_id("q", &["a"], &vals),
            Err(SyncRulesError::UnencodableValue(name)) if name == "a"
        ));
    }
}
