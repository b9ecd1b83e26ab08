//! Loading rule SQL and session parameters from command-line input.

use std::path::Path;

use oxide_sync_rules::SyncParameters;
use tracing::debug;

use crate::error::{CliError, Result};

/// Returns the rule SQL from `--sql`, or else the contents of `--file`.
///
/// # Errors
///
/// Returns [`CliError::MissingQuery`] if neither is given, or
/// [`CliError::ReadFile`] if the file cannot be read.
pub fn load_sql(sql: Option<&str>, file: Option<&Path>) -> Result<String> {
    if let Some(sql) = sql {
        return Ok(sql.to_string());
    }
    let path = file.ok_or(CliError::MissingQuery)?;
    debug!(path = %path.display(), "Reading rule file");
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.trim().to_string())
}

/// Parses session parameters.
///
/// Accepts either `{"token_parameters": {...}, "user_parameters": {...}}`
/// or a bare object, which is taken as the token parameters.
///
/// # Errors
///
/// Returns [`CliError::InvalidParameters`] if `text` is not a JSON object.
pub fn parse_parameters(text: &str) -> Result<SyncParameters> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let is_wrapped = value.as_object().is_some_and(|object| {
        object.contains_key("token_parameters") || object.contains_key("user_parameters")
    });
    if is_wrapped {
        return Ok(serde_json::from_value(value)?);
    }
    let token_parameters = serde_json::from_value(value)?;
    Ok(SyncParameters::new(token_parameters, serde_json::Map::new()))
}
