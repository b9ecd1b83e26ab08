//! Session parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::tools::{TOKEN_PARAMETERS_TABLE, USER_PARAMETERS_TABLE};
use crate::value::{row_from_json, QueryParameters};

/// Parameters of one client session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncParameters {
    /// Parameters taken from the session token.
    #[serde(default)]
    pub token_parameters: Map<String, JsonValue>,
    /// Parameters supplied by the client.
    #[serde(default)]
    pub user_parameters: Map<String, JsonValue>,
}

impl SyncParameters {
    #[must_use]
    pub const fn new(
        token_parameters: Map<String, JsonValue>,
        user_parameters: Map<String, JsonValue>,
    ) -> Self {
        Self {
            token_parameters,
            user_parameters,
        }
    }

    /// The evaluation context: one row per parameter table.
    #[must_use]
    pub fn to_query_parameters(&self) -> QueryParameters {
        QueryParameters::new()
            .with_table(TOKEN_PARAMETERS_TABLE, row_from_json(&self.token_parameters))
            .with_table(USER_PARAMETERS_TABLE, row_from_json(&self.user_parameters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqliteValue;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_missing_user_parameters() {
        let parameters: SyncParameters =
            serde_json::from_value(json!({"token_parameters": {"user_id": "u1"}})).unwrap();
        assert!(parameters.user_parameters.is_empty());

        let query = parameters.to_query_parameters();
        assert_eq!(
            query.get("token_parameters", "user_id"),
            &SqliteValue::from("u1")
        );
        assert!(query.get("user_parameters", "user_id").is_null());
    }

    #[test]
    fn test_booleans_become_integers() {
        let parameters: SyncParameters =
            serde_json::from_value(json!({"token_parameters": {"is_admin": true}})).unwrap();
        assert_eq!(
            parameters
                .to_query_parameters()
                .get("token_parameters", "is_admin"),
            &SqliteValue::Integer(1)
        );
    }
}
