//! End-to-end tests for static bucket parameter queries.

mod common;
use common::*;

use oxide_sync_rules::{StaticSqlParameterQuery, SyncRulesError};
use serde_json::json;

const ADMIN_QUERY: &str =
    "SELECT token_parameters.user_id as user_id WHERE token_parameters.is_admin";

#[test]
fn admin_gets_global_bucket() {
    let query = static_query("global", ADMIN_QUERY);
    assert!(query.errors().is_empty(), "{:?}", query.errors());
    assert_eq!(query.bucket_parameters(), ["user_id"]);

    let ids = query
        .get_static_bucket_ids(&token_parameters(json!({"user_id": "u1", "is_admin": true})))
        .unwrap();
    assert_eq!(ids, vec![String::from(r#"global["u1"]"#)]);
}

#[test]
fn non_admin_gets_nothing() {
    let query = static_query("global", ADMIN_QUERY);
    let ids = query
        .get_static_bucket_ids(&token_parameters(json!({"user_id": "u1", "is_admin": false})))
        .unwrap();
    assert!(ids.is_empty());

    let ids = query
        .get_static_bucket_ids(&token_parameters(json!({"user_id": "u1"})))
        .unwrap();
    assert!(ids.is_empty());
}

#[test]
fn textual_truthiness() {
    let query = static_query("global", ADMIN_QUERY);
    let with_flag = |flag: serde_json::Value| {
        query
            .get_static_bucket_ids(&token_parameters(json!({"user_id": "u1", "is_admin": flag})))
            .unwrap()
            .len()
    };
    assert_eq!(with_flag(json!("1")), 1);
    assert_eq!(with_flag(json!(" 12abc")), 1);
    assert_eq!(with_flag(json!("0")), 0);
    assert_eq!(with_flag(json!("yes")), 0);
    assert_eq!(with_flag(json!(0.5)), 1);
}

#[test]
fn limit_is_reported_but_query_is_usable() {
    let sql = "SELECT token_parameters.user_id AS user_id LIMIT 10";
    let query = static_query("global", sql);
    assert_eq!(messages(query.errors()), ["LIMIT is not supported"]);
    assert_eq!(query.errors()[0].snippet(), Some("10"));

    let ids = query
        .get_static_bucket_ids(&token_parameters(json!({"user_id": "u1"})))
        .unwrap();
    assert_eq!(ids, vec![String::from(r#"global["u1"]"#)]);
}

#[test]
fn every_unsupported_clause_is_reported() {
    let query = static_query(
        "q",
        "SELECT DISTINCT token_parameters.a AS a GROUP BY token_parameters.a \
         ORDER BY token_parameters.a LIMIT 1 OFFSET 2",
    );
    let mut found = messages(query.errors());
    found.sort_unstable();
    assert_eq!(
        found,
        [
            "DISTINCT is not supported",
            "GROUP BY is not supported",
            "LIMIT is not supported",
            "OFFSET is not supported",
            "ORDER BY is not supported",
        ]
    );
}

#[test]
fn from_is_reported() {
    let query = static_query("q", "SELECT users.id AS id FROM users");
    let found = messages(query.errors());
    assert!(found.contains(&"FROM is not supported in static parameter queries"));
}

#[test]
fn user_parameters_are_available() {
    let query = static_query(
        "by_project",
        "SELECT user_parameters.project AS project WHERE token_parameters.user_id IS NOT NULL",
    );
    let mut parameters = token_parameters(json!({"user_id": "u1"}));
    parameters
        .user_parameters
        .insert(String::from("project"), json!(7));
    assert_eq!(
        query.get_static_bucket_ids(&parameters).unwrap(),
        vec![String::from("by_project[7]")]
    );
}

#[test]
fn several_parameters_keep_select_order() {
    let query = static_query(
        "by_org_role",
        "SELECT token_parameters.org AS org, upper(token_parameters.role) AS role",
    );
    let ids = query
        .get_static_bucket_ids(&token_parameters(json!({"org": 4, "role": "admin"})))
        .unwrap();
    assert_eq!(ids, vec![String::from(r#"by_org_role[4,"ADMIN"]"#)]);
}

#[test]
fn bucket_parameters_are_not_in_scope() {
    let query = static_query("q", "SELECT bucket.user_id AS user_id");
    assert_eq!(messages(query.errors()), ["Undefined table bucket"]);
    assert!(query.static_extractors().is_empty());
    // A parameter without a value extractor yields no buckets.
    assert!(query
        .get_static_bucket_ids(&token_parameters(json!({})))
        .unwrap()
        .is_empty());
}

#[test]
fn bucket_filter_does_not_match_every_session() {
    let query = static_query(
        "global",
        "SELECT token_parameters.user_id AS user_id WHERE bucket.anything",
    );
    assert_eq!(messages(query.errors()), ["Undefined table bucket"]);
    assert!(matches!(
        query.get_static_bucket_ids(&token_parameters(json!({"user_id": "u1"}))),
        Err(SyncRulesError::InvalidClause)
    ));
}

#[test]
fn unnamed_column_keeps_its_parameter_slot() {
    let query = static_query("g", "SELECT token_parameters.a + 1, token_parameters.b AS b");
    assert_eq!(messages(query.errors()), ["alias is required"]);
    assert_eq!(query.bucket_parameters(), ["token_parameters.a + 1", "b"]);
    let ids = query
        .get_static_bucket_ids(&token_parameters(json!({"a": 1, "b": "x"})))
        .unwrap();
    assert!(ids.is_empty());
}

#[test]
fn unknown_functions_and_tables_are_reported() {
    let query = static_query(
        "q",
        "SELECT nope(token_parameters.a) AS a, other.b AS b, c AS c",
    );
    assert_eq!(
        messages(query.errors()),
        [
            "Function 'nope' is not defined",
            "Undefined table other",
            "Column 'c' must be qualified with a table name",
        ]
    );
    assert_eq!(query.bucket_parameters(), ["a", "b", "c"]);
}

#[test]
fn parse_errors_fail_compilation() {
    let err = StaticSqlParameterQuery::from_sql("q", "SELECT FROM").unwrap_err();
    assert!(matches!(err, SyncRulesError::Parse(_)));
}

#[test]
fn errors_carry_locations() {
    let sql = "SELECT token_parameters.a AS a\nLIMIT 10";
    let query = static_query("q", sql);
    assert_eq!(query.errors()[0].line_column(), Some((2, 7)));
}
