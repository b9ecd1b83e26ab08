//! AND / OR semantics of compiled WHERE clauses.

mod common;
use common::*;

use oxide_sync_rules::{
    and_filters, CombineError, CompiledClause, FilterParameters, ParameterMatchClause,
    QueryParameters, SqliteValue, StaticRowValueClause,
};
use serde_json::json;

fn where_filter(sql: &str) -> Result<ParameterMatchClause, CombineError> {
    let statement = parse_select(sql);
    let compiled = tools(sql).compile_where_clause(statement.where_clause.as_ref())?;
    assert!(compiled.errors.is_empty(), "{:?}", compiled.errors);
    Ok(compiled.value)
}

fn evaluate(filter: &ParameterMatchClause, token: serde_json::Value) -> Vec<FilterParameters> {
    filter
        .filter(&token_parameters(token).to_query_parameters())
        .unwrap()
}

fn assignment(pairs: &[(&str, SqliteValue)]) -> FilterParameters {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

#[test]
fn parameter_equality_binds_one_value() {
    let filter = where_filter("SELECT 1 WHERE bucket.user_id = token_parameters.user_id").unwrap();
    assert_eq!(filter.bucket_parameters(), ["bucket.user_id"]);
    assert!(!filter.is_unbounded());
    assert_eq!(
        evaluate(&filter, json!({"user_id": "u1"})),
        [assignment(&[("bucket.user_id", "u1".into())])]
    );
}

#[test]
fn equality_with_null_matches_nothing() {
    let filter = where_filter("SELECT 1 WHERE bucket.user_id = token_parameters.user_id").unwrap();
    assert!(evaluate(&filter, json!({})).is_empty());
}

#[test]
fn in_array_is_unbounded() {
    let filter = where_filter("SELECT 1 WHERE bucket.org IN token_parameters.orgs").unwrap();
    assert!(filter.is_unbounded());
    assert_eq!(
        evaluate(&filter, json!({"orgs": ["a", 2, null]})),
        [
            assignment(&[("bucket.org", "a".into())]),
            assignment(&[("bucket.org", SqliteValue::Integer(2))]),
        ]
    );
}

#[test]
fn and_is_cartesian_product() {
    let filter = where_filter(
        "SELECT 1 WHERE bucket.user_id = token_parameters.user_id \
         AND bucket.org IN token_parameters.orgs",
    )
    .unwrap();
    assert!(filter.is_unbounded());
    assert_eq!(
        filter.bucket_parameters(),
        ["bucket.user_id", "bucket.org"]
    );
    let results = evaluate(&filter, json!({"user_id": "u1", "orgs": ["a", "b"]}));
    assert_eq!(
        results,
        [
            assignment(&[("bucket.user_id", "u1".into()), ("bucket.org", "a".into())]),
            assignment(&[("bucket.user_id", "u1".into()), ("bucket.org", "b".into())]),
        ]
    );
}

#[test]
fn and_with_static_condition() {
    let filter = where_filter(
        "SELECT 1 WHERE bucket.user_id = token_parameters.user_id AND token_parameters.is_admin",
    )
    .unwrap();
    assert_eq!(
        evaluate(&filter, json!({"user_id": "u1", "is_admin": true})).len(),
        1
    );
    assert!(evaluate(&filter, json!({"user_id": "u1", "is_admin": false})).is_empty());
}

#[test]
fn and_drops_conflicting_assignments() {
    let filter = where_filter("SELECT 1 WHERE bucket.a = 1 AND bucket.a = 2").unwrap();
    assert!(evaluate(&filter, json!({})).is_empty());

    let filter = where_filter("SELECT 1 WHERE bucket.a = 1 AND bucket.a = 1").unwrap();
    assert_eq!(filter.bucket_parameters(), ["bucket.a"]);
    assert_eq!(
        evaluate(&filter, json!({})),
        [assignment(&[("bucket.a", SqliteValue::Integer(1))])]
    );
}

#[test]
fn and_of_two_unbounded_clauses_is_rejected() {
    let result = where_filter(
        "SELECT 1 WHERE bucket.a IN token_parameters.a AND bucket.b IN token_parameters.b",
    );
    assert_eq!(result.unwrap_err(), CombineError::MultipleUnbounded);
}

#[test]
fn or_is_union() {
    let filter = where_filter(
        "SELECT 1 WHERE bucket.owner = token_parameters.user_id \
         OR bucket.owner = token_parameters.delegate",
    )
    .unwrap();
    assert_eq!(
        evaluate(&filter, json!({"user_id": "u1", "delegate": "u2"})),
        [
            assignment(&[("bucket.owner", "u1".into())]),
            assignment(&[("bucket.owner", "u2".into())]),
        ]
    );
}

#[test]
fn or_requires_same_parameters() {
    let err = where_filter("SELECT 1 WHERE bucket.a = 1 OR bucket.b = 2").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Left and right sides of OR must use the same parameters, or split into separate \
         queries. [\"bucket.a\"] != [\"bucket.b\"]"
    );
}

#[test]
fn static_or_stays_static() {
    let filter =
        where_filter("SELECT 1 WHERE token_parameters.is_admin OR token_parameters.is_owner")
            .unwrap();
    assert!(filter.bucket_parameters().is_empty());
    assert_eq!(evaluate(&filter, json!({"is_owner": 1})), [FilterParameters::new()]);
    assert!(evaluate(&filter, json!({"is_admin": 0})).is_empty());
}

#[test]
fn missing_where_clause_matches_once() {
    let filter = tools("SELECT 1").compile_where_clause(None).unwrap().value;
    assert_eq!(
        filter.filter(&QueryParameters::new()).unwrap(),
        [FilterParameters::new()]
    );
}

#[test]
fn not_in_with_bucket_parameter_is_reported() {
    let sql = "SELECT 1 WHERE bucket.a NOT IN token_parameters.list";
    let statement = parse_select(sql);
    let compiled = tools(sql)
        .compile_where_clause(statement.where_clause.as_ref())
        .unwrap();
    assert_eq!(
        messages(&compiled.errors),
        ["Cannot use NOT IN with bucket parameters"]
    );
    assert!(compiled.value.is_error());
}

/// A bounded clause yielding one fixed assignment.
fn fixed(pairs: &[(&str, i64)]) -> CompiledClause {
    let names: Vec<String> = pairs.iter().map(|(k, _)| (*k).to_string()).collect();
    let result: FilterParameters = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), SqliteValue::Integer(*v)))
        .collect();
    ParameterMatchClause::new(names, false, move |_| Ok(vec![result.clone()])).into()
}

fn and(a: CompiledClause, b: CompiledClause) -> CompiledClause {
    and_filters(a, b).unwrap()
}

/// Assignments of a clause, as a sorted multiset.
fn assignments(clause: CompiledClause) -> Vec<String> {
    let CompiledClause::ParameterMatch(clause) = clause else {
        panic!("Expected a match clause");
    };
    let mut results: Vec<String> = clause
        .filter(&QueryParameters::new())
        .unwrap()
        .iter()
        .map(|assignment| format!("{assignment:?}"))
        .collect();
    results.sort_unstable();
    results
}

#[test]
fn and_is_commutative_and_associative() {
    let cases = [
        // Disjoint parameters.
        (fixed(&[("p", 1)]), fixed(&[("q", 2)]), fixed(&[("r", 3)])),
        // A shared parameter that agrees.
        (fixed(&[("p", 1)]), fixed(&[("p", 1), ("q", 2)]), fixed(&[("q", 2)])),
        // A shared parameter that conflicts.
        (fixed(&[("p", 1)]), fixed(&[("q", 2)]), fixed(&[("p", 3)])),
    ];
    for (a, b, c) in cases {
        assert_eq!(
            assignments(and(a.clone(), b.clone())),
            assignments(and(b.clone(), a.clone()))
        );
        assert_eq!(
            assignments(and(and(a.clone(), b.clone()), c.clone())),
            assignments(and(a.clone(), and(b.clone(), c.clone())))
        );
        assert_eq!(
            assignments(and(and(a.clone(), c.clone()), b.clone())),
            assignments(and(c, and(b, a)))
        );
    }
}

#[test]
fn and_with_static_true_is_identity() {
    let truthy: CompiledClause =
        StaticRowValueClause::constant(SqliteValue::Integer(1)).into();
    let clause = fixed(&[("p", 1), ("q", 2)]);
    assert_eq!(
        assignments(and(truthy.clone(), clause.clone())),
        assignments(clause.clone())
    );
    assert_eq!(assignments(and(clause.clone(), truthy)), assignments(clause));
}

#[test]
fn conflicting_and_yields_nothing_in_any_order() {
    let (a, b) = (fixed(&[("p", 1)]), fixed(&[("p", 2)]));
    assert!(assignments(and(a.clone(), b.clone())).is_empty());
    assert!(assignments(and(b, a)).is_empty());
}
