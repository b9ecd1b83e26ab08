//! Tests for SELECT clauses: FROM, WHERE, GROUP BY, HAVING, ORDER BY,
//! LIMIT, OFFSET, DISTINCT and FOR.

mod common;
use common::*;

use oxide_sync_rules::ast::{BinaryOp, ExprKind, LockStrength, OrderDirection};

#[test]
fn select_without_from() {
    let s = parse_select("SELECT token_parameters.user_id AS user_id");
    assert!(s.from.is_none());
    assert!(s.where_clause.is_none());
    assert_eq!(s.columns.len(), 1);
}

#[test]
fn from_with_alias() {
    let s = parse_select("SELECT l.id FROM lists AS l");
    let from = s.from.unwrap();
    assert_eq!(from.name, "lists");
    assert_eq!(from.alias.as_deref(), Some("l"));
    assert_eq!(from.effective_name(), "l");

    let s = parse_select("SELECT l.id FROM public.lists l");
    let from = s.from.unwrap();
    assert_eq!(from.schema.as_deref(), Some("public"));
    assert_eq!(from.alias.as_deref(), Some("l"));
}

#[test]
fn where_compound_and_or() {
    let s = parse_select(
        "SELECT 1 WHERE (token_parameters.a > 18 AND token_parameters.b = 1) OR token_parameters.c",
    );
    assert!(matches!(
        s.where_clause.unwrap().kind,
        ExprKind::Binary {
            op: BinaryOp::Or,
            ..
        }
    ));
}

#[test]
fn unsupported_clauses_are_parsed_with_locations() {
    let sql = "SELECT DISTINCT a.id FROM a GROUP BY a.id HAVING a.id > 1 \
               ORDER BY a.id DESC LIMIT 10 OFFSET 5 FOR UPDATE";
    let s = parse_select(sql);

    assert_eq!(s.distinct.and_then(|span| span.slice(sql)), Some("DISTINCT"));
    assert_eq!(s.group_by.len(), 1);
    assert_eq!(s.having.unwrap().span.slice(sql), Some("a.id > 1"));
    assert_eq!(s.order_by[0].direction, OrderDirection::Desc);
    assert_eq!(s.limit.unwrap().span.slice(sql), Some("10"));
    assert_eq!(s.offset.unwrap().span.slice(sql), Some("5"));

    let locking = s.locking.unwrap();
    assert_eq!(locking.strength, LockStrength::Update);
    assert_eq!(locking.span.slice(sql), Some("FOR UPDATE"));
}

#[test]
fn order_by_nulls_ordering() {
    let s = parse_select("SELECT a.id FROM a ORDER BY a.id ASC NULLS LAST, a.name");
    assert_eq!(s.order_by.len(), 2);
    assert_eq!(s.order_by[1].direction, OrderDirection::Asc);
}

#[test]
fn for_share() {
    let s = parse_select("SELECT 1 FOR SHARE");
    assert_eq!(s.locking.unwrap().strength, LockStrength::Share);
}

#[test]
fn select_all_is_not_distinct() {
    let s = parse_select("SELECT ALL token_parameters.a AS a");
    assert!(s.distinct.is_none());
}

#[test]
fn column_aliases() {
    let s = parse_select("SELECT a.id AS id, a.name label, a.owner FROM a");
    let aliases: Vec<_> = s.columns.iter().map(|c| c.alias.as_deref()).collect();
    assert_eq!(aliases, [Some("id"), Some("label"), None]);
}

#[test]
fn wildcards() {
    let s = parse_select("SELECT *, a.* FROM a");
    assert!(matches!(s.columns[0].expr.kind, ExprKind::Wildcard { table: None }));
    assert!(matches!(
        &s.columns[1].expr.kind,
        ExprKind::Wildcard { table: Some(t) } if t == "a"
    ));
}
