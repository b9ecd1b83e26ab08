#![allow(dead_code)]

use oxide_sync_rules::ast::SelectStatement;
use oxide_sync_rules::{
    ParseError, Parser, SqlTools, SqlToolsOptions, StaticSqlParameterQuery, SyncParameters,
};
use serde_json::Value;

pub fn parse_select(sql: &str) -> SelectStatement {
    Parser::new(sql)
        .parse_select()
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_err(sql: &str) -> ParseError {
    Parser::new(sql)
        .parse_select()
        .expect_err(&format!("Expected parse error for: {sql}"))
}

/// Compiles a static parameter query, failing on parse or combine errors.
pub fn static_query(descriptor: &str, sql: &str) -> StaticSqlParameterQuery {
    StaticSqlParameterQuery::from_sql(descriptor, sql)
        .unwrap_or_else(|e| panic!("Failed to compile: {sql}\nError: {e:?}"))
}

/// Compiler for parameter-only expressions.
pub fn tools(sql: &str) -> SqlTools {
    SqlTools::new(SqlToolsOptions::new(sql))
}

pub fn token_parameters(token: Value) -> SyncParameters {
    SyncParameters {
        token_parameters: token.as_object().cloned().unwrap_or_default(),
        ..SyncParameters::default()
    }
}

/// Error messages, in order.
pub fn messages(errors: &[oxide_sync_rules::SqlRuleError]) -> Vec<&str> {
    errors.iter().map(|e| e.message.as_str()).collect()
}
