//! # oxide-sync-rules
//!
//! Compiles sync rule queries into clauses that decide which buckets a row
//! or a client session belongs to.
//!
//! This crate provides:
//! - A hand-written lexer and Pratt parser for the `SELECT` statements
//!   rules are written in
//! - SQLite-typed values and operator evaluation
//! - An AND / OR algebra over bucket parameter matches
//! - Static parameter queries, resolved from session parameters alone
//! - Data queries, resolving the buckets of a replicated row
//!
//! ## Static parameter queries
//!
//! ```rust
//! use oxide_sync_rules::{StaticSqlParameterQuery, SyncParameters};
//! use serde_json::json;
//!
//! let query = StaticSqlParameterQuery::from_sql(
//!     "global",
//!     "SELECT token_parameters.user_id AS user_id WHERE token_parameters.is_admin",
//! )
//! .unwrap();
//! assert!(query.errors().is_empty());
//!
//! let admin: SyncParameters = serde_json::from_value(json!({
//!     "token_parameters": { "user_id": "u1", "is_admin": true }
//! }))
//! .unwrap();
//! assert_eq!(query.get_static_bucket_ids(&admin).unwrap(), vec![r#"global["u1"]"#]);
//! ```
//!
//! ## Diagnostics
//!
//! Unsupported constructs do not stop compilation; they are collected so
//! every problem in a rule can be reported at once:
//!
//! ```rust
//! use oxide_sync_rules::StaticSqlParameterQuery;
//!
//! let query = StaticSqlParameterQuery::from_sql(
//!     "global",
//!     "SELECT token_parameters.user_id AS user_id LIMIT 10",
//! )
//! .unwrap();
//! assert_eq!(query.errors()[0].message, "LIMIT is not supported");
//! ```

pub mod ast;
pub mod bucket_id;
pub mod clause;
pub mod compiled;
pub mod data_query;
pub mod error;
pub mod filters;
pub mod functions;
pub mod lexer;
pub mod parameters;
pub mod parser;
pub mod schema;
pub mod static_query;
pub mod tools;
pub mod value;

pub use bucket_id::get_bucket_id;
pub use clause::{
    ClauseError, CompiledClause, FilterParameters, ParameterMatchClause, ParameterValueClause,
    StaticRowValueClause,
};
pub use compiled::Compiled;
pub use data_query::{EvaluatedRow, SqlDataQuery};
pub use error::{CombineError, Result, SqlRuleError, SyncRulesError};
pub use filters::{and_filters, or_filters, to_boolean_parameter_set_clause};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parameters::SyncParameters;
pub use parser::{parse_select, ParseError, Parser};
pub use schema::{ExpressionType, QuerySchema, SourceSchema};
pub use static_query::StaticSqlParameterQuery;
pub use tools::{SqlTools, SqlToolsOptions};
pub use value::{sqlite_bool, sqlite_not, QueryParameters, SqliteRow, SqliteValue};
